use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::graph::Graph;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

pub(in crate::app) fn rank_nodes(graph: &Graph, query: &str, limit: usize) -> Vec<(usize, i64)> {
    let query = query.trim();
    if query.is_empty() || limit == 0 {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default();
    let mut ranked = graph
        .nodes()
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let by_label = fuzzy_match_score(&matcher, node.display_label(), query);
            let by_id = fuzzy_match_score(&matcher, &node.id, query);
            by_label.max(by_id).map(|score| (index, score))
        })
        .collect::<Vec<_>>();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}
