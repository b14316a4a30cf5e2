/// Minimum label or type score a node needs to count as a search hit.
pub(in crate::app) const HIGHLIGHT_THRESHOLD: f64 = 0.3;

const FUZZY_SCORE_CAP: f64 = 0.8;

/// Similarity of `text` to `query` in `[0, 1]`.
///
/// Exact matches score 1.0, substrings `0.9 * |query| / |text| + 0.1`, and
/// in-order fuzzy subsequences at most 0.8. Comparison ignores case and
/// lengths count characters.
pub(in crate::app) fn match_score(text: &str, query: &str) -> f64 {
    if text.is_empty() || query.is_empty() {
        return 0.0;
    }

    let text = text.to_lowercase();
    let query = query.to_lowercase();
    if text == query {
        return 1.0;
    }

    let text_len = text.chars().count() as f64;
    let query_len = query.chars().count() as f64;
    if text.contains(&query) {
        return 0.9 * (query_len / text_len) + 0.1;
    }

    let query_chars = query.chars().collect::<Vec<_>>();
    let mut matched = 0usize;
    let mut run = 0usize;
    let mut longest_run = 0usize;
    for character in text.chars() {
        if matched == query_chars.len() {
            break;
        }
        if character == query_chars[matched] {
            matched += 1;
            run += 1;
            longest_run = longest_run.max(run);
        } else {
            run = 0;
        }
    }

    if matched < query_chars.len() {
        return 0.0;
    }

    let score = 0.5 * (matched as f64 / query_len) + 0.3 * (longest_run as f64 / query_len);
    score.min(FUZZY_SCORE_CAP)
}

/// Strictly-greater threshold on either score.
pub(in crate::app) fn passes_threshold(label_score: f64, type_score: f64) -> bool {
    label_score > HIGHLIGHT_THRESHOLD || type_score > HIGHLIGHT_THRESHOLD
}
