use eframe::egui::{Color32, Vec2};

use crate::config::StyleConfig;
use crate::graph::Graph;

use super::graph::SelectionState;
use super::highlight::HighlightState;
use super::physics::{Placement, is_finite};
use super::render_utils::{
    CONNECTED_GLOW, HIGHLIGHT_COLOR, HIGHLIGHTED_GLOW, SELECTED_GLOW, blend_color, dim_color,
    kind_color,
};

const ELLIPSIS: char = '…';
const DIM_FACTOR: f32 = 0.35;
const HIGHLIGHT_FONT_SCALE: f32 = 1.2;
const LABEL_COLOR: Color32 = Color32::from_gray(226);

const EDGE_COLOR: Color32 = Color32::from_rgba_premultiplied(84, 90, 102, 150);
const EDGE_WIDTH: f32 = 1.0;
const EDGE_FOCUS_COLOR: Color32 = Color32::from_rgba_premultiplied(196, 206, 224, 235);
const EDGE_FOCUS_WIDTH: f32 = 2.2;
const EDGE_FADED_COLOR: Color32 = Color32::from_rgba_premultiplied(24, 26, 31, 55);
const EDGE_FADED_WIDTH: f32 = 0.5;

pub(in crate::app) type MeasureText<'a> = &'a dyn Fn(&str, f32) -> f32;

pub(in crate::app) struct FrameInputs<'a> {
    pub(in crate::app) graph: &'a Graph,
    pub(in crate::app) placements: &'a [Placement],
    pub(in crate::app) selection: &'a SelectionState,
    pub(in crate::app) highlight: &'a HighlightState,
    pub(in crate::app) zoom: f32,
    pub(in crate::app) label_zoom_threshold: f32,
    pub(in crate::app) style: &'a StyleConfig,
    pub(in crate::app) measure: MeasureText<'a>,
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct LabelVisual {
    pub(in crate::app) lines: Vec<String>,
    /// Screen pixels.
    pub(in crate::app) font_size: f32,
    pub(in crate::app) color: Color32,
    pub(in crate::app) strong: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) struct NodeVisual {
    pub(in crate::app) index: usize,
    pub(in crate::app) position: Vec2,
    /// World units; the painter scales by zoom.
    pub(in crate::app) radius: f32,
    pub(in crate::app) fill: Color32,
    pub(in crate::app) glow: Option<Color32>,
    pub(in crate::app) selected: bool,
    pub(in crate::app) connected: bool,
    pub(in crate::app) highlighted: bool,
    pub(in crate::app) dimmed: bool,
    pub(in crate::app) label: Option<LabelVisual>,
}

impl NodeVisual {
    fn layer(&self) -> u8 {
        if self.selected {
            4
        } else if self.highlighted {
            3
        } else if self.connected {
            2
        } else if self.dimmed {
            0
        } else {
            1
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct EdgeVisual {
    pub(in crate::app) from: Vec2,
    pub(in crate::app) to: Vec2,
    pub(in crate::app) color: Color32,
    /// Screen pixels.
    pub(in crate::app) width: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(in crate::app) struct FrameVisuals {
    pub(in crate::app) nodes: Vec<NodeVisual>,
    pub(in crate::app) edges: Vec<EdgeVisual>,
}

pub(in crate::app) fn compute_visual_state(inputs: &FrameInputs<'_>) -> FrameVisuals {
    let graph = inputs.graph;
    let selection = inputs.selection;
    let highlight_active = inputs.highlight.is_active();
    let selection_active = selection.is_active();

    let mut nodes = graph
        .nodes()
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let position = inputs.placements.get(index)?.position();
            if !is_finite(position) {
                return None;
            }

            let selected = selection.selected_index == Some(index);
            let connected = selection.connected_nodes.contains(&index);
            let highlighted = inputs.highlight.contains(index);
            let dimmed = is_dimmed(
                highlight_active,
                selection_active,
                selected,
                connected,
                highlighted,
            );

            let base = if highlighted {
                HIGHLIGHT_COLOR
            } else {
                kind_color(node.kind)
            };
            let fill = if dimmed {
                dim_color(base, DIM_FACTOR)
            } else {
                base
            };

            let label = (inputs.zoom > inputs.label_zoom_threshold || highlighted).then(|| {
                label_visual(node.display_label(), highlighted, inputs)
            });

            Some(NodeVisual {
                index,
                position,
                radius: node_radius(inputs.style, selected, highlighted, connected),
                fill,
                glow: glow_color(selected, highlighted, connected),
                selected,
                connected,
                highlighted,
                dimmed,
                label,
            })
        })
        .collect::<Vec<_>>();
    nodes.sort_by_key(NodeVisual::layer);

    let edges = graph
        .edges()
        .iter()
        .enumerate()
        .filter_map(|(edge_index, edge)| {
            let from = inputs.placements.get(edge.source)?.position();
            let to = inputs.placements.get(edge.target)?.position();
            if !is_finite(from) || !is_finite(to) {
                return None;
            }

            let (color, width) = if !selection_active {
                (EDGE_COLOR, EDGE_WIDTH)
            } else if selection.connected_edges.contains(&edge_index) {
                (EDGE_FOCUS_COLOR, EDGE_FOCUS_WIDTH)
            } else {
                (EDGE_FADED_COLOR, EDGE_FADED_WIDTH)
            };
            Some(EdgeVisual {
                from,
                to,
                color,
                width,
            })
        })
        .collect();

    FrameVisuals { nodes, edges }
}

/// An active search dims everything it didn't match; a selection only dims
/// when no search is active.
fn is_dimmed(
    highlight_active: bool,
    selection_active: bool,
    selected: bool,
    connected: bool,
    highlighted: bool,
) -> bool {
    (highlight_active && !highlighted && !selected)
        || (selection_active && !highlight_active && !selected && !connected)
}

/// World radius `index` is drawn with under the current selection and search.
pub(in crate::app) fn drawn_radius(
    style: &StyleConfig,
    selection: &SelectionState,
    highlight: &HighlightState,
    index: usize,
) -> f32 {
    node_radius(
        style,
        selection.selected_index == Some(index),
        highlight.contains(index),
        selection.connected_nodes.contains(&index),
    )
}

fn node_radius(style: &StyleConfig, selected: bool, highlighted: bool, connected: bool) -> f32 {
    if selected {
        style.selected_radius
    } else if highlighted {
        style.highlighted_radius
    } else if connected {
        style.connected_radius
    } else {
        style.node_radius
    }
}

fn glow_color(selected: bool, highlighted: bool, connected: bool) -> Option<Color32> {
    if selected {
        Some(SELECTED_GLOW)
    } else if highlighted {
        Some(HIGHLIGHTED_GLOW)
    } else if connected {
        Some(CONNECTED_GLOW)
    } else {
        None
    }
}

/// Screen font size: `base / zoom` in world units clamped, then scaled back by zoom.
pub(in crate::app) fn label_font_size(style: &StyleConfig, zoom: f32) -> f32 {
    let zoom = zoom.max(f32::EPSILON);
    (style.label_font / zoom).clamp(style.min_font, style.max_font) * zoom
}

fn label_visual(text: &str, highlighted: bool, inputs: &FrameInputs<'_>) -> LabelVisual {
    let mut font_size = label_font_size(inputs.style, inputs.zoom);
    if highlighted {
        font_size *= HIGHLIGHT_FONT_SCALE;
    }

    let measure = |line: &str| (inputs.measure)(line, font_size);
    LabelVisual {
        lines: wrap_label(text, inputs.style.label_width, &measure),
        font_size,
        color: if highlighted {
            blend_color(HIGHLIGHT_COLOR, Color32::WHITE, 0.25)
        } else {
            LABEL_COLOR
        },
        strong: highlighted,
    }
}

/// Wraps `text` into at most two lines of `max_width`, ellipsizing the second.
pub(in crate::app) fn wrap_label(
    text: &str,
    max_width: f32,
    measure: &dyn Fn(&str) -> f32,
) -> Vec<String> {
    let mut words = text.split_whitespace().map(str::to_owned).collect::<Vec<_>>();
    if words.is_empty() {
        return Vec::new();
    }
    words.reverse();

    let mut first = String::new();
    while let Some(word) = words.pop() {
        let candidate = if first.is_empty() {
            word.clone()
        } else {
            format!("{first} {word}")
        };

        if measure(&candidate) <= max_width {
            first = candidate;
            continue;
        }

        if first.is_empty() {
            let (head, tail) = split_to_fit(&word, max_width, measure);
            first = head;
            if !tail.is_empty() {
                words.push(tail);
            }
        } else {
            words.push(word);
        }
        break;
    }

    if words.is_empty() {
        return vec![first];
    }

    words.reverse();
    let second = ellipsize(&words.join(" "), max_width, measure);
    vec![first, second]
}

fn split_to_fit(word: &str, max_width: f32, measure: &dyn Fn(&str) -> f32) -> (String, String) {
    let mut boundary = word.chars().next().map_or(0, char::len_utf8);
    for (offset, character) in word.char_indices().skip(1) {
        let end = offset + character.len_utf8();
        if measure(&word[..end]) > max_width {
            break;
        }
        boundary = end;
    }

    (word[..boundary].to_owned(), word[boundary..].to_owned())
}

fn ellipsize(text: &str, max_width: f32, measure: &dyn Fn(&str) -> f32) -> String {
    if measure(text) <= max_width {
        return text.to_owned();
    }

    let mut kept = text.chars().collect::<Vec<_>>();
    while !kept.is_empty() {
        kept.pop();
        let trimmed = kept.iter().collect::<String>();
        let candidate = format!("{}{ELLIPSIS}", trimmed.trim_end());
        if measure(&candidate) <= max_width {
            return candidate;
        }
    }

    ELLIPSIS.to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Instant;

    use eframe::egui::vec2;

    use super::*;
    use crate::app::graph::InteractionController;
    use crate::app::highlight::{HighlightCache, highlight};
    use crate::app::physics::LayoutSimulator;
    use crate::config::{CameraConfig, LayoutConfig};
    use crate::graph::{GraphModel, fixtures::study_payload};

    fn char_width(text: &str) -> f32 {
        text.chars().count() as f32 * 10.0
    }

    fn char_measure(text: &str, _font_size: f32) -> f32 {
        char_width(text)
    }

    struct Scene {
        graph: Arc<Graph>,
        simulator: LayoutSimulator,
        controller: InteractionController,
        style: StyleConfig,
    }

    impl Scene {
        fn new() -> Self {
            let graph = GraphModel::new().reconcile(study_payload());
            let mut simulator = LayoutSimulator::new(Arc::clone(&graph), LayoutConfig::default());
            simulator.tick(Instant::now());
            Self {
                graph,
                simulator,
                controller: InteractionController::new(CameraConfig::default()),
                style: StyleConfig::default(),
            }
        }

        fn index(&self, id: &str) -> usize {
            self.graph.index_of(id).unwrap_or(usize::MAX)
        }

        fn select(&mut self, id: &str) {
            let index = self.index(id);
            self.controller.on_node_click(&self.graph, index);
        }

        fn frame(&self, highlight: &HighlightState, zoom: f32) -> FrameVisuals {
            compute_visual_state(&FrameInputs {
                graph: &self.graph,
                placements: self.simulator.placements(),
                selection: &self.controller.selection,
                highlight,
                zoom,
                label_zoom_threshold: 1.5,
                style: &self.style,
                measure: &char_measure,
            })
        }
    }

    fn visual<'a>(frame: &'a FrameVisuals, index: usize) -> Option<&'a NodeVisual> {
        frame.nodes.iter().find(|node| node.index == index)
    }

    fn highlight_state(graph: &Graph, query: &str) -> HighlightState {
        HighlightState {
            query: query.to_owned(),
            highlighted: highlight(graph, query).map(Arc::new),
        }
    }

    #[test]
    fn no_selection_or_search_dims_nothing() {
        let scene = Scene::new();

        let frame = scene.frame(&HighlightState::default(), 1.0);

        assert_eq!(frame.nodes.len(), scene.graph.node_count());
        assert!(frame.nodes.iter().all(|node| !node.dimmed && node.glow.is_none()));
        assert!(frame.edges.iter().all(|edge| edge.width == EDGE_WIDTH));
    }

    #[test]
    fn selection_dims_unconnected_nodes() {
        let mut scene = Scene::new();
        scene.select("paper-1");

        let frame = scene.frame(&HighlightState::default(), 1.0);

        let stats = visual(&frame, scene.index("concept-stats"));
        let note = visual(&frame, scene.index("note-1"));
        assert!(stats.is_some_and(|node| node.dimmed));
        assert!(note.is_some_and(|node| !node.dimmed && node.connected));
    }

    #[test]
    fn highlight_dimming_takes_precedence_over_selection() {
        let mut scene = Scene::new();
        scene.select("paper-1");
        let search = highlight_state(&scene.graph, "statistics");

        let frame = scene.frame(&search, 1.0);

        let stats = visual(&frame, scene.index("concept-stats"));
        assert!(stats.is_some_and(|node| node.highlighted && !node.dimmed));
        let note = visual(&frame, scene.index("note-1"));
        assert!(note.is_some_and(|node| node.connected && node.dimmed));
        let paper = visual(&frame, scene.index("paper-1"));
        assert!(paper.is_some_and(|node| node.selected && !node.dimmed));
    }

    #[test]
    fn radius_follows_state_precedence() {
        let mut scene = Scene::new();
        scene.select("paper-1");
        let search = highlight_state(&scene.graph, "machine");

        let frame = scene.frame(&search, 1.0);
        let radius = |id: &str| visual(&frame, scene.index(id)).map_or(0.0, |node| node.radius);

        assert!(radius("paper-1") > radius("concept-ml"));
        assert!(radius("concept-ml") > radius("note-1"));
        assert!(radius("note-1") > radius("concept-stats"));
    }

    #[test]
    fn drawn_radius_matches_painted_radius() {
        let mut scene = Scene::new();
        scene.select("paper-1");
        let search = highlight_state(&scene.graph, "machine");

        let frame = scene.frame(&search, 1.0);

        for node in &frame.nodes {
            let expected = drawn_radius(&scene.style, &scene.controller.selection, &search, node.index);
            assert_eq!(node.radius, expected);
        }
    }

    #[test]
    fn highlight_color_overrides_kind_color() {
        let scene = Scene::new();
        let search = highlight_state(&scene.graph, "deep");

        let frame = scene.frame(&search, 1.0);

        let deep = visual(&frame, scene.index("concept-dl"));
        assert_eq!(deep.map(|node| node.fill), Some(HIGHLIGHT_COLOR));
        assert_eq!(deep.and_then(|node| node.glow), Some(HIGHLIGHTED_GLOW));
    }

    #[test]
    fn glow_colors_are_distinct_per_state() {
        let glows = [SELECTED_GLOW, HIGHLIGHTED_GLOW, CONNECTED_GLOW];
        let unique = glows.iter().collect::<HashSet<_>>();

        assert_eq!(unique.len(), glows.len());
    }

    #[test]
    fn labels_appear_past_zoom_threshold_or_when_highlighted() {
        let scene = Scene::new();
        let search = highlight_state(&scene.graph, "deep");

        let far = scene.frame(&search, 1.0);
        let labeled = far
            .nodes
            .iter()
            .filter(|node| node.label.is_some())
            .map(|node| node.index)
            .collect::<Vec<_>>();
        assert_eq!(labeled, vec![scene.index("concept-dl")]);
        let strong = visual(&far, scene.index("concept-dl"))
            .and_then(|node| node.label.as_ref())
            .is_some_and(|label| label.strong);
        assert!(strong);

        let near = scene.frame(&HighlightState::default(), 2.0);
        assert!(near.nodes.iter().all(|node| node.label.is_some()));
    }

    #[test]
    fn selected_paints_last_and_dimmed_first() {
        let mut scene = Scene::new();
        scene.select("concept-stats");

        let frame = scene.frame(&HighlightState::default(), 1.0);

        assert!(frame.nodes.first().is_some_and(|node| node.dimmed));
        assert!(frame.nodes.last().is_some_and(|node| node.selected));
    }

    #[test]
    fn edges_touching_selection_stand_out() {
        let mut scene = Scene::new();
        scene.select("note-1");

        let frame = scene.frame(&HighlightState::default(), 1.0);

        let focused = frame
            .edges
            .iter()
            .filter(|edge| edge.width == EDGE_FOCUS_WIDTH)
            .count();
        let faded = frame
            .edges
            .iter()
            .filter(|edge| edge.width == EDGE_FADED_WIDTH)
            .count();
        assert_eq!(focused, 1);
        assert_eq!(faded, scene.graph.edge_count() - 1);
    }

    #[test]
    fn unplaced_nodes_and_their_edges_are_skipped() {
        let graph = GraphModel::new().reconcile(study_payload());
        let simulator = LayoutSimulator::new(Arc::clone(&graph), LayoutConfig::default());
        let style = StyleConfig::default();

        let frame = compute_visual_state(&FrameInputs {
            graph: &graph,
            placements: simulator.placements(),
            selection: &SelectionState::default(),
            highlight: &HighlightState::default(),
            zoom: 1.0,
            label_zoom_threshold: 1.5,
            style: &style,
            measure: &char_measure,
        });

        assert!(frame.nodes.is_empty());
        assert!(frame.edges.is_empty());
    }

    #[test]
    fn cached_highlight_feeds_the_frame() {
        let scene = Scene::new();
        let mut cache = HighlightCache::default();

        let search = cache.resolve(&scene.graph, "reading notes").clone();
        let frame = scene.frame(&search, 1.0);

        let highlighted = frame
            .nodes
            .iter()
            .filter(|node| node.highlighted)
            .map(|node| node.index)
            .collect::<Vec<_>>();
        assert_eq!(highlighted, vec![scene.index("note-1")]);
    }

    #[test]
    fn short_label_stays_on_one_line() {
        assert_eq!(wrap_label("Deep Learning", 200.0, &char_width), ["Deep Learning"]);
    }

    #[test]
    fn label_wraps_onto_second_line() {
        assert_eq!(
            wrap_label("Attention Is All", 100.0, &char_width),
            ["Attention", "Is All"]
        );
    }

    #[test]
    fn overflowing_second_line_is_ellipsized() {
        let lines = wrap_label("Attention Is All You Need Today", 100.0, &char_width);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Attention");
        assert!(lines[1].ends_with(ELLIPSIS));
        assert!(char_width(&lines[1]) <= 100.0);
    }

    #[test]
    fn long_word_is_split_across_lines() {
        let lines = wrap_label("Electroencephalography", 100.0, &char_width);

        assert_eq!(lines[0], "Electroenc");
        assert!(lines[1].ends_with(ELLIPSIS));
    }

    #[test]
    fn empty_label_has_no_lines() {
        assert!(wrap_label("   ", 100.0, &char_width).is_empty());
    }

    #[test]
    fn font_size_scales_inversely_and_clamps() {
        let style = StyleConfig::default();

        // Inside the clamp range the on-screen size stays at the base size.
        assert!((label_font_size(&style, 1.0) - style.label_font).abs() < 1e-5);
        assert!((label_font_size(&style, 2.0) - style.label_font).abs() < 1e-5);
        // Deep zoom hits the minimum world size, so text grows on screen.
        let deep = label_font_size(&style, 10.0);
        assert!((deep - style.min_font * 10.0).abs() < 1e-4);
        // Zoomed out the world size caps, so text shrinks on screen.
        let far = label_font_size(&style, 0.5);
        assert!((far - style.max_font * 0.5).abs() < 1e-5);
    }

    #[test]
    fn visual_positions_match_simulator() {
        let scene = Scene::new();

        let frame = scene.frame(&HighlightState::default(), 1.0);

        for node in &frame.nodes {
            let expected = scene.simulator.position(node.index).unwrap_or(vec2(f32::NAN, 0.0));
            assert_eq!(node.position, expected);
        }
    }
}
