use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadCell;

const MIN_DISTANCE_SQ: f32 = 1.0;

#[derive(Clone, Copy)]
pub(super) struct RepulsionParams {
    /// Negative pushes apart. Already scaled by alpha.
    pub(super) strength: f32,
    pub(super) max_distance_sq: f32,
    pub(super) theta: f32,
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) min_distance: f32,
    pub(super) strength: f32,
}

fn fallback_direction(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

fn attraction_toward(point: Vec2, other: Vec2, weight: f32, params: RepulsionParams) -> Vec2 {
    let delta = other - point;
    let distance_sq = delta.length_sq();
    if distance_sq >= params.max_distance_sq {
        return Vec2::ZERO;
    }
    delta * (params.strength * weight / distance_sq.max(MIN_DISTANCE_SQ))
}

pub(super) fn accumulate_repulsion_for_node(
    cell: &QuadCell,
    index: usize,
    positions: &[Vec2],
    params: RepulsionParams,
    velocity_delta: &mut Vec2,
) {
    if cell.mass <= 0.0 {
        return;
    }

    let point = positions[index];
    if cell.gap_sq_to(point) >= params.max_distance_sq {
        return;
    }

    if cell.is_leaf() {
        for &other_index in &cell.members {
            if other_index == index {
                continue;
            }
            let other = positions[other_index];
            if (other - point).length_sq() <= f32::EPSILON {
                *velocity_delta -=
                    fallback_direction(index, other_index) * params.strength.abs() * 0.01;
                continue;
            }
            *velocity_delta += attraction_toward(point, other, 1.0, params);
        }
        return;
    }

    let distance = (cell.centroid - point).length_sq().max(MIN_DISTANCE_SQ).sqrt();
    let far_enough = !cell.contains(point) && cell.side() / distance < params.theta;
    if far_enough && cell.mass > 1.0 {
        *velocity_delta += attraction_toward(point, cell.centroid, cell.mass, params);
        return;
    }

    for child in cell.children() {
        accumulate_repulsion_for_node(child, index, positions, params, velocity_delta);
    }
}

fn push_pair(
    from: usize,
    to: usize,
    positions: &[Vec2],
    params: CollisionParams,
    velocity_deltas: &mut [Vec2],
) {
    let delta = positions[from] - positions[to];
    let distance = delta.length();
    if distance >= params.min_distance {
        return;
    }

    let direction = if distance > 0.0001 {
        delta / distance
    } else {
        fallback_direction(from, to)
    };

    let overlap_push = (params.min_distance - distance) * params.strength * 0.5;
    velocity_deltas[from] += direction * overlap_push;
    velocity_deltas[to] -= direction * overlap_push;
}

pub(super) fn accumulate_collision_pairs(
    node_a: &QuadCell,
    node_b: &QuadCell,
    same_node: bool,
    positions: &[Vec2],
    params: CollisionParams,
    velocity_deltas: &mut [Vec2],
) {
    let reach = params.min_distance * params.min_distance;
    if node_a.gap_sq_between(node_b) > reach {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.members.iter().enumerate() {
                for &to in &node_a.members[offset + 1..] {
                    push_pair(from, to, positions, params, velocity_deltas);
                }
            }
        } else {
            for &from in &node_a.members {
                for &to in &node_b.members {
                    push_pair(from, to, positions, params, velocity_deltas);
                }
            }
        }
        return;
    }

    if same_node {
        for first in 0..4 {
            let Some(child_a) = node_a.quadrant(first) else {
                continue;
            };

            accumulate_collision_pairs(child_a, child_a, true, positions, params, velocity_deltas);

            for second in (first + 1)..4 {
                let Some(child_b) = node_a.quadrant(second) else {
                    continue;
                };
                accumulate_collision_pairs(
                    child_a,
                    child_b,
                    false,
                    positions,
                    params,
                    velocity_deltas,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.side() >= node_b.side()
    };

    if split_a {
        for child in node_a.children() {
            accumulate_collision_pairs(child, node_b, false, positions, params, velocity_deltas);
        }
    } else {
        for child in node_b.children() {
            accumulate_collision_pairs(node_a, child, false, positions, params, velocity_deltas);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repulsion(strength: f32, max_distance: f32) -> RepulsionParams {
        RepulsionParams {
            strength,
            max_distance_sq: max_distance * max_distance,
            theta: 0.9,
        }
    }

    #[test]
    fn negative_strength_pushes_nodes_apart() {
        let positions = vec![vec2(0.0, 0.0), vec2(10.0, 0.0)];
        let tree = QuadCell::over(&positions).expect("placed");

        let mut delta = Vec2::ZERO;
        accumulate_repulsion_for_node(&tree, 0, &positions, repulsion(-30.0, 100.0), &mut delta);

        assert!(delta.x < 0.0);
        assert!(delta.y.abs() < 1e-6);
    }

    #[test]
    fn nodes_beyond_cutoff_do_not_repel() {
        let positions = vec![vec2(0.0, 0.0), vec2(500.0, 0.0)];
        let tree = QuadCell::over(&positions).expect("placed");

        let mut delta = Vec2::ZERO;
        accumulate_repulsion_for_node(&tree, 0, &positions, repulsion(-30.0, 100.0), &mut delta);

        assert_eq!(delta, Vec2::ZERO);
    }

    #[test]
    fn overlapping_pairs_are_pushed_symmetrically() {
        let positions = vec![vec2(0.0, 0.0), vec2(4.0, 0.0), vec2(300.0, 0.0)];
        let tree = QuadCell::over(&positions).expect("placed");
        let mut deltas = vec![Vec2::ZERO; 3];

        accumulate_collision_pairs(
            &tree,
            &tree,
            true,
            &positions,
            CollisionParams {
                min_distance: 20.0,
                strength: 1.0,
            },
            &mut deltas,
        );

        assert!(deltas[0].x < 0.0);
        assert!((deltas[0] + deltas[1]).length() < 1e-5);
        assert_eq!(deltas[2], Vec2::ZERO);
    }
}
