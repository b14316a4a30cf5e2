use eframe::egui::{Rect, Vec2, vec2};

use super::is_finite;

const LEAF_SIZE: usize = 8;
const MAX_DEPTH: u8 = 10;

pub(super) struct QuadCell {
    pub(super) area: Rect,
    pub(super) centroid: Vec2,
    /// Number of placed nodes below this cell.
    pub(super) mass: f32,
    pub(super) members: Vec<usize>,
    quadrants: Option<Box<[Option<QuadCell>; 4]>>,
}

impl QuadCell {
    pub(super) fn over(positions: &[Vec2]) -> Option<Self> {
        let placed = (0..positions.len())
            .filter(|&index| is_finite(positions[index]))
            .collect::<Vec<_>>();
        let area = square_around(positions, &placed)?;
        Some(Self::grow(area, placed, positions, 0))
    }

    fn grow(area: Rect, members: Vec<usize>, positions: &[Vec2], depth: u8) -> Self {
        let centroid = if members.is_empty() {
            Vec2::ZERO
        } else {
            let total = members
                .iter()
                .fold(Vec2::ZERO, |total, &index| total + positions[index]);
            total / members.len() as f32
        };

        let mut cell = Self {
            area,
            centroid,
            mass: members.len() as f32,
            members,
            quadrants: None,
        };
        if depth >= MAX_DEPTH || cell.members.len() <= LEAF_SIZE {
            return cell;
        }

        let mut buckets: [Vec<usize>; 4] = Default::default();
        for &index in &cell.members {
            buckets[cell.quadrant_of(positions[index])].push(index);
        }
        // Coincident points would split forever.
        if buckets.iter().filter(|bucket| !bucket.is_empty()).count() < 2 {
            return cell;
        }

        let mut children: [Option<QuadCell>; 4] = Default::default();
        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if !bucket.is_empty() {
                let child_area = cell.quadrant_area(quadrant);
                children[quadrant] = Some(Self::grow(child_area, bucket, positions, depth + 1));
            }
        }
        cell.quadrants = Some(Box::new(children));
        cell.members.clear();
        cell
    }

    /// Bit 0 is east, bit 1 is south.
    fn quadrant_of(&self, point: Vec2) -> usize {
        let center = self.area.center();
        usize::from(point.x >= center.x) | (usize::from(point.y >= center.y) << 1)
    }

    fn quadrant_area(&self, quadrant: usize) -> Rect {
        let half = self.area.width() * 0.5;
        let east = if quadrant & 1 == 1 { half } else { 0.0 };
        let south = if quadrant & 2 == 2 { half } else { 0.0 };
        Rect::from_min_size(self.area.min + vec2(east, south), Vec2::splat(half))
    }

    pub(super) fn is_leaf(&self) -> bool {
        self.quadrants.is_none()
    }

    pub(super) fn quadrant(&self, quadrant: usize) -> Option<&QuadCell> {
        self.quadrants.as_ref()?.get(quadrant)?.as_ref()
    }

    pub(super) fn children(&self) -> impl Iterator<Item = &QuadCell> {
        self.quadrants.iter().flat_map(|children| children.iter().flatten())
    }

    pub(super) fn side(&self) -> f32 {
        self.area.width()
    }

    pub(super) fn contains(&self, point: Vec2) -> bool {
        self.area.contains(point.to_pos2())
    }

    pub(super) fn gap_sq_to(&self, point: Vec2) -> f32 {
        self.area.distance_sq_to_pos(point.to_pos2())
    }

    pub(super) fn gap_sq_between(&self, other: &QuadCell) -> f32 {
        let (a, b) = (self.area, other.area);
        let dx = (a.min.x - b.max.x).max(b.min.x - a.max.x).max(0.0);
        let dy = (a.min.y - b.max.y).max(b.min.y - a.max.y).max(0.0);
        dx * dx + dy * dy
    }
}

fn square_around(positions: &[Vec2], placed: &[usize]) -> Option<Rect> {
    let mut extent = Rect::NOTHING;
    for &index in placed {
        extent.extend_with(positions[index].to_pos2());
    }
    if placed.is_empty() {
        return None;
    }

    let side = extent.width().max(extent.height()).max(1.0) + 2.0;
    Some(Rect::from_center_size(extent.center(), Vec2::splat(side)))
}
