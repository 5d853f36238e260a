use std::collections::HashMap;

use crate::projection::{GeoPoint, MapPoint};
use crate::viewport::BoundingBox;

/// One rendered hexagon. Rebuilt from scratch on every viewport update; only
/// `id` is meaningful across rebuilds.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub id: String,
    /// Closed ring in degrees.
    pub boundary_geo: Vec<GeoPoint>,
    /// Closed ring in projected metres.
    pub boundary_render: Vec<MapPoint>,
    /// Panel anchor, inside the ring.
    pub interior: MapPoint,
    pub bounds: BoundingBox,
    pub selected: bool,
}

impl GridCell {
    pub fn contains(&self, p: MapPoint) -> bool {
        self.bounds.contains(p) && ring_contains(&self.boundary_render, p)
    }

    /// Move the rendered geometry `dx` metres east, e.g. onto the next world
    /// copy. The geographic ring is unchanged.
    pub fn shift_x(&mut self, dx: f64) {
        for p in &mut self.boundary_render {
            p.x += dx;
        }
        self.interior.x += dx;
        self.bounds = BoundingBox::new(
            self.bounds.min_x + dx,
            self.bounds.min_y,
            self.bounds.max_x + dx,
            self.bounds.max_y,
        );
    }
}

/// Even-odd test against a closed ring.
fn ring_contains(ring: &[MapPoint], p: MapPoint) -> bool {
    let mut inside = false;
    for edge in ring.windows(2) {
        let (a, b) = (edge[0], edge[1]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

/// The cells currently on screen. Replaced wholesale, never patched.
#[derive(Debug, Default)]
pub struct GridRenderState {
    cells: Vec<GridCell>,
    by_id: HashMap<String, usize>,
    resolution: Option<u8>,
    rebuilds: u64,
}

impl GridRenderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every rendered cell and install `cells` for `resolution`.
    /// A repeated id keeps its first occurrence.
    pub fn replace(&mut self, resolution: u8, cells: Vec<GridCell>) {
        self.cells.clear();
        self.by_id.clear();
        self.cells.reserve(cells.len());
        for cell in cells {
            if self.by_id.contains_key(&cell.id) {
                continue;
            }
            self.by_id.insert(cell.id.clone(), self.cells.len());
            self.cells.push(cell);
        }
        self.resolution = Some(resolution);
        self.rebuilds += 1;
    }

    pub fn resolution(&self) -> Option<u8> {
        self.resolution
    }

    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridCell> {
        self.cells.iter()
    }

    pub fn get(&self, id: &str) -> Option<&GridCell> {
        self.by_id.get(id).map(|&idx| &self.cells[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Id of the cell under a projected point, if any.
    pub fn find_at(&self, p: MapPoint) -> Option<&str> {
        self.cells
            .iter()
            .find(|cell| cell.contains(p))
            .map(|cell| cell.id.as_str())
    }

    /// Flag `id` as selected and clear the flag on every other cell.
    /// Returns whether `id` was found in the current set.
    pub fn mark_selected(&mut self, id: Option<&str>) -> bool {
        let mut found = false;
        for cell in &mut self.cells {
            let hit = id == Some(cell.id.as_str());
            found |= hit;
            cell.selected = hit;
        }
        found
    }

    #[cfg(test)]
    pub fn selected_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.selected).count()
    }
}
