use crate::config::{DEFAULT_CENTER, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM};
use crate::projection::{HALF_WORLD_M, MapPoint};

/// Projected metres per CSS pixel at zoom 0 (256px world tile).
const ZOOM0_RESOLUTION: f64 = 2.0 * HALF_WORLD_M / 256.0;
const ZOOM_SENSITIVITY: f64 = 0.005;

/// Axis-aligned box in projected coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box containing every point, or `None` for an empty slice.
    pub fn around(points: &[MapPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self::new(first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, p: MapPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Grow the box by `amount` on every side.
    pub fn expanded(&self, amount: f64) -> Self {
        Self::new(
            self.min_x - amount,
            self.min_y - amount,
            self.max_x + amount,
            self.max_y + amount,
        )
    }
}

/// The visible map: a projected center, a fractional zoom level and the
/// canvas size in CSS pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub center: MapPoint,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            width: 1200.0,
            height: 800.0,
        }
    }
}

impl Viewport {
    /// Projected metres covered by one CSS pixel.
    pub fn resolution(&self) -> f64 {
        ZOOM0_RESOLUTION / 2f64.powf(self.zoom)
    }

    /// Visible area in projected coordinates.
    pub fn extent(&self) -> BoundingBox {
        let res = self.resolution();
        let half_w = self.width / 2.0 * res;
        let half_h = self.height / 2.0 * res;
        BoundingBox::new(
            self.center.x - half_w,
            self.center.y - half_h,
            self.center.x + half_w,
            self.center.y + half_h,
        )
    }

    /// Convert projected coordinates to canvas pixels (y grows downward).
    pub fn map_to_screen(&self, p: MapPoint) -> (f64, f64) {
        let res = self.resolution();
        (
            (p.x - self.center.x) / res + self.width / 2.0,
            (self.center.y - p.y) / res + self.height / 2.0,
        )
    }

    /// Convert canvas pixels to projected coordinates.
    pub fn screen_to_map(&self, sx: f64, sy: f64) -> MapPoint {
        let res = self.resolution();
        MapPoint::new(
            self.center.x + (sx - self.width / 2.0) * res,
            self.center.y - (sy - self.height / 2.0) * res,
        )
    }

    /// Zoom toward a focus point (screen coordinates).
    pub fn zoom_at(&mut self, delta: f64, screen_x: f64, screen_y: f64) {
        let anchor = self.screen_to_map(screen_x, screen_y);
        self.zoom = (self.zoom - delta * ZOOM_SENSITIVITY).clamp(MIN_ZOOM, MAX_ZOOM);

        // Keep the point under the cursor fixed
        let res = self.resolution();
        self.center.x = anchor.x - (screen_x - self.width / 2.0) * res;
        self.center.y = anchor.y + (screen_y - self.height / 2.0) * res;
        self.clamp_center();
    }

    /// Pan by screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let res = self.resolution();
        self.center.x -= dx * res;
        self.center.y += dy * res;
        self.clamp_center();
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 {
            self.width = width;
            self.height = height;
        }
    }

    fn clamp_center(&mut self) {
        self.center.x = self.center.x.clamp(-HALF_WORLD_M, HALF_WORLD_M);
        self.center.y = self.center.y.clamp(-HALF_WORLD_M, HALF_WORLD_M);
    }
}
