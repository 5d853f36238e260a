use crate::projection::MapPoint;

/// Initial view: Moscow in Web Mercator metres.
pub const DEFAULT_CENTER: MapPoint = MapPoint::new(4_180_709.0, 7_506_893.0);
pub const DEFAULT_ZOOM: f64 = 8.0;
pub const MIN_ZOOM: f64 = 2.0;
pub const MAX_ZOOM: f64 = 19.0;

/// Rebuilds whose estimated cell count exceeds this render nothing.
pub const MAX_RENDERED_CELLS: usize = 12_000;
/// Coverage buffer on each side of the viewport, in cell edge lengths.
pub const BUFFER_EDGE_LENGTHS: f64 = 2.0;

pub const MOVE_END_DEBOUNCE_MS: u32 = 150;
/// Pointer travel below which a press/release counts as a click.
pub const CLICK_SLOP_PX: f64 = 5.0;

/// Prefix for API requests; empty means same origin.
pub const API_BASE: &str = "";
pub const FETCH_MAX_ATTEMPTS: u32 = 3;
pub const FETCH_BASE_DELAY_MS: u32 = 200;
pub const FETCH_MAX_DELAY_MS: u32 = 2_000;

pub const VIEW_SETTINGS_KEY: &str = "hexmap_view";
