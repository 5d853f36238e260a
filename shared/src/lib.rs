pub mod api;
pub mod resolution;
pub mod resources;

pub use api::{POLYGONS_PATH, polygon_info_path};
pub use resolution::{FINEST_RESOLUTION, MAX_RESOLUTION, MIN_RESOLUTION, resolution_for_zoom};
pub use resources::{PolygonRecord, ResourceInfo, format_amount};
