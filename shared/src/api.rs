use crate::resolution::is_finest;

/// Diagnostic listing of known cells.
pub const POLYGONS_PATH: &str = "/api/polygons";

/// Request path for a cell's resource info.
///
/// The finest resolution uses the short form without a resolution segment.
pub fn polygon_info_path(resolution: u8, cell_id: &str) -> String {
    if is_finest(resolution) {
        format!("/api/polygon/{cell_id}/info")
    } else {
        format!("/api/polygon/{resolution}/{cell_id}/info")
    }
}
