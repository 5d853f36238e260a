use crate::config::BUFFER_EDGE_LENGTHS;
use crate::projection::{GeoPoint, HALF_WORLD_M, MapPoint, scale_factor, to_geo};
use crate::viewport::BoundingBox;

/// The polygon handed to the cell index for one rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    /// Closed counter-clockwise ring starting at the south-west corner.
    pub ring: Vec<GeoPoint>,
    /// Approximate ground area of the ring in square metres.
    pub ground_area_m2: f64,
}

/// Expand the visible extent by [`BUFFER_EDGE_LENGTHS`] cell edges per side
/// and convert it to a geographic ring.
///
/// `edge_length_m` is a ground distance; it is stretched by the Mercator scale
/// factor at the most poleward edge so the buffer never comes up short.
pub fn coverage_ring(extent: &BoundingBox, edge_length_m: f64) -> Coverage {
    let ground_buffer = BUFFER_EDGE_LENGTHS * edge_length_m.max(0.0);

    let first = extent.expanded(ground_buffer * max_scale_factor(extent));
    let buffered = clamp_to_world(&extent.expanded(ground_buffer * max_scale_factor(&first)));

    let sw = to_geo(MapPoint::new(buffered.min_x, buffered.min_y));
    let se = to_geo(MapPoint::new(buffered.max_x, buffered.min_y));
    let ne = to_geo(MapPoint::new(buffered.max_x, buffered.max_y));
    let nw = to_geo(MapPoint::new(buffered.min_x, buffered.max_y));

    let mid_lat = to_geo(MapPoint::new(0.0, (buffered.min_y + buffered.max_y) / 2.0)).lat;
    let k = scale_factor(mid_lat);
    let ground_area_m2 = buffered.width() * buffered.height() / (k * k);

    Coverage {
        ring: vec![sw, se, ne, nw, sw],
        ground_area_m2,
    }
}

fn max_scale_factor(extent: &BoundingBox) -> f64 {
    let south = to_geo(MapPoint::new(0.0, extent.min_y)).lat;
    let north = to_geo(MapPoint::new(0.0, extent.max_y)).lat;
    scale_factor(south.abs().max(north.abs()))
}

fn clamp_to_world(extent: &BoundingBox) -> BoundingBox {
    BoundingBox::new(
        extent.min_x.clamp(-HALF_WORLD_M, HALF_WORLD_M),
        extent.min_y.clamp(-HALF_WORLD_M, HALF_WORLD_M),
        extent.max_x.clamp(-HALF_WORLD_M, HALF_WORLD_M),
        extent.max_y.clamp(-HALF_WORLD_M, HALF_WORLD_M),
    )
}
