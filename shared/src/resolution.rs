/// Coarsest grid resolution the map will render.
pub const MIN_RESOLUTION: u8 = 5;
/// Finest grid resolution the map will render.
pub const MAX_RESOLUTION: u8 = 10;
/// Resolution served by the short `/api/polygon/{cell}/info` route.
pub const FINEST_RESOLUTION: u8 = MAX_RESOLUTION;

const ZOOM_FACTOR: f64 = 0.8;
const ZOOM_OFFSET: f64 = 3.0;

/// Map a (possibly fractional) zoom level to the grid resolution drawn at it.
///
/// `clamp(floor(zoom * 0.8) - 3, 5, 10)`. Non-decreasing in `zoom`; infinite
/// inputs clamp to the bounds and NaN falls back to the coarsest level.
pub fn resolution_for_zoom(zoom: f64) -> u8 {
    let raw = (zoom * ZOOM_FACTOR).floor() - ZOOM_OFFSET;
    if raw.is_nan() {
        return MIN_RESOLUTION;
    }
    raw.clamp(f64::from(MIN_RESOLUTION), f64::from(MAX_RESOLUTION)) as u8
}

pub const fn is_finest(resolution: u8) -> bool {
    resolution == FINEST_RESOLUTION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_zoom_levels() {
        assert_eq!(resolution_for_zoom(13.0), 7);
        assert_eq!(resolution_for_zoom(8.0), 5);
        assert_eq!(resolution_for_zoom(20.0), 10);
    }

    #[test]
    fn fractional_zoom_floors_before_offset() {
        // 11.25 * 0.8 = 9.0 exactly; 11.2 * 0.8 = 8.96
        assert_eq!(resolution_for_zoom(11.25), 6);
        assert_eq!(resolution_for_zoom(11.2), 5);
        assert_eq!(resolution_for_zoom(17.5), 10);
    }

    #[test]
    fn extreme_inputs_clamp_to_bounds() {
        assert_eq!(resolution_for_zoom(-4.0), MIN_RESOLUTION);
        assert_eq!(resolution_for_zoom(0.0), MIN_RESOLUTION);
        assert_eq!(resolution_for_zoom(1.0e9), MAX_RESOLUTION);
        assert_eq!(resolution_for_zoom(f64::INFINITY), MAX_RESOLUTION);
        assert_eq!(resolution_for_zoom(f64::NEG_INFINITY), MIN_RESOLUTION);
        assert_eq!(resolution_for_zoom(f64::NAN), MIN_RESOLUTION);
    }

    #[test]
    fn monotonic_and_in_range_over_sweep() {
        let mut previous = resolution_for_zoom(-10.0);
        let mut zoom = -10.0;
        while zoom <= 40.0 {
            let res = resolution_for_zoom(zoom);
            assert!((MIN_RESOLUTION..=MAX_RESOLUTION).contains(&res));
            assert!(res >= previous, "resolution dropped at zoom {zoom}");
            previous = res;
            zoom += 0.05;
        }
    }

    #[test]
    fn only_max_resolution_is_finest() {
        assert!(is_finest(10));
        assert!(!is_finest(9));
        assert!(!is_finest(5));
    }
}
