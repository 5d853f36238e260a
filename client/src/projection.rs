//! Web Mercator (EPSG:3857) <-> WGS84 transforms.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

pub const EARTH_RADIUS_M: f64 = 6_378_137.0;
/// Latitude at which the Mercator square ends.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;
/// Projected distance from the antimeridian to the prime meridian.
pub const HALF_WORLD_M: f64 = PI * EARTH_RADIUS_M;
pub const WORLD_M: f64 = 2.0 * HALF_WORLD_M;

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lng: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// Projected coordinate in Web Mercator metres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

impl MapPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

pub fn to_map(p: GeoPoint) -> MapPoint {
    let lat = p.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    MapPoint {
        x: EARTH_RADIUS_M * p.lng.to_radians(),
        y: EARTH_RADIUS_M * (FRAC_PI_4 + lat / 2.0).tan().ln(),
    }
}

pub fn to_geo(p: MapPoint) -> GeoPoint {
    let lat = 2.0 * (p.y / EARTH_RADIUS_M).exp().atan() - FRAC_PI_2;
    GeoPoint {
        lng: (p.x / EARTH_RADIUS_M).to_degrees(),
        lat: lat.to_degrees(),
    }
}

/// Shift `lng` by whole turns so it lies within 180° of `reference`.
pub fn unwrap_lng(lng: f64, reference: f64) -> f64 {
    let delta = lng - reference;
    if delta > 180.0 {
        lng - 360.0 * ((delta + 180.0) / 360.0).floor()
    } else if delta < -180.0 {
        lng + 360.0 * ((180.0 - delta) / 360.0).floor()
    } else {
        lng
    }
}

/// How many projected metres one ground metre spans at `lat` degrees.
pub fn scale_factor(lat: f64) -> f64 {
    1.0 / lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians().cos()
}
