//! Seam to the hexagonal spatial index.
//!
//! The engine only needs four queries from the index: the edge length at a
//! resolution, the cells covering a polygon, a cell's boundary and a point
//! inside the cell. [`H3Index`] answers them with `h3o`.

use std::collections::BTreeSet;
use std::str::FromStr;

use geo_types::{LineString, Polygon};
use h3o::geom::{ContainmentMode, TilerBuilder};
use h3o::{CellIndex, LatLng, Resolution};

use crate::projection::GeoPoint;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("invalid grid resolution {0}")]
    InvalidResolution(u8),
    #[error("invalid cell id {0:?}")]
    InvalidCell(String),
    #[error("invalid coverage polygon: {0}")]
    InvalidGeometry(String),
}

pub trait HexIndex {
    /// Average hexagon edge length at `resolution`, in ground metres.
    fn edge_length_m(&self, resolution: u8) -> Result<f64, GridError>;

    /// Average hexagon area at `resolution`, in square ground metres.
    fn cell_area_m2(&self, resolution: u8) -> Result<f64, GridError>;

    /// Ids of every cell whose shape intersects the closed `ring`.
    fn cells_covering(&self, ring: &[GeoPoint], resolution: u8)
    -> Result<Vec<String>, GridError>;

    /// Boundary vertices of a cell in the index's native order.
    fn boundary(&self, cell_id: &str) -> Result<Vec<GeoPoint>, GridError>;

    /// A point guaranteed to lie inside the cell.
    fn interior_point(&self, cell_id: &str) -> Result<GeoPoint, GridError>;
}

/// [`HexIndex`] backed by the H3 grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct H3Index;

impl H3Index {
    fn resolution(resolution: u8) -> Result<Resolution, GridError> {
        Resolution::try_from(resolution).map_err(|_| GridError::InvalidResolution(resolution))
    }

    fn cell(cell_id: &str) -> Result<CellIndex, GridError> {
        CellIndex::from_str(cell_id).map_err(|_| GridError::InvalidCell(cell_id.to_owned()))
    }
}

impl HexIndex for H3Index {
    fn edge_length_m(&self, resolution: u8) -> Result<f64, GridError> {
        Ok(Self::resolution(resolution)?.edge_length_m())
    }

    fn cell_area_m2(&self, resolution: u8) -> Result<f64, GridError> {
        Ok(Self::resolution(resolution)?.area_m2())
    }

    fn cells_covering(
        &self,
        ring: &[GeoPoint],
        resolution: u8,
    ) -> Result<Vec<String>, GridError> {
        let res = Self::resolution(resolution)?;
        let exterior: LineString<f64> = ring.iter().map(|p| (p.lng, p.lat)).collect();
        let polygon = Polygon::new(exterior, Vec::new());

        let mut tiler = TilerBuilder::new(res)
            .containment_mode(ContainmentMode::IntersectsBoundary)
            .build();
        tiler
            .add(polygon)
            .map_err(|e| GridError::InvalidGeometry(e.to_string()))?;

        let cells: BTreeSet<String> = tiler
            .into_coverage()
            .map(|cell| cell.to_string())
            .collect();
        Ok(cells.into_iter().collect())
    }

    fn boundary(&self, cell_id: &str) -> Result<Vec<GeoPoint>, GridError> {
        let cell = Self::cell(cell_id)?;
        Ok(cell
            .boundary()
            .iter()
            .map(|ll| GeoPoint::new(ll.lng(), ll.lat()))
            .collect())
    }

    fn interior_point(&self, cell_id: &str) -> Result<GeoPoint, GridError> {
        let center = LatLng::from(Self::cell(cell_id)?);
        Ok(GeoPoint::new(center.lng(), center.lat()))
    }
}
