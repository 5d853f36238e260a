use crate::grid::GridCell;
use crate::hexindex::{GridError, HexIndex};
use crate::projection::{GeoPoint, to_map, unwrap_lng};
use crate::viewport::BoundingBox;

/// Append the first vertex unless the ring is already closed.
fn close_ring<T: Copy + PartialEq>(ring: &mut Vec<T>) {
    if let Some(&first) = ring.first()
        && ring.last() != Some(&first)
    {
        ring.push(first);
    }
}

/// Build the render-ready geometry for one cell.
///
/// Vertex order is kept exactly as the index reports it; both rings come out
/// closed. Render vertices are unwrapped around the interior point, so a cell
/// straddling the antimeridian stays contiguous and may reach past ±180°.
pub fn project_cell(index: &impl HexIndex, cell_id: &str) -> Result<GridCell, GridError> {
    let mut boundary_geo: Vec<GeoPoint> = index.boundary(cell_id)?;
    if boundary_geo.len() < 3 {
        return Err(GridError::InvalidCell(cell_id.to_owned()));
    }
    let interior_geo = index.interior_point(cell_id)?;

    let mut boundary_render: Vec<_> = boundary_geo
        .iter()
        .map(|&p| to_map(GeoPoint::new(unwrap_lng(p.lng, interior_geo.lng), p.lat)))
        .collect();
    close_ring(&mut boundary_geo);
    close_ring(&mut boundary_render);

    let interior = to_map(interior_geo);
    let bounds = BoundingBox::around(&boundary_render)
        .ok_or_else(|| GridError::InvalidCell(cell_id.to_owned()))?;

    Ok(GridCell {
        id: cell_id.to_owned(),
        boundary_geo,
        boundary_render,
        interior,
        bounds,
        selected: false,
    })
}
