//! The grid synchronization engine.
//!
//! [`HexGridLayer`] owns the rendered cells, the selection and the info panel
//! and drives them through two flows: a rebuild after every settled viewport
//! change, and a hit-test on every click. It never suspends; fetches are
//! handed out as [`FetchTicket`]s and their results come back through
//! [`HexGridLayer::on_fetch_complete`].

use hexmap_shared::{ResourceInfo, resolution_for_zoom};

use crate::config::MAX_RENDERED_CELLS;
use crate::extent::coverage_ring;
use crate::fetch::FetchError;
use crate::grid::{GridCell, GridRenderState};
use crate::hexindex::{GridError, HexIndex};
use crate::info_panel::{FetchTicket, InfoPanelController};
use crate::projection::{MapPoint, WORLD_M};
use crate::projector::project_cell;
use crate::selection::{Reconciled, SelectionController, Transition};
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig {
    /// Rebuilds whose estimated cell count exceeds this render nothing.
    pub max_cells: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            max_cells: MAX_RENDERED_CELLS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RebuildSummary {
    pub resolution: u8,
    pub cells: usize,
    /// Cells the index listed but whose geometry could not be built.
    pub skipped: usize,
    /// Set when the cell-count guard suppressed enumeration.
    pub capped: bool,
    pub selection: Reconciled,
}

struct Built {
    cells: Vec<GridCell>,
    skipped: usize,
    capped: bool,
}

pub struct HexGridLayer<I> {
    index: I,
    config: GridConfig,
    grid: GridRenderState,
    selection: SelectionController,
    panel: InfoPanelController,
}

impl<I: HexIndex> HexGridLayer<I> {
    pub fn new(index: I) -> Self {
        Self::with_config(index, GridConfig::default())
    }

    pub fn with_config(index: I, config: GridConfig) -> Self {
        Self {
            index,
            config,
            grid: GridRenderState::new(),
            selection: SelectionController::new(),
            panel: InfoPanelController::new(),
        }
    }

    #[cfg(test)]
    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn grid(&self) -> &GridRenderState {
        &self.grid
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn panel(&self) -> &InfoPanelController {
        &self.panel
    }

    /// Rebuild the grid for a settled viewport and re-attach the selection.
    pub fn on_view_change(&mut self, viewport: &Viewport) -> Result<RebuildSummary, GridError> {
        let resolution = resolution_for_zoom(viewport.zoom);
        let resolution_changed = self.grid.resolution().is_some_and(|r| r != resolution);

        self.panel.hide();

        let built = match self.build_cells(viewport, resolution) {
            Ok(built) => built,
            Err(err) => {
                tracing::warn!(resolution, error = %err, "cell enumeration failed");
                self.grid.replace(resolution, Vec::new());
                self.reconcile(resolution_changed);
                return Err(err);
            }
        };

        self.grid.replace(resolution, built.cells);
        let selection = self.reconcile(resolution_changed);

        tracing::debug!(
            resolution,
            rebuild = self.grid.rebuilds(),
            cells = self.grid.len(),
            skipped = built.skipped,
            capped = built.capped,
            "grid rebuilt"
        );

        Ok(RebuildSummary {
            resolution,
            cells: self.grid.len(),
            skipped: built.skipped,
            capped: built.capped,
            selection,
        })
    }

    fn build_cells(&self, viewport: &Viewport, resolution: u8) -> Result<Built, GridError> {
        let coverage = coverage_ring(&viewport.extent(), self.index.edge_length_m(resolution)?);

        let estimate = coverage.ground_area_m2 / self.index.cell_area_m2(resolution)?;
        if estimate > self.config.max_cells as f64 {
            tracing::warn!(
                resolution,
                estimate = estimate.round(),
                max = self.config.max_cells,
                "too many cells in view, grid hidden"
            );
            return Ok(Built {
                cells: Vec::new(),
                skipped: 0,
                capped: true,
            });
        }

        let ids = self.index.cells_covering(&coverage.ring, resolution)?;
        let mut cells = Vec::with_capacity(ids.len());
        let mut skipped = 0;
        for id in &ids {
            match project_cell(&self.index, id) {
                Ok(mut cell) => {
                    wrap_toward(&mut cell, viewport.center.x);
                    cells.push(cell);
                }
                Err(err) => {
                    skipped += 1;
                    tracing::warn!(cell = %id, error = %err, "skipping cell");
                }
            }
        }

        Ok(Built {
            cells,
            skipped,
            capped: false,
        })
    }

    fn reconcile(&mut self, resolution_changed: bool) -> Reconciled {
        let outcome = self.selection.reconcile(&mut self.grid, resolution_changed);
        match &outcome {
            Reconciled::Kept { interior, .. } => self.panel.reanchor(*interior),
            Reconciled::Cleared => self.panel.on_deselect(),
            Reconciled::Idle => {}
        }
        outcome
    }

    /// Hit-test a click in projected coordinates.
    pub fn on_click(&mut self, p: MapPoint) -> Option<FetchTicket> {
        let hit = self.grid.find_at(p).map(str::to_owned);
        self.on_click_hit(hit.as_deref())
    }

    /// Apply an already resolved hit. Ids outside the current set count as
    /// a miss.
    pub fn on_click_hit(&mut self, hit: Option<&str>) -> Option<FetchTicket> {
        let hit = hit.filter(|id| self.grid.contains(id));
        match self.selection.click(hit, &mut self.grid) {
            Transition::Selected {
                cell_id,
                generation,
            } => {
                let resolution = self.grid.resolution()?;
                Some(self.panel.on_select(&cell_id, resolution, generation))
            }
            Transition::Deselected => {
                self.panel.on_deselect();
                None
            }
            Transition::Unchanged => None,
        }
    }

    /// Deliver a fetch result. Returns whether it was applied.
    pub fn on_fetch_complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<ResourceInfo, FetchError>,
    ) -> bool {
        let current = self.selection.generation();
        let Some(anchor) = self.grid.get(&ticket.cell_id).map(|cell| cell.interior) else {
            tracing::debug!(cell = %ticket.cell_id, "cell info arrived for a cell no longer shown");
            return false;
        };
        self.panel.complete(ticket, current, anchor, result)
    }
}

/// Move a cell onto the world copy nearest `center_x`, so cells enumerated on
/// the far side of the antimeridian render next to the view.
fn wrap_toward(cell: &mut GridCell, center_x: f64) {
    let turns = ((center_x - cell.interior.x) / WORLD_M).round();
    if turns != 0.0 {
        cell.shift_x(turns * WORLD_M);
    }
}
