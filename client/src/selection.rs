use crate::grid::GridRenderState;
use crate::projection::MapPoint;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Unselected,
    Selected(String),
}

/// Outcome of a click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Entered `Selected`; info for `cell_id` should be fetched under `generation`.
    Selected { cell_id: String, generation: u64 },
    Deselected,
    Unchanged,
}

/// Outcome of reconciling the selection with a freshly rebuilt grid.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciled {
    /// Nothing was selected.
    Idle,
    /// The selected cell is still on screen; its new interior point is given.
    Kept { cell_id: String, interior: MapPoint },
    /// The selected cell is gone (or the resolution changed) and was dropped.
    Cleared,
}

/// Single-selection state machine keyed by cell id.
///
/// Every entry into either state bumps `generation`, so a fetch issued for an
/// earlier selection can be recognised as stale when it completes.
#[derive(Debug, Default)]
pub struct SelectionController {
    state: SelectionState,
    generation: u64,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn selected_id(&self) -> Option<&str> {
        match &self.state {
            SelectionState::Selected(id) => Some(id.as_str()),
            SelectionState::Unselected => None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Apply a click. `hit` is the id under the pointer, `None` for a miss.
    pub fn click(&mut self, hit: Option<&str>, grid: &mut GridRenderState) -> Transition {
        let had_selection = self.selected_id().is_some();
        let same_cell = hit.is_some() && hit == self.selected_id();

        match hit {
            Some(_) if same_cell => self.deselect(grid),
            Some(id) => self.select(id, grid),
            None if had_selection => self.deselect(grid),
            None => {
                // Nothing selected, but sweep any leftover flags anyway.
                grid.mark_selected(None);
                Transition::Unchanged
            }
        }
    }

    /// Re-locate the selected cell in a rebuilt grid.
    ///
    /// A resolution change always clears: cell ids are resolution-scoped.
    pub fn reconcile(
        &mut self,
        grid: &mut GridRenderState,
        resolution_changed: bool,
    ) -> Reconciled {
        let Some(id) = self.selected_id().map(str::to_owned) else {
            grid.mark_selected(None);
            return Reconciled::Idle;
        };

        if !resolution_changed && grid.mark_selected(Some(&id)) {
            if let Some(cell) = grid.get(&id) {
                return Reconciled::Kept {
                    interior: cell.interior,
                    cell_id: id,
                };
            }
        }

        self.deselect(grid);
        Reconciled::Cleared
    }

    fn select(&mut self, id: &str, grid: &mut GridRenderState) -> Transition {
        self.generation += 1;
        self.state = SelectionState::Selected(id.to_owned());
        grid.mark_selected(Some(id));
        Transition::Selected {
            cell_id: id.to_owned(),
            generation: self.generation,
        }
    }

    fn deselect(&mut self, grid: &mut GridRenderState) -> Transition {
        self.generation += 1;
        self.state = SelectionState::Unselected;
        grid.mark_selected(None);
        Transition::Deselected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::tests::square_cell;

    fn grid_with(ids: &[&str]) -> GridRenderState {
        let mut grid = GridRenderState::new();
        let cells = ids
            .iter()
            .enumerate()
            .map(|(i, id)| square_cell(id, i as f64 * 10.0, 0.0, 1.0))
            .collect();
        grid.replace(7, cells);
        grid
    }

    fn is_selected(grid: &GridRenderState, id: &str) -> bool {
        grid.get(id).is_some_and(|c| c.selected)
    }

    #[test]
    fn starts_unselected() {
        let controller = SelectionController::new();
        assert_eq!(controller.state(), &SelectionState::Unselected);
        assert_eq!(controller.generation(), 0);
    }

    #[test]
    fn clicking_same_cell_twice_toggles_back_to_unselected() {
        let mut grid = grid_with(&["a", "b"]);
        let mut controller = SelectionController::new();

        let first = controller.click(Some("a"), &mut grid);
        assert_eq!(
            first,
            Transition::Selected {
                cell_id: "a".into(),
                generation: 1
            }
        );
        assert!(is_selected(&grid, "a"));

        assert_eq!(controller.click(Some("a"), &mut grid), Transition::Deselected);
        assert_eq!(controller.state(), &SelectionState::Unselected);
        assert_eq!(grid.selected_count(), 0);
    }

    #[test]
    fn clicking_other_cell_moves_selection_exclusively() {
        let mut grid = grid_with(&["a", "b"]);
        let mut controller = SelectionController::new();

        controller.click(Some("a"), &mut grid);
        let second = controller.click(Some("b"), &mut grid);

        assert!(matches!(second, Transition::Selected { ref cell_id, generation: 2 } if cell_id == "b"));
        assert!(!is_selected(&grid, "a"));
        assert!(is_selected(&grid, "b"));
        assert_eq!(grid.selected_count(), 1);
    }

    #[test]
    fn switching_after_rebuild_resets_previous_cell_by_id() {
        let mut grid = grid_with(&["a", "b"]);
        let mut controller = SelectionController::new();
        controller.click(Some("a"), &mut grid);

        // Fresh cell objects for the same ids.
        grid = grid_with(&["a", "b"]);
        controller.reconcile(&mut grid, false);
        controller.click(Some("b"), &mut grid);

        assert!(!is_selected(&grid, "a"));
        assert!(is_selected(&grid, "b"));
    }

    #[test]
    fn miss_clears_selection() {
        let mut grid = grid_with(&["a"]);
        let mut controller = SelectionController::new();
        controller.click(Some("a"), &mut grid);

        assert_eq!(controller.click(None, &mut grid), Transition::Deselected);
        assert_eq!(grid.selected_count(), 0);
        assert_eq!(controller.click(None, &mut grid), Transition::Unchanged);
    }

    #[test]
    fn every_transition_bumps_generation() {
        let mut grid = grid_with(&["a", "b"]);
        let mut controller = SelectionController::new();
        controller.click(Some("a"), &mut grid);
        controller.click(Some("a"), &mut grid);
        controller.click(Some("a"), &mut grid);
        assert_eq!(controller.generation(), 3);
        controller.click(None, &mut grid);
        controller.click(None, &mut grid);
        assert_eq!(controller.generation(), 4);
    }

    #[test]
    fn reconcile_keeps_cell_still_on_screen() {
        let mut grid = grid_with(&["a", "b"]);
        let mut controller = SelectionController::new();
        controller.click(Some("b"), &mut grid);
        let generation = controller.generation();

        let mut rebuilt = GridRenderState::new();
        rebuilt.replace(7, vec![square_cell("b", 100.0, 50.0, 1.0)]);
        let outcome = controller.reconcile(&mut rebuilt, false);

        assert_eq!(
            outcome,
            Reconciled::Kept {
                cell_id: "b".into(),
                interior: MapPoint::new(100.0, 50.0)
            }
        );
        assert!(is_selected(&rebuilt, "b"));
        assert_eq!(controller.generation(), generation);
    }

    #[test]
    fn reconcile_clears_cell_that_scrolled_away() {
        let mut grid = grid_with(&["a"]);
        let mut controller = SelectionController::new();
        controller.click(Some("a"), &mut grid);

        let mut rebuilt = grid_with(&["c"]);
        assert_eq!(controller.reconcile(&mut rebuilt, false), Reconciled::Cleared);
        assert_eq!(controller.state(), &SelectionState::Unselected);
        assert_eq!(rebuilt.selected_count(), 0);
    }

    #[test]
    fn reconcile_clears_on_resolution_change_even_if_id_present() {
        let mut grid = grid_with(&["a"]);
        let mut controller = SelectionController::new();
        controller.click(Some("a"), &mut grid);

        let mut rebuilt = grid_with(&["a"]);
        assert_eq!(controller.reconcile(&mut rebuilt, true), Reconciled::Cleared);
        assert_eq!(rebuilt.selected_count(), 0);
    }

    #[test]
    fn reconcile_without_selection_is_idle() {
        let mut grid = grid_with(&["a"]);
        let mut controller = SelectionController::new();
        assert_eq!(controller.reconcile(&mut grid, true), Reconciled::Idle);
        assert_eq!(controller.generation(), 0);
    }
}
