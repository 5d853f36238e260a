use hexmap_shared::{ResourceInfo, polygon_info_path};

use crate::fetch::FetchError;
use crate::projection::MapPoint;

#[derive(Debug, Clone, PartialEq)]
pub enum PanelContent {
    Loaded(ResourceInfo),
    Unavailable,
}

/// An in-flight info request. Only applied if `generation` is still current
/// when the response arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub cell_id: String,
    pub resolution: u8,
    pub path: String,
}

/// Floating panel for the selected cell: what it shows and where.
#[derive(Debug, Default)]
pub struct InfoPanelController {
    content: Option<PanelContent>,
    anchor: Option<MapPoint>,
    pending: Option<FetchTicket>,
}

impl InfoPanelController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self) -> Option<&PanelContent> {
        self.content.as_ref()
    }

    pub fn anchor(&self) -> Option<MapPoint> {
        self.anchor
    }

    #[cfg(test)]
    pub fn pending(&self) -> Option<&FetchTicket> {
        self.pending.as_ref()
    }

    #[cfg(test)]
    pub fn is_visible(&self) -> bool {
        self.anchor.is_some() && self.content.is_some()
    }

    pub fn on_select(&mut self, cell_id: &str, resolution: u8, generation: u64) -> FetchTicket {
        self.content = None;
        self.anchor = None;
        let ticket = FetchTicket {
            generation,
            cell_id: cell_id.to_owned(),
            resolution,
            path: polygon_info_path(resolution, cell_id),
        };
        tracing::debug!(cell = cell_id, resolution, generation, "requesting cell info");
        self.pending = Some(ticket.clone());
        ticket
    }

    pub fn on_deselect(&mut self) {
        self.content = None;
        self.anchor = None;
        self.pending = None;
    }

    /// Hide without forgetting content; used around rebuilds.
    pub fn hide(&mut self) {
        self.anchor = None;
    }

    pub fn reanchor(&mut self, point: MapPoint) {
        if self.content.is_some() {
            self.anchor = Some(point);
        }
    }

    /// Apply a finished request. Returns `false` when the ticket is stale or
    /// no longer awaited.
    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        current_generation: u64,
        anchor: MapPoint,
        result: Result<ResourceInfo, FetchError>,
    ) -> bool {
        let awaited = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.generation == ticket.generation);
        if ticket.generation != current_generation || !awaited {
            tracing::debug!(
                cell = %ticket.cell_id,
                ticket = ticket.generation,
                current = current_generation,
                "discarding stale cell info"
            );
            return false;
        }

        self.content = Some(match result {
            Ok(info) => PanelContent::Loaded(info),
            Err(err) => {
                tracing::warn!(cell = %ticket.cell_id, error = %err, "cell info unavailable");
                PanelContent::Unavailable
            }
        });
        self.anchor = Some(anchor);
        self.pending = None;
        true
    }
}
