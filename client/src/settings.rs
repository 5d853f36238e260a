use gloo_storage::Storage;
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_CENTER, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM, VIEW_SETTINGS_KEY};
use crate::projection::{HALF_WORLD_M, MapPoint};
use crate::viewport::Viewport;

/// Last view, persisted so a reload resumes where the user left off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub center_x: f64,
    pub center_y: f64,
    pub zoom: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            center_x: DEFAULT_CENTER.x,
            center_y: DEFAULT_CENTER.y,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl ViewSettings {
    pub fn from_viewport(vp: &Viewport) -> Self {
        Self {
            center_x: vp.center.x,
            center_y: vp.center.y,
            zoom: vp.zoom,
        }
    }

    /// Copy the saved view onto `vp`, ignoring anything non-finite.
    pub fn apply_to(&self, vp: &mut Viewport) {
        if self.center_x.is_finite() && self.center_y.is_finite() {
            vp.center = MapPoint::new(
                self.center_x.clamp(-HALF_WORLD_M, HALF_WORLD_M),
                self.center_y.clamp(-HALF_WORLD_M, HALF_WORLD_M),
            );
        }
        if self.zoom.is_finite() {
            vp.zoom = self.zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn load() -> Self {
        gloo_storage::LocalStorage::get(VIEW_SETTINGS_KEY).unwrap_or_default()
    }

    pub fn save(&self) {
        if let Err(err) = gloo_storage::LocalStorage::set(VIEW_SETTINGS_KEY, self) {
            tracing::debug!(error = %err, "could not persist view");
        }
    }
}
