use leptos::prelude::*;

use hexmap_shared::{format_amount, resolution_for_zoom};

use crate::canvas::MapCanvas;
use crate::fetch::{HttpResourceClient, ResourceInfoSource};
use crate::info_panel::PanelContent;
use crate::projection::MapPoint;
use crate::settings::ViewSettings;
use crate::viewport::Viewport;

/// What the floating panel shows, anchored in map coordinates so it follows
/// the map while panning.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PanelView {
    pub cell_id: String,
    pub anchor: MapPoint,
    pub content: PanelContent,
}

#[derive(Clone, Copy)]
pub(crate) struct ActivePanel(pub RwSignal<Option<PanelView>>);

const PANEL_STYLE: &str = "position: absolute; transform: translate(-50%, calc(-100% - 14px)); \
    min-width: 150px; padding: 8px 12px; border-radius: 6px; pointer-events: none; \
    background: rgba(255, 255, 255, 0.96); box-shadow: 0 2px 10px rgba(0, 0, 0, 0.25); \
    font: 13px/1.5 system-ui, sans-serif; color: #1d2733;";

const BADGE_STYLE: &str = "position: absolute; left: 10px; bottom: 10px; padding: 2px 8px; \
    border-radius: 4px; background: rgba(29, 39, 51, 0.7); color: #fff; \
    font: 12px system-ui, sans-serif; pointer-events: none;";

#[component]
pub fn App() -> impl IntoView {
    let mut initial = Viewport::default();
    ViewSettings::load().apply_to(&mut initial);
    let viewport: RwSignal<Viewport> = RwSignal::new(initial);
    let active_panel: RwSignal<Option<PanelView>> = RwSignal::new(None);
    provide_context(viewport);
    provide_context(ActivePanel(active_panel));

    // Diagnostic preload of the known-cell listing.
    wasm_bindgen_futures::spawn_local(async move {
        match HttpResourceClient::default().fetch_polygons().await {
            Ok(records) => tracing::info!(count = records.len(), "polygon listing loaded"),
            Err(err) => tracing::warn!(error = %err, "polygon listing unavailable"),
        }
    });

    view! {
        <div style="position: relative; width: 100%; height: 100%; overflow: hidden; background: #eef1f4;">
            <MapCanvas />
            <InfoPanel />
            <ZoomBadge />
        </div>
    }
}

#[component]
fn InfoPanel() -> impl IntoView {
    let viewport: RwSignal<Viewport> = expect_context();
    let ActivePanel(active) = expect_context();

    move || {
        active.get().map(|panel| {
            let anchor = panel.anchor;
            let style = move || {
                let (x, y) = viewport.with(|vp| vp.map_to_screen(anchor));
                format!("{PANEL_STYLE} left: {x:.0}px; top: {y:.0}px;")
            };
            let body = match panel.content {
                PanelContent::Loaded(info) => view! {
                    <ResourceRow label="Gold" amount=info.gold />
                    <ResourceRow label="Wood" amount=info.wood />
                    <ResourceRow label="Ore" amount=info.ore />
                }
                .into_any(),
                PanelContent::Unavailable => view! {
                    <div style="color: #9a3b2e;">"Resource data unavailable"</div>
                }
                .into_any(),
            };
            view! {
                <div class="hex-info" style=style>
                    <div style="font-weight: 600; font-family: ui-monospace, monospace; margin-bottom: 4px;">
                        {panel.cell_id}
                    </div>
                    {body}
                </div>
            }
        })
    }
}

#[component]
fn ResourceRow(label: &'static str, amount: f64) -> impl IntoView {
    view! {
        <div style="display: flex; justify-content: space-between; gap: 16px;">
            <span>{label}</span>
            <span style="font-variant-numeric: tabular-nums;">{format_amount(amount)}</span>
        </div>
    }
}

#[component]
fn ZoomBadge() -> impl IntoView {
    let viewport: RwSignal<Viewport> = expect_context();
    let label = move || {
        let zoom = viewport.with(|vp| vp.zoom);
        format!("zoom {zoom:.1} / res {}", resolution_for_zoom(zoom))
    };

    view! {
        <div style=BADGE_STYLE>
            {label}
        </div>
    }
}
