use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{CanvasRenderingContext2d, MouseEvent, PointerEvent, WheelEvent};

use crate::app::{ActivePanel, PanelView};
use crate::config::{CLICK_SLOP_PX, MOVE_END_DEBOUNCE_MS};
use crate::fetch::{HttpResourceClient, ResourceInfoSource};
use crate::hex_layer::HexGridLayer;
use crate::hexindex::H3Index;
use crate::info_panel::FetchTicket;
use crate::projection::MapPoint;
use crate::render_loop::FrameScheduler;
use crate::settings::ViewSettings;
use crate::viewport::Viewport;

const HEX_STROKE: &str = "#3399CC";
const HEX_FILL: &str = "rgba(51, 153, 204, 0.2)";
const HEX_LINE_WIDTH: f64 = 2.0;
const SELECTED_STROKE: &str = "#F5A623";
const SELECTED_FILL: &str = "rgba(245, 166, 35, 0.35)";
const SELECTED_LINE_WIDTH: f64 = 3.0;
const KEY_ZOOM_DELTA: f64 = 120.0;

type SharedLayer = Rc<RefCell<HexGridLayer<H3Index>>>;

struct WindowBinding {
    window: web_sys::Window,
    event: &'static str,
    handler: Closure<dyn Fn(web_sys::Event)>,
}

impl Drop for WindowBinding {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback(self.event, self.handler.as_ref().unchecked_ref());
    }
}

thread_local! {
    static RESIZE_BINDING: RefCell<Option<WindowBinding>> = const { RefCell::new(None) };
    static KEYDOWN_BINDING: RefCell<Option<WindowBinding>> = const { RefCell::new(None) };
}

fn bind_window(
    slot: &'static std::thread::LocalKey<RefCell<Option<WindowBinding>>>,
    event: &'static str,
    handler: impl Fn(web_sys::Event) + 'static,
) {
    // Replacing the old binding unregisters it.
    slot.with(|s| s.borrow_mut().take());
    let Some(window) = web_sys::window() else {
        return;
    };
    let handler = Closure::<dyn Fn(web_sys::Event)>::new(handler);
    if window
        .add_event_listener_with_callback(event, handler.as_ref().unchecked_ref())
        .is_ok()
    {
        slot.with(|s| {
            *s.borrow_mut() = Some(WindowBinding {
                window,
                event,
                handler,
            });
        });
    }
}

/// Push the layer's panel state into the signal the overlay renders from.
fn publish_panel(layer: &HexGridLayer<H3Index>, active: RwSignal<Option<PanelView>>) {
    let panel = layer.panel();
    let next = match (
        layer.selection().selected_id(),
        panel.anchor(),
        panel.content(),
    ) {
        (Some(cell_id), Some(anchor), Some(content)) => Some(PanelView {
            cell_id: cell_id.to_owned(),
            anchor,
            content: content.clone(),
        }),
        _ => None,
    };
    if active.with_untracked(|current| *current != next) {
        active.set(next);
    }
}

fn spawn_fetch(
    ticket: FetchTicket,
    layer: SharedLayer,
    client: HttpResourceClient,
    active: RwSignal<Option<PanelView>>,
) {
    wasm_bindgen_futures::spawn_local(async move {
        let result = client.fetch_info(&ticket.path).await;
        let applied = layer.borrow_mut().on_fetch_complete(&ticket, result);
        if applied {
            publish_panel(&layer.borrow(), active);
        }
    });
}

/// Move/zoom has settled: rebuild the grid for the current view.
fn settle_view(
    layer: &SharedLayer,
    viewport: RwSignal<Viewport>,
    active: RwSignal<Option<PanelView>>,
    scheduler: &FrameScheduler,
) {
    let vp = viewport.get_untracked();
    if let Ok(summary) = layer.borrow_mut().on_view_change(&vp) {
        tracing::debug!(
            zoom = vp.zoom,
            resolution = summary.resolution,
            cells = summary.cells,
            "view settled"
        );
    }
    ViewSettings::from_viewport(&vp).save();
    publish_panel(&layer.borrow(), active);
    scheduler.request();
}

fn trace_ring(ctx: &CanvasRenderingContext2d, vp: &Viewport, ring: &[MapPoint]) {
    ctx.begin_path();
    for (i, &p) in ring.iter().enumerate() {
        let (x, y) = vp.map_to_screen(p);
        if i == 0 {
            ctx.move_to(x, y);
        } else {
            ctx.line_to(x, y);
        }
    }
    ctx.close_path();
}

fn draw_frame(
    canvas_ref: NodeRef<leptos::html::Canvas>,
    viewport: RwSignal<Viewport>,
    layer: &RefCell<HexGridLayer<H3Index>>,
    ctx_cache: &RefCell<Option<CanvasRenderingContext2d>>,
) {
    let Some(canvas) = canvas_ref.get_untracked() else {
        return;
    };
    let Some(parent) = canvas.parent_element() else {
        return;
    };
    let css_w = parent.client_width().max(0) as f64;
    let css_h = parent.client_height().max(0) as f64;
    if css_w == 0.0 || css_h == 0.0 {
        return;
    }

    let dpr = web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
        .max(1.0);
    let pw = (css_w * dpr).round() as u32;
    let ph = (css_h * dpr).round() as u32;
    if canvas.width() != pw || canvas.height() != ph {
        canvas.set_width(pw);
        canvas.set_height(ph);
        *ctx_cache.borrow_mut() = None;
    }

    if viewport.with_untracked(|vp| vp.width != css_w || vp.height != css_h) {
        // Triggers a redraw and a rebuild through the viewport effect.
        viewport.update(|vp| vp.resize(css_w, css_h));
        return;
    }

    let ctx = {
        let mut cache = ctx_cache.borrow_mut();
        if cache.is_none() {
            *cache = canvas
                .get_context("2d")
                .ok()
                .flatten()
                .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok());
        }
        let Some(ctx) = cache.clone() else {
            return;
        };
        ctx
    };

    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0).ok();
    ctx.clear_rect(0.0, 0.0, css_w, css_h);

    let layer = layer.borrow();
    if layer.grid().is_empty() {
        return;
    }
    let vp = viewport.get_untracked();

    ctx.set_fill_style_str(HEX_FILL);
    ctx.set_stroke_style_str(HEX_STROKE);
    ctx.set_line_width(HEX_LINE_WIDTH);
    for cell in layer.grid().iter().filter(|c| !c.selected) {
        trace_ring(&ctx, &vp, &cell.boundary_render);
        ctx.fill();
        ctx.stroke();
    }

    // Selected cell last so its outline sits on top of its neighbours.
    ctx.set_fill_style_str(SELECTED_FILL);
    ctx.set_stroke_style_str(SELECTED_STROKE);
    ctx.set_line_width(SELECTED_LINE_WIDTH);
    for cell in layer.grid().iter().filter(|c| c.selected) {
        trace_ring(&ctx, &vp, &cell.boundary_render);
        ctx.fill();
        ctx.stroke();
    }
}

#[component]
pub fn MapCanvas() -> impl IntoView {
    let viewport: RwSignal<Viewport> = expect_context();
    let ActivePanel(active_panel) = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let layer: SharedLayer = Rc::new(RefCell::new(HexGridLayer::new(H3Index)));
    let client = HttpResourceClient::default();

    // Drag state
    let is_dragging = Rc::new(Cell::new(false));
    let drag_start = Rc::new(Cell::new((0.0f64, 0.0f64)));
    let last_pos = Rc::new(Cell::new((0.0f64, 0.0f64)));

    // Pending move-end rebuild; dropping the handle cancels it.
    let settle_timeout = Rc::new(RefCell::new(None::<Timeout>));

    let ctx_cache: Rc<RefCell<Option<CanvasRenderingContext2d>>> = Rc::new(RefCell::new(None));
    let scheduler = Rc::new(FrameScheduler::new({
        let layer = layer.clone();
        move || draw_frame(canvas_ref, viewport, &layer, &ctx_cache)
    }));

    // Every viewport change repaints now and rebuilds once movement settles.
    Effect::new({
        let layer = layer.clone();
        let scheduler = scheduler.clone();
        move || {
            viewport.track();
            scheduler.request();

            if let Some(timeout) = settle_timeout.borrow_mut().take() {
                timeout.cancel();
            }
            let timeout = Timeout::new(MOVE_END_DEBOUNCE_MS, {
                let layer = layer.clone();
                let scheduler = scheduler.clone();
                move || settle_view(&layer, viewport, active_panel, &scheduler)
            });
            *settle_timeout.borrow_mut() = Some(timeout);
        }
    });

    bind_window(&RESIZE_BINDING, "resize", {
        let scheduler = scheduler.clone();
        move |_| scheduler.request()
    });

    bind_window(&KEYDOWN_BINDING, "keydown", {
        let layer = layer.clone();
        let scheduler = scheduler.clone();
        move |e: web_sys::Event| {
            let Ok(e) = e.dyn_into::<web_sys::KeyboardEvent>() else {
                return;
            };
            match e.key().as_str() {
                "Escape" => {
                    layer.borrow_mut().on_click_hit(None);
                    publish_panel(&layer.borrow(), active_panel);
                    scheduler.request();
                }
                "+" | "=" => viewport.update(|vp| {
                    let (cx, cy) = (vp.width / 2.0, vp.height / 2.0);
                    vp.zoom_at(-KEY_ZOOM_DELTA, cx, cy);
                }),
                "-" => viewport.update(|vp| {
                    let (cx, cy) = (vp.width / 2.0, vp.height / 2.0);
                    vp.zoom_at(KEY_ZOOM_DELTA, cx, cy);
                }),
                _ => {}
            }
        }
    });

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        let delta = e.delta_y();
        let x = e.offset_x() as f64;
        let y = e.offset_y() as f64;
        viewport.update(|vp| vp.zoom_at(delta, x, y));
    };

    let on_pointer_down = {
        let is_dragging = is_dragging.clone();
        let drag_start = drag_start.clone();
        let last_pos = last_pos.clone();
        move |e: PointerEvent| {
            let pos = (e.client_x() as f64, e.client_y() as f64);
            is_dragging.set(true);
            drag_start.set(pos);
            last_pos.set(pos);

            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
                el.style().set_property("cursor", "grabbing").ok();
            }
        }
    };

    let on_pointer_move = {
        let is_dragging = is_dragging.clone();
        let last_pos = last_pos.clone();
        move |e: PointerEvent| {
            if !is_dragging.get() {
                return;
            }
            let (lx, ly) = last_pos.get();
            let (x, y) = (e.client_x() as f64, e.client_y() as f64);
            last_pos.set((x, y));
            viewport.update(|vp| vp.pan(x - lx, y - ly));
        }
    };

    let on_pointer_up = move |e: PointerEvent| {
        is_dragging.set(false);
        if let Some(target) = e.target()
            && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
        {
            el.style().set_property("cursor", "grab").ok();
        }
    };

    let on_click = move |e: MouseEvent| {
        let (sx, sy) = drag_start.get();
        let dx = (e.client_x() as f64 - sx).abs();
        let dy = (e.client_y() as f64 - sy).abs();
        if dx >= CLICK_SLOP_PX || dy >= CLICK_SLOP_PX {
            return;
        }
        let Some(canvas) = canvas_ref.get_untracked() else {
            return;
        };
        let rect = canvas.get_bounding_client_rect();
        let point = viewport.with_untracked(|vp| {
            vp.screen_to_map(
                e.client_x() as f64 - rect.left(),
                e.client_y() as f64 - rect.top(),
            )
        });

        let ticket = layer.borrow_mut().on_click(point);
        publish_panel(&layer.borrow(), active_panel);
        scheduler.request();
        if let Some(ticket) = ticket {
            spawn_fetch(ticket, layer.clone(), client.clone(), active_panel);
        }
    };

    view! {
        <div
            style="position: absolute; inset: 0; overflow: hidden;"
            on:wheel=on_wheel
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:click=on_click
        >
            <canvas
                node_ref=canvas_ref
                style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; cursor: grab;"
            />
        </div>
    }
}
