use dioxus::html::geometry::WheelDelta;
use dioxus::html::input_data::MouseButton;
use dioxus::logger::tracing;
use dioxus::prelude::*;
use wasm_bindgen::JsCast;

use battle_tracker_shared::models::Position;

use crate::scene::{self, Scene};

const MAP_CONTAINER_ID: &str = "tracker-map-container";
const MAP_IMAGE_ID: &str = "tracker-map-image";

/// Drag threshold in pixels; smaller movements don't pan.
const DRAG_THRESHOLD: f64 = 3.0;

const ZOOM_MIN: f64 = 1.0;
const ZOOM_MAX: f64 = 20.0;
const ZOOM_STEP: f64 = 1.1;

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

fn container_rect() -> Option<web_sys::DomRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(MAP_CONTAINER_ID)?;
    Some(element.get_bounding_client_rect())
}

fn map_image() -> Option<web_sys::HtmlImageElement> {
    let document = web_sys::window()?.document()?;
    document
        .get_element_by_id(MAP_IMAGE_ID)?
        .dyn_into::<web_sys::HtmlImageElement>()
        .ok()
}

/// Natural pixel size of the map image, once it has decoded.
fn loaded_map_size() -> Option<(f64, f64)> {
    let img = map_image()?;
    if !img.complete() || img.natural_width() == 0 {
        return None;
    }
    Some((img.natural_width() as f64, img.natural_height() as f64))
}

// ---------------------------------------------------------------------------
// Zoom / pan math
// ---------------------------------------------------------------------------

/// Pan offsets that keep `cursor` over the same content point across a zoom change.
fn zoom_pan_at_cursor(
    cursor_x: f64,
    cursor_y: f64,
    old_zoom: f64,
    new_zoom: f64,
    old_pan_x: f64,
    old_pan_y: f64,
) -> (f64, f64) {
    let content_x = (cursor_x - old_pan_x) / old_zoom;
    let content_y = (cursor_y - old_pan_y) / old_zoom;
    (
        cursor_x - content_x * new_zoom,
        cursor_y - content_y * new_zoom,
    )
}

/// Clamp pan values so the map can't be dragged off-screen.
///
/// The image renders at `width: 100%`, so its height is `container_w * aspect`
/// where `aspect` is the map's height over width.
fn clamp_pan(
    pan_x: f64,
    pan_y: f64,
    zoom: f64,
    container_w: f64,
    container_h: f64,
    aspect: f64,
) -> (f64, f64) {
    let content_w = container_w * zoom;
    let content_h = container_w * aspect * zoom;
    let min_pan_x = -(content_w - container_w).max(0.0);
    let min_pan_y = -(content_h - container_h).max(0.0);
    (pan_x.clamp(min_pan_x, 0.0), pan_y.clamp(min_pan_y, 0.0))
}

fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

fn aspect_of(size: Option<(f64, f64)>) -> f64 {
    match size {
        Some((w, h)) if w > 0.0 => h / w,
        _ => 1.0,
    }
}

/// Map image with the unit icon layer, wheel zoom and drag panning.
///
/// `on_map_loaded` receives the image's natural size once it has loaded; the
/// icon layer uses that size as its coordinate space.
#[component]
pub fn MapView(
    map_image_url: String,
    icon_base_url: String,
    scene: Signal<Scene>,
    medics: Signal<Vec<Position>>,
    map_size: Signal<Option<(f64, f64)>>,
    on_map_loaded: EventHandler<(f64, f64)>,
) -> Element {
    let mut zoom = use_signal(|| 1.0_f64);
    let mut pan_x = use_signal(|| 0.0_f64);
    let mut pan_y = use_signal(|| 0.0_f64);

    let mut is_dragging = use_signal(|| false);
    let mut did_drag = use_signal(|| false);
    let mut drag_start_x = use_signal(|| 0.0_f64);
    let mut drag_start_y = use_signal(|| 0.0_f64);
    let mut drag_start_pan_x = use_signal(|| 0.0_f64);
    let mut drag_start_pan_y = use_signal(|| 0.0_f64);

    // Pan and zoom are read outside this memo so they don't rebuild the SVG.
    let svg_html = use_memo(move || {
        let Some((w, h)) = *map_size.read() else {
            return String::new();
        };
        let content = scene::build_svg_content(&scene.read(), &medics.read(), &icon_base_url, w);
        scene::build_svg(&content, w, h)
    });

    let clamp_to_container = move |px: f64, py: f64, z: f64| -> (f64, f64) {
        match container_rect() {
            Some(rect) => clamp_pan(px, py, z, rect.width(), rect.height(), aspect_of(*map_size.read())),
            None => (px, py),
        }
    };

    let cur_pan_x = *pan_x.read();
    let cur_pan_y = *pan_y.read();
    let cur_zoom = *zoom.read();
    let transform_style = format!(
        "transform: translate({cur_pan_x}px, {cur_pan_y}px) scale({cur_zoom}); transform-origin: 0 0;"
    );
    let container_class = if *is_dragging.read() {
        "map-container dragging"
    } else {
        "map-container"
    };

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "{container_class}",

            onwheel: move |evt: Event<WheelData>| {
                evt.prevent_default();

                let delta_y = wheel_delta_y(evt.data().delta());
                let factor = if delta_y < 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
                let old_z = *zoom.read();
                let new_z = (old_z * factor).clamp(ZOOM_MIN, ZOOM_MAX);
                if (new_z - old_z).abs() < 1e-9 {
                    return;
                }

                let Some(rect) = container_rect() else { return };
                let client = evt.data().client_coordinates();
                let cx = client.x - rect.left();
                let cy = client.y - rect.top();

                let (new_px, new_py) =
                    zoom_pan_at_cursor(cx, cy, old_z, new_z, *pan_x.read(), *pan_y.read());
                let (px, py) = clamp_pan(
                    new_px,
                    new_py,
                    new_z,
                    rect.width(),
                    rect.height(),
                    aspect_of(*map_size.read()),
                );

                zoom.set(new_z);
                pan_x.set(px);
                pan_y.set(py);
            },

            onmousedown: move |evt: Event<MouseData>| {
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                let client = evt.client_coordinates();
                is_dragging.set(true);
                did_drag.set(false);
                drag_start_x.set(client.x);
                drag_start_y.set(client.y);
                drag_start_pan_x.set(*pan_x.read());
                drag_start_pan_y.set(*pan_y.read());
            },

            onmousemove: move |evt: Event<MouseData>| {
                if !*is_dragging.read() {
                    return;
                }
                let client = evt.client_coordinates();
                let dx = client.x - *drag_start_x.read();
                let dy = client.y - *drag_start_y.read();

                if !*did_drag.read() && (dx.abs() > DRAG_THRESHOLD || dy.abs() > DRAG_THRESHOLD) {
                    did_drag.set(true);
                }
                if *did_drag.read() {
                    let (px, py) = clamp_to_container(
                        *drag_start_pan_x.read() + dx,
                        *drag_start_pan_y.read() + dy,
                        *zoom.read(),
                    );
                    pan_x.set(px);
                    pan_y.set(py);
                }
            },

            onmouseup: move |_| is_dragging.set(false),
            onmouseleave: move |_| is_dragging.set(false),

            ondoubleclick: move |evt: Event<MouseData>| {
                evt.prevent_default();
                zoom.set(1.0);
                pan_x.set(0.0);
                pan_y.set(0.0);
            },

            // CSS transform applies zoom/pan to map + icon layer together
            div {
                class: "map-inner",
                style: "{transform_style}",

                img {
                    id: MAP_IMAGE_ID,
                    src: "{map_image_url}",
                    draggable: "false",
                    onload: move |_| match loaded_map_size() {
                        Some(size) => on_map_loaded.call(size),
                        None => tracing::warn!("Map image loaded without a usable size"),
                    },
                    // A cached image can finish before the load listener exists.
                    onmounted: move |_| {
                        if let Some(size) = loaded_map_size() {
                            on_map_loaded.call(size);
                        }
                    },
                    onerror: move |_| tracing::warn!("Map image failed to load"),
                }

                div {
                    dangerous_inner_html: "{svg_html}",
                    style: "position:absolute;top:0;left:0;width:100%;height:100%;pointer-events:none;",
                }
            }
        }
    }
}
