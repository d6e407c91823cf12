use console_error_panic_hook::set_once;
use foundation::LayerId;
use layers::{LayerRegistry, barcelona};
use map::MapEvent;
use serde::Serialize;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use viewer::controls::layer_from_checkbox_id;
use viewer::fetch::SourceFetcher;
use viewer::{Viewer, ViewerConfig};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

mod dom;
mod fetch;
mod maplibre;

use fetch::GlooFetcher;
use maplibre::MapLibreMap;

/// A `setInterval` registration; cleared on cancel or drop.
struct Interval {
    handle: Option<i32>,
    _callback: Closure<dyn FnMut()>,
}

impl Interval {
    fn new(period_ms: f64, callback: impl FnMut() + 'static) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let callback = Closure::<dyn FnMut()>::new(callback);
        let handle = window.set_interval_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            period_ms.round() as i32,
        )?;
        Ok(Self {
            handle: Some(handle),
            _callback: callback,
        })
    }

    fn cancel(&mut self) {
        if let (Some(handle), Some(window)) = (self.handle.take(), web_sys::window()) {
            window.clear_interval_with_handle(handle);
        }
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct App {
    viewer: Viewer,
    map: MapLibreMap,
    slider_timer: Option<Interval>,
}

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Runs `f` against the live app. Events that arrive before `init` or
/// while another handler holds the app are dropped.
fn with_app<R>(f: impl FnOnce(&mut App) -> R) -> Option<R> {
    APP.with(|app| match app.try_borrow_mut() {
        Ok(mut guard) => guard.as_mut().map(f),
        Err(_) => {
            log("viewer busy, event dropped");
            None
        }
    })
}

fn report<E: std::fmt::Display>(context: &str, result: Option<Result<(), E>>) {
    if let Some(Err(err)) = result {
        log(&format!("{context}: {err}"));
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

/// Creates the map and the side panels. Either argument may carry a JSON
/// document replacing the built-in Barcelona setup.
#[wasm_bindgen]
pub fn init(config_json: Option<String>, registry_json: Option<String>) -> Result<(), JsValue> {
    let config = match config_json {
        Some(src) => ViewerConfig::from_json_str(&src).map_err(js_error)?,
        None => ViewerConfig::barcelona(),
    };
    let registry = match registry_json {
        Some(src) => LayerRegistry::from_json_str(&src),
        None => barcelona::registry(),
    }
    .map_err(js_error)?;
    let viewer = Viewer::new(config, registry).map_err(js_error)?;

    let blank = json!({ "version": 8, "sources": {}, "layers": [] });
    let mut map = MapLibreMap::new(&viewer.config().map, &blank, on_pointer, toggle_rotation)?;
    map.on_map_event("load", Closure::new(|_: JsValue| on_load()));
    for kind in ["mousedown", "touchstart"] {
        map.on_map_event(
            kind,
            Closure::new(|_: JsValue| {
                with_app(|app| app.viewer.pointer_down());
            }),
        );
    }
    for kind in ["mouseup", "touchend"] {
        map.on_map_event(
            kind,
            Closure::new(|_: JsValue| {
                with_app(|app| app.viewer.pointer_up());
            }),
        );
    }

    dom::build_panels(&viewer)?;
    APP.with(|app| {
        *app.borrow_mut() = Some(App {
            viewer,
            map,
            slider_timer: None,
        })
    });
    Ok(())
}

fn on_load() {
    let Some(started) = with_app(|app| {
        app.viewer.start(&mut app.map)?;
        let ids: Vec<LayerId> = app.viewer.registry().iter().map(|d| d.id().clone()).collect();
        Ok::<_, viewer::ViewerError>((app.viewer.config().data_url.clone(), ids))
    }) else {
        return;
    };
    let (base, ids) = match started {
        Ok(started) => started,
        Err(err) => {
            log(&format!("map start failed: {err}"));
            return;
        }
    };

    // One task per layer so each is placed as soon as its data lands.
    let fetcher = Rc::new(GlooFetcher::new(base));
    for id in ids {
        let fetcher = Rc::clone(&fetcher);
        spawn_local(async move {
            let result = fetcher.fetch(&id).await;
            let outcome = with_app(|app| {
                app.viewer
                    .on_source_loaded(&mut app.map, &id, result)
                    .map(|_| ())
            });
            report(&format!("loading {id}"), outcome);
        });
    }
}

fn on_pointer(kind: MapEvent, layer: &LayerId, event: &JsValue) {
    let event = match maplibre::pointer_event(kind, layer, event) {
        Ok(event) => event,
        Err(err) => {
            log(&format!("unreadable {} event on {layer}: {err:?}", kind.as_str()));
            return;
        }
    };
    let handled = with_app(|app| app.viewer.handle_pointer(&mut app.map, &event).map(|_| ()));
    report("pointer", handled);
}

fn viewport_width() -> f64 {
    web_sys::window()
        .and_then(|w| w.inner_width().ok())
        .and_then(|w| w.as_f64())
        .unwrap_or(0.0)
}

#[wasm_bindgen]
pub fn toggle_rotation() {
    let width = viewport_width();
    with_app(|app| {
        let icon = app.viewer.toggle_rotation(&mut app.map, width);
        app.map.set_rotation_icon(&icon);
    });
}

/// Layer checkbox change, by element id (`checkbox-<layer>`).
#[wasm_bindgen]
pub fn set_layer_visible(checkbox_id: &str, checked: bool) {
    let Some(id) = layer_from_checkbox_id(checkbox_id) else {
        log(&format!("not a layer checkbox: {checkbox_id}"));
        return;
    };
    let result = with_app(|app| app.viewer.set_layer_visible(&mut app.map, &id, checked));
    report("visibility", result);
}

#[wasm_bindgen]
pub fn toggle_category(checkbox_id: &str, checked: bool) {
    let result = with_app(|app| {
        let applied = app.viewer.toggle_category(&mut app.map, checkbox_id, checked);
        dom::show_categories(app.viewer.categories());
        applied.map(|_| ())
    });
    report("category filter", result);
}

#[wasm_bindgen]
pub fn play_slider() {
    with_app(|app| {
        if !app.viewer.play() {
            return;
        }
        let period = app.viewer.config().slider.tick_ms;
        match Interval::new(period, move || on_slider_tick(period)) {
            Ok(timer) => app.slider_timer = Some(timer),
            Err(err) => {
                log(&format!("cannot start the slider: {err:?}"));
                app.viewer.stop_slider();
            }
        }
        dom::show_slider(app.viewer.slider());
    });
}

#[wasm_bindgen]
pub fn stop_slider() {
    with_app(|app| {
        app.viewer.stop_slider();
        if let Some(timer) = &mut app.slider_timer {
            timer.cancel();
        }
        dom::show_slider(app.viewer.slider());
    });
}

fn on_slider_tick(period_ms: f64) {
    let result = with_app(|app| {
        let ticked = app.viewer.tick(&mut app.map, period_ms);
        if !app.viewer.slider().is_playing() {
            // Dropped on the next play, never from inside its own callback.
            if let Some(timer) = &mut app.slider_timer {
                timer.cancel();
            }
        }
        dom::show_slider(app.viewer.slider());
        ticked
    });
    report("slider", result);
}

#[wasm_bindgen]
pub fn set_slider_value(value: u32) {
    let result = with_app(|app| {
        let moved = app.viewer.drag_slider(&mut app.map, value);
        dom::show_slider(app.viewer.slider());
        moved.map(|_| ())
    });
    report("slider", result);
}

/// Date input change with the raw `YYYY-MM-DD` values.
#[wasm_bindgen]
pub fn set_date_range(start: &str, end: &str) {
    let result = with_app(|app| {
        app.viewer
            .set_date_range(&mut app.map, start, end)
            .map(|update| dom::show_date_range(&update))
    });
    report("date range", result);
}

/// Collapses or expands the side panels.
#[wasm_bindgen]
pub fn toggle_panels(
    panel_ids: Vec<String>,
    toggle_id: &str,
    opened: &str,
    closed: &str,
    class: &str,
) -> Result<(), JsValue> {
    dom::toggle_panels(&panel_ids, toggle_id, opened, closed, class)
}

#[derive(Serialize)]
struct EventRecord {
    frame: u64,
    kind: &'static str,
    message: String,
}

/// Viewer events since the last call, as a JSON array.
#[wasm_bindgen]
pub fn drain_events() -> String {
    let events: Vec<EventRecord> = with_app(|app| app.viewer.drain_events())
        .unwrap_or_default()
        .into_iter()
        .map(|e| EventRecord {
            frame: e.frame_index,
            kind: e.kind,
            message: e.message,
        })
        .collect();
    serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string())
}
