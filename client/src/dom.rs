use doodleguess_shared::{Extent, Point};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, MouseEvent, Window};

/// Horizontal room left around the canvas inside its container.
const CANVAS_MARGIN: f64 = 20.0;
const CANVAS_ASPECT: f64 = 0.6;

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

/// Canvas size for a container of the given CSS width.
pub fn canvas_extent(container_width: f64) -> Extent {
    let width = (container_width - CANVAS_MARGIN).max(0.0).floor();
    Extent::new(width, (width * CANVAS_ASPECT).floor())
}

pub fn container_extent(container: &Element) -> Extent {
    canvas_extent(container.client_width() as f64)
}

pub fn event_to_point(event: &MouseEvent) -> Point {
    Point::new(event.offset_x() as f64, event.offset_y() as f64)
}

pub fn set_text(element: &Element, text: &str) {
    element.set_text_content(Some(text));
}

pub fn redirect(window: &Window, route: &str) {
    if let Err(error) = window.location().set_href(route) {
        log::error!("redirect to {route} failed: {error:?}");
    }
}

pub fn debug_enabled(window: &Window) -> bool {
    let search = window.location().search().ok().unwrap_or_default();
    search.contains("debug=1") || search.contains("debug=true")
}
