// Browser tests for the canvas surface. Run with `wasm-pack test --headless --firefox`.
#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::HtmlCanvasElement;
use word_rain::surface::Surface;
use word_rain::web::canvas::CanvasSurface;
use word_rain::{ImageHandle, ImageStatus};

wasm_bindgen_test_configure!(run_in_browser);

fn canvas() -> HtmlCanvasElement {
    let doc = web_sys::window().unwrap().document().unwrap();
    doc.create_element("canvas").unwrap().dyn_into().unwrap()
}

#[wasm_bindgen_test]
fn surface_tracks_canvas_size() {
    let surface = CanvasSurface::new(canvas()).unwrap();
    surface.resize(320, 240);
    assert_eq!(surface.width(), 320.0);
    assert_eq!(surface.height(), 240.0);
}

#[wasm_bindgen_test]
fn unknown_image_is_not_drawn() {
    let mut surface = CanvasSurface::new(canvas()).unwrap();
    assert!(!surface.draw_image("images/capitals/XX.png", 0.0, 0.0, 10.0, 10.0));
}

#[wasm_bindgen_test]
fn pending_image_is_not_drawn() {
    let mut surface = CanvasSurface::new(canvas()).unwrap();
    let handle = ImageHandle::new("images/capitals/does-not-exist.png");
    surface.images.ensure(&handle);
    assert_eq!(handle.status(), ImageStatus::Loading);
    assert!(!surface.draw_image(&handle.src, 0.0, 0.0, 10.0, 10.0));
}
