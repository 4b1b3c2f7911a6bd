#![cfg(target_arch = "wasm32")]

use backdrop_viz::wasm::{
    clear_visualization, init_visualization, is_visualization_active, stop_visualization,
    visualization_kinds, Visualization,
};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn add_canvas(id: &str) -> web_sys::HtmlCanvasElement {
    let document = web_sys::window().unwrap().document().unwrap();
    let canvas: web_sys::HtmlCanvasElement = document
        .create_element("canvas")
        .unwrap()
        .dyn_into()
        .unwrap();
    canvas.set_id(id);
    canvas.set_width(320);
    canvas.set_height(240);
    document.body().unwrap().append_child(&canvas).unwrap();
    canvas
}

#[wasm_bindgen_test]
fn missing_canvas_is_a_no_op() {
    init_visualization("birds").unwrap();
    assert!(!is_visualization_active("birds").unwrap());
    stop_visualization("birds").unwrap();
    clear_visualization("birds").unwrap();
}

#[wasm_bindgen_test]
fn unknown_kind_is_an_error() {
    assert!(init_visualization("fireworks").is_err());
    assert!(Visualization::new("fireworks", None).is_err());
}

#[wasm_bindgen_test]
fn lists_every_kind() {
    let kinds = visualization_kinds();
    assert_eq!(kinds.length(), 10);
    assert_eq!(kinds.get(0).as_string().as_deref(), Some("binary-trees"));
}

#[wasm_bindgen_test]
fn lifecycle_on_a_real_canvas() {
    let canvas = add_canvas("graph-canvas");
    init_visualization("GraphNetwork").unwrap();
    assert!(is_visualization_active("graph").unwrap());

    // second init is idempotent
    init_visualization("graph").unwrap();
    assert!(is_visualization_active("graph").unwrap());

    stop_visualization("graph").unwrap();
    assert!(!is_visualization_active("graph").unwrap());

    clear_visualization("graph").unwrap();
    assert!(!is_visualization_active("graph").unwrap());
    canvas.remove();
}

#[wasm_bindgen_test]
fn class_binds_a_custom_canvas() {
    let canvas = add_canvas("custom-water");
    let mut viz = Visualization::new("Water", Some("custom-water".into())).unwrap();
    assert_eq!(viz.kind(), "water");
    viz.init().unwrap();
    assert!(viz.active());
    viz.stop();
    assert!(!viz.active());
    viz.clear_memory();
    assert!(!viz.active());
    canvas.remove();

    let mut orphan = Visualization::new("Climber", Some("nowhere".into())).unwrap();
    orphan.init().unwrap();
    assert!(!orphan.active());
}
