//! Browser glue: the exported JS API and per-canvas runners.

mod canvas;
mod gl;
mod input;
mod runner;

use crate::error::VizError;
use crate::viz::Kind;
use log::{info, warn};
use runner::Runner;
use std::cell::RefCell;
use std::collections::HashMap;
use wasm_bindgen::prelude::*;

thread_local! {
    static REGISTRY: RefCell<HashMap<Kind, Runner>> = RefCell::new(HashMap::new());
}

fn kind(name: &str) -> Result<Kind, JsValue> {
    Ok(name.parse::<Kind>()?)
}

fn registered(kind: Kind) -> Option<Runner> {
    REGISTRY.with(|r| r.borrow().get(&kind).cloned())
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or("no document")?;
    for kind in Kind::ALL {
        let Some(canvas) = document.get_element_by_id(kind.canvas_id()) else {
            continue;
        };
        if canvas.class_list().contains("active") {
            if let Err(err) = init_visualization(kind.name()) {
                warn!("auto-init of {} failed: {:?}", kind, err);
            }
        }
    }
    Ok(())
}

/// Start the named visualization on its default canvas. A missing canvas is a logged no-op.
#[wasm_bindgen]
pub fn init_visualization(name: &str) -> Result<(), JsValue> {
    let kind = kind(name)?;
    let runner = match registered(kind) {
        Some(runner) => runner,
        None => match Runner::attach(kind, kind.canvas_id()) {
            Ok(runner) => {
                REGISTRY.with(|r| r.borrow_mut().insert(kind, runner.clone()));
                runner
            }
            Err(VizError::CanvasMissing(id)) => {
                warn!("{}: canvas #{} not found, skipping", kind, id);
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        },
    };
    runner.start()?;
    Ok(())
}

#[wasm_bindgen]
pub fn stop_visualization(name: &str) -> Result<(), JsValue> {
    if let Some(runner) = registered(kind(name)?) {
        runner.stop();
    }
    Ok(())
}

/// Stop and release everything the visualization holds.
#[wasm_bindgen]
pub fn clear_visualization(name: &str) -> Result<(), JsValue> {
    let kind = kind(name)?;
    if let Some(runner) = REGISTRY.with(|r| r.borrow_mut().remove(&kind)) {
        runner.clear();
    }
    Ok(())
}

#[wasm_bindgen]
pub fn is_visualization_active(name: &str) -> Result<bool, JsValue> {
    Ok(registered(kind(name)?).is_some_and(|r| r.is_active()))
}

#[wasm_bindgen]
pub fn visualization_kinds() -> js_sys::Array {
    Kind::ALL
        .iter()
        .map(|k| JsValue::from_str(k.name()))
        .collect()
}

/// A visualization bound to an arbitrary canvas, outside the shared registry.
#[wasm_bindgen]
pub struct Visualization {
    kind: Kind,
    canvas_id: String,
    runner: Option<Runner>,
}

#[wasm_bindgen]
impl Visualization {
    #[wasm_bindgen(constructor)]
    pub fn new(kind_name: &str, canvas_id: Option<String>) -> Result<Visualization, JsValue> {
        let kind = kind(kind_name)?;
        Ok(Self {
            kind,
            canvas_id: canvas_id.unwrap_or_else(|| kind.canvas_id().to_string()),
            runner: None,
        })
    }

    pub fn init(&mut self) -> Result<(), JsValue> {
        if self.runner.is_none() {
            match Runner::attach(self.kind, &self.canvas_id) {
                Ok(runner) => self.runner = Some(runner),
                Err(VizError::CanvasMissing(id)) => {
                    warn!("{}: canvas #{} not found, skipping", self.kind, id);
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            }
        }
        if let Some(runner) = &self.runner {
            runner.start()?;
        }
        Ok(())
    }

    pub fn stop(&self) {
        if let Some(runner) = &self.runner {
            runner.stop();
        }
    }

    pub fn clear_memory(&mut self) {
        if let Some(runner) = self.runner.take() {
            runner.clear();
            info!("{} on #{} released", self.kind, self.canvas_id);
        }
    }

    #[wasm_bindgen(getter)]
    pub fn active(&self) -> bool {
        self.runner.as_ref().is_some_and(Runner::is_active)
    }

    #[wasm_bindgen(getter)]
    pub fn kind(&self) -> String {
        self.kind.name().to_string()
    }
}
