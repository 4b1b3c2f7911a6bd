use crate::error::VizError;
use crate::scene::InputEvent;
use glam::Vec2;
use log::warn;
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{Event, EventTarget, HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

/// An event listener that detaches itself when dropped.
pub struct Listener {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    pub fn new(
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, VizError> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            closure,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Err(err) = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref())
        {
            warn!("removing {} listener failed: {:?}", self.event, err);
        }
    }
}

/// DOM events the canvas listens for.
pub const CANVAS_EVENTS: [&str; 8] = [
    "mousedown",
    "mousemove",
    "mouseup",
    "mouseleave",
    "click",
    "touchstart",
    "touchmove",
    "touchend",
];

fn local(canvas: &HtmlCanvasElement, client_x: i32, client_y: i32) -> Vec2 {
    let rect = canvas.get_bounding_client_rect();
    Vec2::new(
        (client_x as f64 - rect.left()) as f32,
        (client_y as f64 - rect.top()) as f32,
    )
}

/// Translate a DOM event into canvas coordinates. Unknown events map to `None`.
pub fn translate(canvas: &HtmlCanvasElement, event: &Event) -> Option<InputEvent> {
    if let Some(key) = event.dyn_ref::<KeyboardEvent>() {
        return Some(InputEvent::Key(key.key()));
    }
    if let Some(touch) = event.dyn_ref::<TouchEvent>() {
        let point = touch
            .touches()
            .get(0)
            .map(|t| local(canvas, t.client_x(), t.client_y()));
        return match (event.type_().as_str(), point) {
            ("touchstart", Some(p)) => {
                event.prevent_default();
                Some(InputEvent::Down(p))
            }
            ("touchmove", Some(p)) => {
                event.prevent_default();
                Some(InputEvent::Move(p))
            }
            ("touchend", _) => Some(InputEvent::Up),
            _ => None,
        };
    }
    let mouse = event.dyn_ref::<MouseEvent>()?;
    let p = local(canvas, mouse.client_x(), mouse.client_y());
    match event.type_().as_str() {
        "mousedown" => Some(InputEvent::Down(p)),
        "mousemove" => Some(InputEvent::Move(p)),
        "mouseup" | "mouseleave" => Some(InputEvent::Up),
        "click" => Some(InputEvent::Click(p)),
        _ => None,
    }
}
