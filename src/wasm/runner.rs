use super::canvas::CanvasPainter;
use super::gl::GlRenderer;
use super::input::{self, Listener};
use crate::error::VizError;
use crate::paint::Painter;
use crate::scene::{Frame, Pacer, Profile, Scene, Surface, Viewport};
use crate::viz::Kind;
use log::{debug, info, warn};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{window, Document, HtmlCanvasElement, VisibilityState, Window};

/// Transparent 2D canvas stacked over a WebGL canvas for captions.
struct Overlay {
    element: HtmlCanvasElement,
    painter: CanvasPainter,
}

impl Overlay {
    fn new(document: &Document, under: &HtmlCanvasElement) -> Result<Self, VizError> {
        let element: HtmlCanvasElement = document
            .create_element("canvas")?
            .dyn_into()
            .map_err(|_| VizError::Js("created element is not a canvas".into()))?;
        let style = element.style();
        style.set_property("position", "absolute")?;
        style.set_property("pointer-events", "none")?;
        style.set_property("left", &format!("{}px", under.offset_left()))?;
        style.set_property("top", &format!("{}px", under.offset_top()))?;
        style.set_property("z-index", "1")?;
        element.set_width(under.width());
        element.set_height(under.height());
        under.after_with_node_1(&element)?;
        let painter = CanvasPainter::new(&element)?;
        Ok(Self { element, painter })
    }

    fn fit(&self, under: &HtmlCanvasElement) {
        self.element.set_width(under.width());
        self.element.set_height(under.height());
    }
}

impl Drop for Overlay {
    fn drop(&mut self) {
        self.element.remove();
    }
}

enum Target {
    Canvas2d(CanvasPainter),
    WebGl {
        renderer: GlRenderer,
        overlay: Overlay,
    },
}

struct Inner {
    kind: Kind,
    canvas: HtmlCanvasElement,
    scene: Box<dyn Scene>,
    target: Option<Target>,
    active: bool,
    /// Stopped by the page going hidden; restart when it is shown again.
    resume: bool,
    handle: Option<i32>,
    pacer: Pacer,
    frames: u64,
    frame: Option<Closure<dyn FnMut(f64)>>,
    listeners: Vec<Listener>,
}

/// Owns one visualization bound to one canvas and drives its frame loop.
#[derive(Clone)]
pub struct Runner(Rc<RefCell<Inner>>);

fn win() -> Result<Window, VizError> {
    window().ok_or_else(|| VizError::Js("no window".into()))
}

fn doc() -> Result<Document, VizError> {
    win()?
        .document()
        .ok_or_else(|| VizError::Js("no document".into()))
}

fn now_ms() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// Size the backing store to the element's laid-out size, falling back to the window.
fn fit_canvas(canvas: &HtmlCanvasElement) -> Viewport {
    let (mut w, mut h) = (canvas.client_width(), canvas.client_height());
    if w <= 0 || h <= 0 {
        if let Some(win) = window() {
            let dim = |v: Result<wasm_bindgen::JsValue, _>| {
                v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as i32
            };
            w = dim(win.inner_width());
            h = dim(win.inner_height());
        }
    }
    let (w, h) = (w.max(1) as u32, h.max(1) as u32);
    canvas.set_width(w);
    canvas.set_height(h);
    Viewport::new(w as f32, h as f32)
}

impl Runner {
    /// Bind `kind` to the canvas with `canvas_id`. Nothing is started yet.
    pub fn attach(kind: Kind, canvas_id: &str) -> Result<Self, VizError> {
        let canvas: HtmlCanvasElement = doc()?
            .get_element_by_id(canvas_id)
            .ok_or_else(|| VizError::CanvasMissing(canvas_id.to_string()))?
            .dyn_into()
            .map_err(|_| VizError::CanvasMissing(canvas_id.to_string()))?;

        let profile = win()?
            .navigator()
            .user_agent()
            .map(|ua| Profile::from_user_agent(&ua))
            .unwrap_or_default();
        let seed = js_sys::Date::now() as u64 ^ (kind as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);

        Ok(Runner(Rc::new(RefCell::new(Inner {
            kind,
            canvas,
            scene: kind.build(profile, seed),
            target: None,
            active: false,
            resume: false,
            handle: None,
            pacer: Pacer::new(0.0),
            frames: 0,
            frame: None,
            listeners: Vec::new(),
        }))))
    }

    pub fn is_active(&self) -> bool {
        self.0.borrow().active
    }

    /// Set up and start the frame loop. Calling it on a running visualization is a no-op.
    pub fn start(&self) -> Result<(), VizError> {
        if self.is_active() {
            return Ok(());
        }
        let weak = Rc::downgrade(&self.0);
        let mut inner = self.0.borrow_mut();

        if inner.target.is_none() {
            let target = match inner.scene.surface() {
                Surface::Canvas2d => Target::Canvas2d(CanvasPainter::new(&inner.canvas)?),
                Surface::WebGl => Target::WebGl {
                    renderer: GlRenderer::new(&inner.canvas)?,
                    overlay: Overlay::new(&doc()?, &inner.canvas)?,
                },
            };
            inner.target = Some(target);
        }
        if inner.listeners.is_empty() {
            inner.listeners = listen(&weak, &inner.canvas)?;
        }
        if inner.frame.is_none() {
            let tick = weak.clone();
            inner.frame = Some(Closure::wrap(Box::new(move |ts: f64| {
                if let Some(rc) = tick.upgrade() {
                    Runner(rc).tick(ts);
                }
            }) as Box<dyn FnMut(f64)>));
        }

        let viewport = fit_canvas(&inner.canvas);
        if let Some(Target::WebGl { overlay, .. }) = &inner.target {
            overlay.fit(&inner.canvas);
        }
        let now = now_ms();
        inner.scene.init(viewport, now);
        inner.active = true;
        inner.resume = false;
        inner.pacer = Pacer::new(now);
        inner.frames = 0;
        info!("{} started ({}x{})", inner.kind, viewport.width, viewport.height);
        inner.schedule();
        Ok(())
    }

    /// Halt scheduling; entities are kept.
    pub fn stop(&self) {
        let mut inner = self.0.borrow_mut();
        if !inner.active {
            return;
        }
        inner.active = false;
        inner.cancel();
        info!("{} stopped", inner.kind);
    }

    /// Stop, drop entities, detach listeners and remove the overlay.
    pub fn clear(&self) {
        self.stop();
        let mut inner = self.0.borrow_mut();
        inner.resume = false;
        inner.scene.clear();
        inner.listeners.clear();
        if let Some(Target::Canvas2d(painter)) = inner.target.as_mut() {
            painter.clear();
        }
        inner.target = None;
        inner.frame = None;
        info!("{} cleared", inner.kind);
    }

    fn tick(&self, ts: f64) {
        let mut inner = self.0.borrow_mut();
        if !inner.active {
            return;
        }
        inner.handle = None;
        inner.schedule();

        let interval = inner.scene.frame_interval_ms();
        let Some(elapsed) = inner.pacer.admit(ts, interval) else {
            return;
        };
        let frame = Frame::new(ts, (elapsed / 1000.0) as f32, inner.frames);
        inner.frames += 1;

        let Inner { scene, target, .. } = &mut *inner;
        scene.update(&frame);
        match target {
            Some(Target::Canvas2d(painter)) => scene.draw(painter),
            Some(Target::WebGl { renderer, overlay }) => {
                if let Some(mesh) = scene.mesh() {
                    renderer.draw(&mesh);
                }
                scene.draw(&mut overlay.painter);
            }
            None => {}
        }
    }

    fn resized(&self) {
        let mut inner = self.0.borrow_mut();
        if !inner.active {
            return;
        }
        let viewport = fit_canvas(&inner.canvas);
        if let Some(Target::WebGl { overlay, .. }) = &inner.target {
            overlay.fit(&inner.canvas);
        }
        debug!("{} resized to {}x{}", inner.kind, viewport.width, viewport.height);
        inner.scene.resize(viewport, now_ms());
    }

    fn visibility_changed(&self, hidden: bool) {
        let (active, resume) = {
            let inner = self.0.borrow();
            (inner.active, inner.resume)
        };
        if hidden && active {
            self.stop();
            self.0.borrow_mut().resume = true;
        } else if !hidden && resume {
            if let Err(err) = self.start() {
                warn!("resume failed: {}", err);
            }
        }
    }
}

impl Inner {
    fn schedule(&mut self) {
        let Some(callback) = self.frame.as_ref() else {
            return;
        };
        let id = window().map(|w| w.request_animation_frame(callback.as_ref().unchecked_ref()));
        match id {
            Some(Ok(id)) => self.handle = Some(id),
            Some(Err(err)) => warn!("requestAnimationFrame failed: {:?}", err),
            None => warn!("no window to schedule {} on", self.kind),
        }
    }

    fn cancel(&mut self) {
        if let (Some(id), Some(w)) = (self.handle.take(), window()) {
            if let Err(err) = w.cancel_animation_frame(id) {
                warn!("cancelAnimationFrame failed: {:?}", err);
            }
        }
    }
}

fn listen(weak: &Weak<RefCell<Inner>>, canvas: &HtmlCanvasElement) -> Result<Vec<Listener>, VizError> {
    let win = win()?;
    let document = doc()?;
    let mut listeners = Vec::new();

    let w = weak.clone();
    listeners.push(Listener::new(&win, "resize", move |_| {
        if let Some(rc) = w.upgrade() {
            Runner(rc).resized();
        }
    })?);

    let w = weak.clone();
    let page = document.clone();
    listeners.push(Listener::new(&document, "visibilitychange", move |_| {
        if let Some(rc) = w.upgrade() {
            Runner(rc).visibility_changed(page.visibility_state() == VisibilityState::Hidden);
        }
    })?);

    let dispatch = |target: &web_sys::EventTarget, event: &'static str| {
        let w = weak.clone();
        let canvas = canvas.clone();
        Listener::new(target, event, move |e| {
            let Some(rc) = w.upgrade() else { return };
            if let Some(input) = input::translate(&canvas, &e) {
                let mut inner = rc.borrow_mut();
                if inner.active {
                    inner.scene.input(&input);
                }
            }
        })
    };
    for event in input::CANVAS_EVENTS {
        listeners.push(dispatch(canvas.as_ref(), event)?);
    }
    listeners.push(dispatch(win.as_ref(), "keydown")?);
    Ok(listeners)
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.cancel();
    }
}
