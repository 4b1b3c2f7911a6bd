//! Contract shared by every visualization.

use crate::mesh::Mesh;
use crate::paint::Painter;
use glam::Vec2;

/// Canvas size in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Timing handed to `Scene::update`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    /// Host timestamp in milliseconds.
    pub now_ms: f64,
    /// Seconds since the previous update, clamped to `MAX_DT`.
    pub dt: f32,
    pub index: u64,
}

impl Frame {
    pub const MAX_DT: f32 = 0.1;

    pub fn new(now_ms: f64, dt: f32, index: u64) -> Self {
        Self {
            now_ms,
            dt: dt.clamp(0.0, Self::MAX_DT),
            index,
        }
    }

    /// Synthetic 60 Hz frame, used by tests and headless runs.
    pub fn tick(index: u64) -> Self {
        Self::new(index as f64 * 1000.0 / 60.0, 1.0 / 60.0, index)
    }
}

/// Frame-rate cap for host callbacks that arrive at display rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pacer {
    last_ms: f64,
}

impl Pacer {
    /// Display timestamps jitter; frames this close to the interval still render.
    pub const TOLERANCE_MS: f64 = 1.0;

    pub fn new(now_ms: f64) -> Self {
        Self { last_ms: now_ms }
    }

    /// Milliseconds since the last rendered frame if the callback at `now_ms`
    /// should render, `None` if it should be skipped. An `interval_ms` of 0
    /// admits every callback.
    pub fn admit(&mut self, now_ms: f64, interval_ms: f64) -> Option<f64> {
        let elapsed = now_ms - self.last_ms;
        if interval_ms <= 0.0 {
            self.last_ms = now_ms;
            return Some(elapsed);
        }
        if elapsed + Self::TOLERANCE_MS < interval_ms {
            return None;
        }
        // Carry the overshoot so the cadence does not drift.
        self.last_ms = if elapsed >= interval_ms {
            now_ms - elapsed % interval_ms
        } else {
            now_ms
        };
        Some(elapsed)
    }
}

/// Device class; mobile scenes spawn fewer entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Desktop,
    Mobile,
}

impl Profile {
    pub fn from_user_agent(ua: &str) -> Self {
        const MARKERS: [&str; 8] = [
            "Android",
            "webOS",
            "iPhone",
            "iPad",
            "iPod",
            "BlackBerry",
            "IEMobile",
            "Opera Mini",
        ];
        let ua = ua.to_ascii_lowercase();
        if MARKERS.iter().any(|m| ua.contains(&m.to_ascii_lowercase())) {
            Profile::Mobile
        } else {
            Profile::Desktop
        }
    }

    pub fn is_mobile(self) -> bool {
        self == Profile::Mobile
    }

    /// Pick the desktop or mobile variant of a setting.
    pub fn pick<T>(self, desktop: T, mobile: T) -> T {
        match self {
            Profile::Desktop => desktop,
            Profile::Mobile => mobile,
        }
    }
}

/// Pointer and keyboard input, in canvas pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    Down(Vec2),
    Move(Vec2),
    Up,
    Click(Vec2),
    Key(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Surface {
    Canvas2d,
    /// WebGL2 scene geometry plus a 2D overlay for text.
    WebGl,
}

/// A visualization's simulation. Browser glue owns scheduling and the canvas;
/// the scene owns its entities.
pub trait Scene {
    fn name(&self) -> &'static str;

    fn surface(&self) -> Surface {
        Surface::Canvas2d
    }

    /// (Re)build all entities for the given viewport.
    fn init(&mut self, viewport: Viewport, now_ms: f64);

    fn update(&mut self, frame: &Frame);

    /// Render the current state. For `Surface::WebGl` this targets the overlay.
    fn draw(&self, painter: &mut dyn Painter);

    fn mesh(&self) -> Option<Mesh> {
        None
    }

    /// Default resize rebuilds everything.
    fn resize(&mut self, viewport: Viewport, now_ms: f64) {
        self.init(viewport, now_ms);
    }

    fn input(&mut self, _event: &InputEvent) {}

    /// Drop entity memory.
    fn clear(&mut self);

    /// Minimum milliseconds between rendered frames; 0 means every frame.
    fn frame_interval_ms(&self) -> f64 {
        0.0
    }

    fn entity_count(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_mobile_agents() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
        let desktop = "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/128.0";
        assert_eq!(Profile::from_user_agent(iphone), Profile::Mobile);
        assert_eq!(Profile::from_user_agent(desktop), Profile::Desktop);
    }

    fn rendered(interval_ms: f64) -> usize {
        let mut pacer = Pacer::new(0.0);
        (1..=600u32)
            .map(|i| i as f64 * 1000.0 / 60.0 + ((i * 7) % 5) as f64 * 0.05 - 0.1)
            .filter(|&ts| pacer.admit(ts, interval_ms).is_some())
            .count()
    }

    #[test]
    fn pacer_holds_rate_under_jitter() {
        assert_eq!(rendered(0.0), 600);
        assert_eq!(rendered(1000.0 / 60.0), 600);
        assert!((299..=301).contains(&rendered(1000.0 / 30.0)));
    }

    #[test]
    fn pacer_carries_overshoot() {
        let mut pacer = Pacer::new(0.0);
        assert_eq!(pacer.admit(10.0, 33.0), None);
        assert_eq!(pacer.admit(40.0, 33.0), Some(40.0));
        // anchor sits at 33, so 66.5 is already due
        assert_eq!(pacer.admit(66.5, 33.0), Some(33.5));
    }

    #[test]
    fn frame_clamps_dt() {
        assert_eq!(Frame::new(0.0, 5.0, 0).dt, Frame::MAX_DT);
        assert_eq!(Frame::new(0.0, -1.0, 0).dt, 0.0);
    }
}
