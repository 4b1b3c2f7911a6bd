//! The drawing surface scenes render into.
//!
//! `Painter` mirrors the subset of the Canvas 2D API the visualizations use,
//! so scenes can be driven headless on the host. The browser implementation
//! lives in `wasm::canvas`; [`Recorder`] captures calls for tests.

use crate::color::Color;
use glam::Vec2;

/// A fill or stroke source.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Solid(Color),
    Linear {
        from: Vec2,
        to: Vec2,
        stops: Vec<(f32, Color)>,
    },
    Radial {
        center: Vec2,
        inner: f32,
        outer: f32,
        stops: Vec<(f32, Color)>,
    },
}

impl Paint {
    pub fn vertical(top: f32, bottom: f32, stops: Vec<(f32, Color)>) -> Self {
        Paint::Linear {
            from: Vec2::new(0.0, top),
            to: Vec2::new(0.0, bottom),
            stops,
        }
    }
}

impl From<Color> for Paint {
    fn from(c: Color) -> Self {
        Paint::Solid(c)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blend {
    SourceOver,
    Lighter,
    Hue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

pub trait Painter {
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f32, y: f32);
    fn rotate(&mut self, angle: f32);

    fn set_fill(&mut self, paint: &Paint);
    fn set_stroke(&mut self, paint: &Paint);
    fn set_line_width(&mut self, width: f32);
    fn set_line_cap(&mut self, cap: LineCap);
    fn set_alpha(&mut self, alpha: f32);
    fn set_blend(&mut self, blend: Blend);
    /// `None` clears the shadow.
    fn set_shadow(&mut self, blur: f32, color: Option<Color>);
    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: TextAlign);

    fn clear(&mut self);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn quadratic_to(&mut self, cx: f32, cy: f32, x: f32, y: f32);
    fn arc(&mut self, x: f32, y: f32, radius: f32, start: f32, end: f32);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn fill_text(&mut self, text: &str, x: f32, y: f32);
    /// Draw the current canvas contents back onto itself, offset by `(dx, dy)`.
    fn blit_self(&mut self, dx: f32, dy: f32);

    fn circle(&mut self, x: f32, y: f32, radius: f32) {
        self.begin_path();
        self.arc(x, y, radius.max(0.0), 0.0, std::f32::consts::TAU);
    }

    fn line(&mut self, a: Vec2, b: Vec2) {
        self.begin_path();
        self.move_to(a.x, a.y);
        self.line_to(b.x, b.y);
        self.stroke();
    }

    fn polygon(&mut self, points: &[Vec2]) {
        self.begin_path();
        if let Some((first, rest)) = points.split_first() {
            self.move_to(first.x, first.y);
            for p in rest {
                self.line_to(p.x, p.y);
            }
        }
        self.close_path();
    }
}

/// A recorded painter call.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Save,
    Restore,
    Translate(f32, f32),
    Rotate(f32),
    Fill(Paint),
    Stroke(Paint),
    LineWidth(f32),
    Cap(LineCap),
    Alpha(f32),
    Blend(Blend),
    Shadow(f32, Option<Color>),
    Font(String),
    Align(TextAlign),
    Clear,
    FillRect(f32, f32, f32, f32),
    BeginPath,
    MoveTo(f32, f32),
    LineTo(f32, f32),
    QuadraticTo(f32, f32, f32, f32),
    Arc(f32, f32, f32),
    ClosePath,
    FillPath,
    StrokePath,
    Text(String, f32, f32),
    Blit(f32, f32),
}

/// Painter that records every call; a headless stand-in for the canvas.
#[derive(Default, Debug)]
pub struct Recorder {
    pub ops: Vec<Op>,
    depth: i32,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&Op) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Text(t, _, _) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// True when every `save` was matched by a `restore`.
    pub fn balanced(&self) -> bool {
        self.depth == 0
    }

    /// True when no recorded coordinate is NaN or infinite.
    pub fn all_finite(&self) -> bool {
        let ok = |vals: &[f32]| vals.iter().all(|v| v.is_finite());
        self.ops.iter().all(|op| match *op {
            Op::Translate(a, b) | Op::MoveTo(a, b) | Op::LineTo(a, b) | Op::Blit(a, b) => {
                ok(&[a, b])
            }
            Op::FillRect(a, b, c, d) | Op::QuadraticTo(a, b, c, d) => ok(&[a, b, c, d]),
            Op::Arc(a, b, c) => ok(&[a, b, c]),
            Op::Rotate(a) | Op::LineWidth(a) | Op::Alpha(a) => ok(&[a]),
            Op::Text(_, a, b) => ok(&[a, b]),
            _ => true,
        })
    }
}

impl Painter for Recorder {
    fn save(&mut self) {
        self.depth += 1;
        self.ops.push(Op::Save);
    }
    fn restore(&mut self) {
        self.depth -= 1;
        self.ops.push(Op::Restore);
    }
    fn translate(&mut self, x: f32, y: f32) {
        self.ops.push(Op::Translate(x, y));
    }
    fn rotate(&mut self, angle: f32) {
        self.ops.push(Op::Rotate(angle));
    }
    fn set_fill(&mut self, paint: &Paint) {
        self.ops.push(Op::Fill(paint.clone()));
    }
    fn set_stroke(&mut self, paint: &Paint) {
        self.ops.push(Op::Stroke(paint.clone()));
    }
    fn set_line_width(&mut self, width: f32) {
        self.ops.push(Op::LineWidth(width));
    }
    fn set_line_cap(&mut self, cap: LineCap) {
        self.ops.push(Op::Cap(cap));
    }
    fn set_alpha(&mut self, alpha: f32) {
        self.ops.push(Op::Alpha(alpha));
    }
    fn set_blend(&mut self, blend: Blend) {
        self.ops.push(Op::Blend(blend));
    }
    fn set_shadow(&mut self, blur: f32, color: Option<Color>) {
        self.ops.push(Op::Shadow(blur, color));
    }
    fn set_font(&mut self, font: &str) {
        self.ops.push(Op::Font(font.to_string()));
    }
    fn set_text_align(&mut self, align: TextAlign) {
        self.ops.push(Op::Align(align));
    }
    fn clear(&mut self) {
        self.ops.push(Op::Clear);
    }
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(Op::FillRect(x, y, w, h));
    }
    fn begin_path(&mut self) {
        self.ops.push(Op::BeginPath);
    }
    fn move_to(&mut self, x: f32, y: f32) {
        self.ops.push(Op::MoveTo(x, y));
    }
    fn line_to(&mut self, x: f32, y: f32) {
        self.ops.push(Op::LineTo(x, y));
    }
    fn quadratic_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.ops.push(Op::QuadraticTo(cx, cy, x, y));
    }
    fn arc(&mut self, x: f32, y: f32, radius: f32, _start: f32, _end: f32) {
        self.ops.push(Op::Arc(x, y, radius));
    }
    fn close_path(&mut self) {
        self.ops.push(Op::ClosePath);
    }
    fn fill(&mut self) {
        self.ops.push(Op::FillPath);
    }
    fn stroke(&mut self) {
        self.ops.push(Op::StrokePath);
    }
    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        self.ops.push(Op::Text(text.to_string(), x, y));
    }
    fn blit_self(&mut self, dx: f32, dy: f32) {
        self.ops.push(Op::Blit(dx, dy));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    #[test]
    fn polygon_closes_path() {
        let mut rec = Recorder::new();
        rec.polygon(&[Vec2::ZERO, Vec2::X, Vec2::Y]);
        assert_eq!(rec.ops.first(), Some(&Op::BeginPath));
        assert_eq!(rec.ops.last(), Some(&Op::ClosePath));
        assert_eq!(rec.count(|op| matches!(op, Op::LineTo(..))), 2);
    }

    #[test]
    fn recorder_tracks_save_depth() {
        let mut rec = Recorder::new();
        rec.save();
        rec.set_fill(&Rgb::WHITE.opaque().into());
        assert!(!rec.balanced());
        rec.restore();
        assert!(rec.balanced());
    }
}
