use crate::color::Color;
use crate::paint::{Blend, LineCap, Paint, Painter, TextAlign};
use log::warn;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasGradient, CanvasRenderingContext2d, HtmlCanvasElement};

use crate::error::VizError;

/// `Painter` backed by a real 2D context.
pub struct CanvasPainter {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

/// Log a failed canvas call instead of aborting the frame.
fn check(op: &str, result: Result<(), JsValue>) {
    if let Err(err) = result {
        warn!("canvas {} failed: {:?}", op, err);
    }
}

impl CanvasPainter {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, VizError> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or(VizError::ContextUnavailable("2d"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| VizError::ContextUnavailable("2d"))?;
        Ok(Self {
            canvas: canvas.clone(),
            ctx,
        })
    }

    fn gradient(&self, paint: &Paint) -> Option<CanvasGradient> {
        let (gradient, stops) = match paint {
            Paint::Solid(_) => return None,
            Paint::Linear { from, to, stops } => (
                self.ctx.create_linear_gradient(
                    from.x as f64,
                    from.y as f64,
                    to.x as f64,
                    to.y as f64,
                ),
                stops,
            ),
            Paint::Radial {
                center,
                inner,
                outer,
                stops,
            } => {
                let (x, y) = (center.x as f64, center.y as f64);
                match self.ctx.create_radial_gradient(
                    x,
                    y,
                    inner.max(0.0) as f64,
                    x,
                    y,
                    outer.max(0.0) as f64,
                ) {
                    Ok(g) => (g, stops),
                    Err(err) => {
                        warn!("radial gradient rejected: {:?}", err);
                        return None;
                    }
                }
            }
        };
        for (offset, color) in stops {
            check(
                "addColorStop",
                gradient.add_color_stop(offset.clamp(0.0, 1.0), &color.to_string()),
            );
        }
        Some(gradient)
    }
}

impl Painter for CanvasPainter {
    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn translate(&mut self, x: f32, y: f32) {
        check("translate", self.ctx.translate(x as f64, y as f64));
    }

    fn rotate(&mut self, angle: f32) {
        check("rotate", self.ctx.rotate(angle as f64));
    }

    fn set_fill(&mut self, paint: &Paint) {
        match (paint, self.gradient(paint)) {
            (Paint::Solid(c), _) => self.ctx.set_fill_style_str(&c.to_string()),
            (_, Some(g)) => self.ctx.set_fill_style_canvas_gradient(&g),
            _ => {}
        }
    }

    fn set_stroke(&mut self, paint: &Paint) {
        match (paint, self.gradient(paint)) {
            (Paint::Solid(c), _) => self.ctx.set_stroke_style_str(&c.to_string()),
            (_, Some(g)) => self.ctx.set_stroke_style_canvas_gradient(&g),
            _ => {}
        }
    }

    fn set_line_width(&mut self, width: f32) {
        self.ctx.set_line_width(width as f64);
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.ctx.set_line_cap(match cap {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        });
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.ctx.set_global_alpha(alpha.clamp(0.0, 1.0) as f64);
    }

    fn set_blend(&mut self, blend: Blend) {
        let op = match blend {
            Blend::SourceOver => "source-over",
            Blend::Lighter => "lighter",
            Blend::Hue => "hue",
        };
        check("globalCompositeOperation", self.ctx.set_global_composite_operation(op));
    }

    fn set_shadow(&mut self, blur: f32, color: Option<Color>) {
        match color {
            Some(c) => {
                self.ctx.set_shadow_blur(blur.max(0.0) as f64);
                self.ctx.set_shadow_color(&c.to_string());
            }
            None => {
                self.ctx.set_shadow_blur(0.0);
                self.ctx.set_shadow_color("rgba(0, 0, 0, 0)");
            }
        }
    }

    fn set_font(&mut self, font: &str) {
        self.ctx.set_font(font);
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.ctx.set_text_align(match align {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        });
    }

    fn clear(&mut self) {
        self.ctx.save();
        check("setTransform", self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0));
        self.ctx.clear_rect(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );
        self.ctx.restore();
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.ctx.fill_rect(x as f64, y as f64, w as f64, h as f64);
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.ctx.move_to(x as f64, y as f64);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.ctx.line_to(x as f64, y as f64);
    }

    fn quadratic_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.ctx
            .quadratic_curve_to(cx as f64, cy as f64, x as f64, y as f64);
    }

    fn arc(&mut self, x: f32, y: f32, radius: f32, start: f32, end: f32) {
        check(
            "arc",
            self.ctx.arc(
                x as f64,
                y as f64,
                radius.max(0.0) as f64,
                start as f64,
                end as f64,
            ),
        );
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn fill(&mut self) {
        self.ctx.fill();
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        check("fillText", self.ctx.fill_text(text, x as f64, y as f64));
    }

    fn blit_self(&mut self, dx: f32, dy: f32) {
        check(
            "drawImage",
            self.ctx
                .draw_image_with_html_canvas_element(&self.canvas, dx as f64, dy as f64),
        );
    }
}
