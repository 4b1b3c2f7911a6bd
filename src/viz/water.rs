//! Shimmering water particles driven through five repeating warp cycles.

use crate::color::{Color, Rgb};
use crate::paint::{Blend, Painter, TextAlign};
use crate::rng::Rng;
use crate::scene::{Frame, Scene, Viewport};
use glam::Vec2;
use log::debug;
use std::f32::consts::{PI, TAU};

const PARTICLES: usize = 500;
pub const CYCLE_MS: f64 = 6000.0;
const BACKGROUND: Rgb = Rgb::new(5, 6, 10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cycle {
    RealityRipples,
    FractalConvergence,
    DimensionCollapse,
    NeuralPulse,
    RealityUnbound,
}

impl Cycle {
    pub fn next(self) -> Self {
        match self {
            Cycle::RealityRipples => Cycle::FractalConvergence,
            Cycle::FractalConvergence => Cycle::DimensionCollapse,
            Cycle::DimensionCollapse => Cycle::NeuralPulse,
            Cycle::NeuralPulse => Cycle::RealityUnbound,
            Cycle::RealityUnbound => Cycle::RealityRipples,
        }
    }

    /// 1-based position in the rotation.
    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    pub fn label(self) -> &'static str {
        match self {
            Cycle::RealityRipples => "REALITY RIPPLES",
            Cycle::FractalConvergence => "FRACTAL CONVERGENCE",
            Cycle::DimensionCollapse => "DIMENSION COLLAPSE",
            Cycle::NeuralPulse => "NEURAL PULSE",
            Cycle::RealityUnbound => "REALITY UNBOUND",
        }
    }

    /// Warp parameters at `progress` (0..1 through the cycle) and scene time `t`.
    pub fn warp(self, progress: f32, t: f32) -> Warp {
        let p = progress * PI;
        match self {
            Cycle::RealityRipples => Warp {
                intensity: 0.3 + (p * 6.0).sin() * 0.3,
                flow: t * 0.2 + (t * 0.5).sin() * (t * 0.3).cos() * 3.0,
                amplitude: 1.2 + (p * 4.0).sin() * 0.8,
                color_shift: 0.5 + (p * 8.0).sin() * 0.5,
            },
            Cycle::FractalConvergence => Warp {
                intensity: 0.8 + (t * 0.3).sin() * 0.4,
                flow: t * 0.5 + (t * 0.2).cos() * 5.0,
                amplitude: 1.5 + (p * 3.0).cos(),
                color_shift: 1.0 + (t * 2.0).sin() * 0.5,
            },
            Cycle::DimensionCollapse => Warp {
                intensity: 1.2 + (p * 2.0).sin() * 0.8,
                flow: t * 0.8 + t.sin() * (t * 0.4).cos() * 10.0,
                amplitude: 2.2 + (t * 0.6).sin() * 1.5,
                color_shift: 1.5 + t.cos() * (t * 2.0).sin() * 0.8,
            },
            Cycle::NeuralPulse => Warp {
                intensity: 1.5 - (p * 7.0).cos() * 0.7,
                flow: t * 1.2 + (t * 2.0).sin() * 8.0,
                amplitude: 2.5 - (t * 0.4).cos() * 1.8,
                color_shift: 2.0 + (t * 3.0).sin(),
            },
            Cycle::RealityUnbound => Warp {
                intensity: 1.8 * (p * 3.0).sin().powi(2),
                flow: t * 1.5 + (t * 0.8).sin() * (t * 0.2).cos() * 15.0,
                amplitude: 3.0 * (t * 0.3).sin().powi(2),
                color_shift: 2.5 * t.sin().abs(),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Warp {
    pub intensity: f32,
    pub flow: f32,
    pub amplitude: f32,
    pub color_shift: f32,
}

#[derive(Clone, Debug)]
pub struct Particle {
    pub pos: Vec2,
    pub size: f32,
    base_size: f32,
    speed: f32,
    opacity: f32,
    phase: f32,
    wave_freq: f32,
}

pub struct Water {
    rng: Rng,
    viewport: Viewport,
    particles: Vec<Particle>,
    time: f32,
    cycle: Cycle,
    cycle_start_ms: f64,
    now_ms: f64,
    warp: Warp,
}

impl Water {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Rng::seeded(seed),
            viewport: Viewport::default(),
            particles: Vec::new(),
            time: 0.0,
            cycle: Cycle::RealityRipples,
            cycle_start_ms: 0.0,
            now_ms: 0.0,
            warp: Warp::default(),
        }
    }

    pub fn cycle(&self) -> Cycle {
        self.cycle
    }

    pub fn warp(&self) -> Warp {
        self.warp
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn progress(&self) -> f32 {
        ((self.now_ms - self.cycle_start_ms) / CYCLE_MS).clamp(0.0, 1.0) as f32
    }

    fn advance_cycle(&mut self, now_ms: f64) {
        self.now_ms = now_ms;
        if now_ms - self.cycle_start_ms >= CYCLE_MS {
            self.cycle = self.cycle.next();
            self.cycle_start_ms = now_ms;
            debug!("water: cycle {} {}", self.cycle.number(), self.cycle.label());
        }
        self.warp = self.cycle.warp(self.progress(), self.time);
    }

    fn move_particles(&mut self) {
        let Warp {
            intensity,
            flow,
            amplitude,
            ..
        } = self.warp;
        let t = self.time;
        let (w, h) = (self.viewport.width, self.viewport.height);
        let center = self.viewport.center();

        for p in &mut self.particles {
            let wave = Vec2::new(
                (t * p.wave_freq + p.phase).sin() * amplitude * 2.0,
                (t * p.wave_freq + p.phase).cos() * amplitude,
            );
            let drift = Vec2::new(
                (flow + p.phase).sin() * intensity * (1.0 + (t * 0.3 + p.phase * 2.0).cos() * 0.5),
                (flow + p.phase * 0.5).cos() * intensity * (1.0 + (t * 0.4 + p.phase).sin() * 0.5),
            );
            let vortex = if intensity > 1.0 {
                let d = p.pos - center;
                d.perp() / (d.length() + 0.1) * intensity * 0.5
            } else {
                Vec2::ZERO
            };
            p.pos += Vec2::new(p.speed * 0.5, p.speed) + wave + drift + vortex;

            if intensity > 1.3 && self.rng.chance(0.02) {
                p.pos = Vec2::new(self.rng.unit() * w, self.rng.unit() * h);
            }

            p.size = p.base_size * (1.0 + (t + p.phase).sin() * 0.3 * intensity);
            if intensity > 1.0 && self.rng.chance(0.001) {
                p.size = p.base_size * self.rng.range(3.0, 5.0);
            }

            let margin = p.size * 2.0;
            if p.pos.x < -margin {
                p.pos.x = w + p.size;
            }
            if p.pos.x > w + margin {
                p.pos.x = -p.size;
            }
            if p.pos.y < -margin {
                p.pos.y = h + p.size;
            }
            if p.pos.y > h + margin {
                p.pos.y = -p.size;
            }
        }
    }

    fn draw_fractals(&self, painter: &mut dyn Painter) {
        let warp = self.warp.intensity;
        if warp < 0.7 {
            return;
        }
        let t = self.time;
        let (w, h) = (self.viewport.width, self.viewport.height);
        let fractals = (3.0 + warp * 5.0) as usize;
        let arms = 3 + (warp * 3.0) as usize;
        painter.set_line_width(0.5 + warp * 0.5);

        for f in 0..fractals {
            let ff = f as f32;
            let center = Vec2::new(
                w * (0.3 + (t * 0.2 + ff).sin() * 0.4),
                h * (0.3 + (t * 0.3 + ff).cos() * 0.4),
            );
            let radius = (50.0 + (t * 0.1 + ff).sin() * 30.0) * warp;
            let hue = (40.0 * ff + t * 20.0) % 360.0;
            painter.set_stroke(&Color::hsla(hue, 70.0, 50.0, 0.03 + warp * 0.02).into());

            for a in 0..arms {
                let base = TAU * a as f32 / arms as f32 + t * (0.1 + ff * 0.05);
                painter.begin_path();
                for i in 0..30 {
                    let r = i as f32 * radius / 30.0;
                    let angle = base + i as f32 * 0.2 * (t * 0.2 + ff).sin();
                    let p = center + Vec2::from_angle(angle) * r;
                    if i == 0 {
                        painter.move_to(p.x, p.y);
                    } else {
                        painter.line_to(p.x, p.y);
                    }
                }
                painter.stroke();
            }
        }
    }

    fn draw_wave_lines(&self, painter: &mut dyn Painter) {
        let Warp {
            intensity, amplitude, ..
        } = self.warp;
        if intensity <= 0.3 {
            return;
        }
        let t = self.time;
        let (w, h) = (self.viewport.width, self.viewport.height);
        let lines = (5.0 + intensity * 10.0) as usize;
        painter.set_stroke(&Rgb::new(120, 140, 180).alpha(0.05 + intensity * 0.05).into());
        painter.set_line_width(0.5);

        for i in 0..lines {
            let y = h / lines as f32 * i as f32;
            painter.begin_path();
            painter.move_to(0.0, y);
            let mut x = 0.0;
            while x < w {
                let lift = (x * 0.01 + t + i as f32 * 0.5).sin() * amplitude * 10.0 * (1.0 + (t * 0.2).sin());
                painter.line_to(x, y + lift);
                x += 10.0;
            }
            painter.stroke();
        }
    }

    /// Closed blob with `sides` bulging quadratic edges.
    fn trace_blob(&self, painter: &mut dyn Painter, center: Vec2, radius: f32, sides: usize, rotation: f32) {
        let t = self.time;
        let warp = self.warp.intensity;
        let step = TAU / sides as f32;
        painter.begin_path();
        for i in 0..sides {
            let angle = rotation + i as f32 * step;
            let r = radius * (1.0 + (t * 2.0 + angle).sin() * 0.3 * warp);
            let p = center + Vec2::from_angle(angle) * r;
            if i == 0 {
                painter.move_to(p.x, p.y);
            } else {
                let mid = angle - step / 2.0;
                let control = radius * 1.5 * (1.0 + (t + mid).sin() * 0.5 * warp);
                let c = center + Vec2::from_angle(mid) * control;
                painter.quadratic_to(c.x, c.y, p.x, p.y);
            }
        }
        painter.close_path();
    }

    fn draw_particles(&self, painter: &mut dyn Painter) {
        let t = self.time;
        let Warp {
            intensity: warp,
            color_shift: shift,
            ..
        } = self.warp;

        for (index, p) in self.particles.iter().enumerate() {
            let hue = (210.0 + shift * 40.0 * (p.phase + t).sin()).rem_euclid(360.0);
            let sat = 70.0 + shift * 30.0;
            let light = 70.0 + shift * 20.0 * (t * 0.5 + p.phase).sin();

            if warp > 0.8 && index % 3 == 0 {
                for i in 1..=5 {
                    let fi = i as f32;
                    let angle = t * 2.0 + p.phase + fi * 0.2;
                    let at = p.pos + Vec2::from_angle(angle) * fi * warp * 3.0;
                    let alpha = p.opacity * (1.0 - fi / 5.0) * 0.6;
                    painter.set_fill(&Color::hsla((hue + fi * 15.0) % 360.0, sat, light, alpha).into());
                    painter.circle(at.x, at.y, p.size * (1.0 - fi / 6.0));
                    painter.fill();
                }
            }

            painter.set_fill(&Color::hsla(hue, sat, light, p.opacity).into());
            if warp > 1.2 && p.size > 1.5 {
                let wobble = (t + p.phase).sin();
                let sides = (3.0 + (wobble * 3.0).floor()).max(3.0) as usize;
                self.trace_blob(painter, p.pos, p.size * (1.0 + wobble * 0.3), sides, t + p.phase);
            } else {
                painter.circle(p.pos.x, p.pos.y, p.size);
            }
            painter.fill();

            if warp > 0.5 {
                let glow = p.size * (2.0 + warp * 0.5);
                let tint = Color::hsla((hue + 30.0) % 360.0, sat, light + 10.0, 0.1 + warp * 0.1);
                painter.set_shadow(glow, Some(tint));
                painter.fill();
                if warp > 1.3 && index % 5 == 0 {
                    let echo = Color::hsla((hue + 180.0) % 360.0, sat, light + 20.0, 0.2);
                    painter.set_shadow(glow * 2.0, Some(echo));
                    painter.fill();
                }
                painter.set_shadow(0.0, None);
            }
        }
    }

    fn draw_indicator(&self, painter: &mut dyn Painter) {
        let t = self.time;
        let warp = self.warp.intensity;
        let x = self.viewport.width - 100.0;
        let y = 20.0;
        let label = self.cycle.label();

        painter.set_font("10px monospace");
        painter.set_text_align(TextAlign::Right);
        if warp > 1.0 {
            let glitch = warp * 3.0;
            let hue = (t * 30.0).floor() % 360.0;
            painter.set_fill(&Color::hsla(hue, 70.0, 60.0, 0.5).into());
            painter.fill_text(label, x + 50.0 + (t * 10.0).sin() * glitch, y + (t * 15.0).cos() * glitch);
            painter.set_fill(&Color::hsla((hue + 180.0) % 360.0, 70.0, 60.0, 0.5).into());
            painter.fill_text(label, x + 50.0 + (t * 12.0).cos() * glitch, y + (t * 8.0).sin() * glitch);
        }
        painter.set_fill(&Rgb::new(180, 200, 220).alpha(0.7).into());
        painter.fill_text(label, x + 50.0, y);
        painter.set_text_align(TextAlign::Left);

        painter.set_fill(&Rgb::new(50, 60, 80).alpha(0.4).into());
        painter.fill_rect(x, y + 5.0, 50.0, 3.0);
        let hue = (self.cycle.number() as f32 * 70.0 + t * 20.0) % 360.0;
        painter.set_fill(&Color::hsla(hue, 70.0, 60.0, 0.8).into());
        painter.fill_rect(x, y + 5.0, 50.0 * self.progress(), 3.0);
    }

    /// Shifted translucent copies of the frame plus a hue wash.
    fn distort(&self, painter: &mut dyn Painter) {
        let warp = self.warp.intensity;
        if warp < 1.3 {
            return;
        }
        let t = self.time;
        let strength = (warp - 1.3) * 0.8;
        painter.set_alpha(0.4);
        for i in 0..3 {
            let fi = i as f32;
            let dx = (t * (0.5 + fi * 0.2)).sin() * strength * 15.0;
            let dy = (t * (0.7 + fi * 0.3)).cos() * strength * 15.0;
            painter.blit_self(dx, dy);
        }
        painter.set_alpha(1.0);

        painter.set_blend(Blend::Hue);
        painter.set_fill(&Color::hsla((t * 50.0) % 360.0, 100.0, 50.0, strength * 0.4).into());
        painter.fill_rect(0.0, 0.0, self.viewport.width, self.viewport.height);
        painter.set_blend(Blend::SourceOver);
    }
}

impl Scene for Water {
    fn name(&self) -> &'static str {
        "water"
    }

    fn init(&mut self, viewport: Viewport, now_ms: f64) {
        self.viewport = viewport;
        self.time = 0.0;
        self.cycle = Cycle::RealityRipples;
        self.cycle_start_ms = now_ms;
        self.now_ms = now_ms;
        let rng = &mut self.rng;
        self.particles = (0..PARTICLES)
            .map(|_| {
                let base_size = rng.range(1.0, 3.0);
                Particle {
                    pos: Vec2::new(rng.unit() * viewport.width, rng.unit() * viewport.height),
                    size: rng.range(1.0, 3.0),
                    base_size,
                    speed: rng.range(0.5, 1.5),
                    opacity: rng.range(0.2, 1.0),
                    phase: rng.angle(),
                    wave_freq: rng.range(0.01, 0.03),
                }
            })
            .collect();
        self.warp = self.cycle.warp(0.0, 0.0);
    }

    fn update(&mut self, frame: &Frame) {
        self.time += 0.01;
        self.advance_cycle(frame.now_ms);
        self.move_particles();
    }

    fn draw(&self, painter: &mut dyn Painter) {
        painter.set_fill(&BACKGROUND.opaque().into());
        painter.fill_rect(0.0, 0.0, self.viewport.width, self.viewport.height);
        self.draw_fractals(painter);
        self.draw_wave_lines(painter);
        self.draw_particles(painter);
        self.draw_indicator(painter);
        if self.warp.intensity > 1.0 {
            self.distort(painter);
        }
    }

    fn resize(&mut self, viewport: Viewport, _now_ms: f64) {
        self.viewport = viewport;
    }

    fn clear(&mut self) {
        self.particles = Vec::new();
    }

    fn frame_interval_ms(&self) -> f64 {
        1000.0 / 60.0
    }

    fn entity_count(&self) -> usize {
        self.particles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{Op, Recorder};

    fn pool() -> Water {
        let mut water = Water::new(3);
        water.init(Viewport::new(800.0, 600.0), 0.0);
        water
    }

    #[test]
    fn cycles_rotate_through_all_five() {
        let mut water = pool();
        let mut seen = vec![water.cycle().number()];
        for step in 1..=5 {
            water.update(&Frame::new(step as f64 * CYCLE_MS, 0.016, step));
            seen.push(water.cycle().number());
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 1]);
    }

    #[test]
    fn cycle_holds_until_its_time_is_up() {
        let mut water = pool();
        water.update(&Frame::new(CYCLE_MS - 1.0, 0.016, 1));
        assert_eq!(water.cycle(), Cycle::RealityRipples);
        assert!(water.progress() > 0.99);
    }

    #[test]
    fn unbound_cycle_starts_calm() {
        let warp = Cycle::RealityUnbound.warp(0.0, 0.0);
        assert_eq!(warp.intensity, 0.0);
        assert_eq!(warp.amplitude, 0.0);
        assert!(Cycle::NeuralPulse.warp(0.0, 0.0).intensity > 0.7);
    }

    #[test]
    fn particles_stay_near_the_screen() {
        let mut water = pool();
        for i in 0..2000 {
            water.update(&Frame::new(i as f64 * 16.0, 0.016, i));
        }
        assert_eq!(water.particles().len(), PARTICLES);
        for p in water.particles() {
            let slack = p.size * 2.0 + 60.0;
            assert!(p.pos.x > -slack && p.pos.x < 800.0 + slack);
            assert!(p.pos.y > -slack && p.pos.y < 600.0 + slack);
        }
    }

    #[test]
    fn strong_warp_distorts_the_frame() {
        let mut water = pool();
        water.warp = Warp {
            intensity: 1.6,
            flow: 0.0,
            amplitude: 1.0,
            color_shift: 1.0,
        };
        let mut rec = Recorder::new();
        water.draw(&mut rec);
        assert_eq!(rec.count(|op| matches!(op, Op::Blit(..))), 3);
        assert_eq!(rec.count(|op| matches!(op, Op::Blend(Blend::Hue))), 1);
        assert_eq!(rec.texts().iter().filter(|t| **t == "REALITY RIPPLES").count(), 3);
    }

    #[test]
    fn calm_water_skips_effects() {
        let mut water = pool();
        water.warp = Warp::default();
        let mut rec = Recorder::new();
        water.draw(&mut rec);
        assert_eq!(rec.count(|op| matches!(op, Op::Blit(..))), 0);
        assert_eq!(rec.texts(), vec!["REALITY RIPPLES"]);
        assert!(rec.all_finite());
    }
}
