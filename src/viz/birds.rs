//! One-line gulls gliding over a night sky.

use crate::color::Rgb;
use crate::paint::{LineCap, Paint, Painter};
use crate::rng::Rng;
use crate::scene::{Frame, Scene, Viewport};
use glam::Vec2;
use std::f32::consts::{FRAC_PI_4, PI, TAU};

const BG_TOP: Rgb = Rgb::hex(0x0c1220);
const BG_BOTTOM: Rgb = Rgb::hex(0x1a2433);
const BIRD: Rgb = Rgb::hex(0xaabbcc);
const STARS: usize = 100;
const WRAP: f32 = 100.0;

/// Signed angle in `[-PI, PI)` that turns `from` onto `to` the short way.
pub fn shortest_turn(from: f32, to: f32) -> f32 {
    (to - from + PI).rem_euclid(TAU) - PI
}

#[derive(Clone, Debug)]
pub struct Bird {
    pub pos: Vec2,
    pub angle: f32,
    pub target_angle: f32,
    size: f32,
    speed: f32,
    turn_speed: f32,
    sin_offset: f32,
    sin_amplitude: f32,
    sin_frequency: f32,
    opacity: f32,
    wing_width: f32,
    wave_amplitude: f32,
}

impl Bird {
    fn new(pos: Vec2, rng: &mut Rng) -> Self {
        let angle = rng.angle();
        Self {
            pos,
            angle,
            target_angle: angle,
            size: rng.range(2.0, 4.0),
            speed: rng.range(0.4, 0.9),
            turn_speed: rng.range(0.002, 0.004),
            sin_offset: rng.angle(),
            sin_amplitude: rng.range(0.3, 0.5),
            sin_frequency: rng.range(0.005, 0.01),
            opacity: rng.range(0.4, 0.6),
            wing_width: rng.range(15.0, 25.0),
            wave_amplitude: rng.range(4.0, 7.0),
        }
    }

    fn update(&mut self, time: f32, viewport: Viewport, rng: &mut Rng) {
        if rng.chance(0.002) {
            self.target_angle = rng.angle();
        }
        self.angle += shortest_turn(self.angle, self.target_angle) * self.turn_speed;

        let sway = (time * self.sin_frequency + self.sin_offset).sin() * self.sin_amplitude;
        let vel = Vec2::new(
            self.angle.cos() * self.speed,
            self.angle.sin() * self.speed * 0.2 + sway * 0.05,
        );
        self.pos += vel;

        let (w, h) = (viewport.width, viewport.height);
        if self.pos.x > w + WRAP {
            self.pos.x = -WRAP;
        }
        if self.pos.x < -WRAP {
            self.pos.x = w + WRAP;
        }
        if self.pos.y > h + WRAP {
            self.pos.y = -WRAP;
        }
        if self.pos.y < -WRAP {
            self.pos.y = h + WRAP;
        }

        if self.pos.y > h * 0.7 && rng.chance(0.02) {
            self.target_angle = -FRAC_PI_4 + rng.signed(FRAC_PI_4);
        }
    }

    fn draw(&self, painter: &mut dyn Painter, time: f32) {
        let flap = (time * 0.5 + self.sin_offset).sin();
        let mid = flap * self.wave_amplitude / 2.0;
        let tip = flap * self.wave_amplitude * 1.5;
        let half = self.wing_width / 2.0;

        painter.save();
        painter.translate(self.pos.x, self.pos.y);
        painter.rotate(self.angle);
        painter.begin_path();
        painter.move_to(0.0, 0.0);
        painter.line_to(-half, mid);
        painter.line_to(-self.wing_width, tip);
        painter.move_to(0.0, 0.0);
        painter.line_to(half, mid);
        painter.line_to(self.wing_width, tip);
        painter.set_stroke(&BIRD.alpha(self.opacity).into());
        painter.set_line_width(self.size * 0.5);
        painter.set_line_cap(LineCap::Round);
        painter.stroke();
        painter.restore();
    }
}

pub struct Birds {
    rng: Rng,
    viewport: Viewport,
    birds: Vec<Bird>,
    time: f32,
}

impl Birds {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Rng::seeded(seed),
            viewport: Viewport::default(),
            birds: Vec::new(),
            time: 0.0,
        }
    }

    pub fn birds(&self) -> &[Bird] {
        &self.birds
    }

    fn draw_stars(&self, painter: &mut dyn Painter) {
        let t = self.time;
        let (w, h) = (self.viewport.width, self.viewport.height);
        painter.set_fill(&Rgb::WHITE.alpha(0.2).into());
        for i in 0..STARS {
            let i = i as f32;
            let x = ((i * 0.33 + t * 0.01).sin() * 0.5 + 0.5) * w;
            let y = ((i * 0.74 + t * 0.005).cos() * 0.5 + 0.5) * h;
            let r = ((i * 0.92 + t * 0.02).sin() * 0.5 + 0.5) * 1.5;
            painter.circle(x, y, r);
            painter.fill();
        }
    }
}

impl Scene for Birds {
    fn name(&self) -> &'static str {
        "birds"
    }

    fn init(&mut self, viewport: Viewport, _now_ms: f64) {
        self.viewport = viewport;
        self.time = 0.0;
        let count = 25 + self.rng.index(15);
        let rng = &mut self.rng;
        self.birds = (0..count)
            .map(|_| {
                let pos = Vec2::new(
                    rng.unit() * viewport.width,
                    rng.unit() * viewport.height * 0.8,
                );
                Bird::new(pos, rng)
            })
            .collect();
    }

    fn update(&mut self, _frame: &Frame) {
        self.time += 0.016;
        for bird in &mut self.birds {
            bird.update(self.time, self.viewport, &mut self.rng);
        }
    }

    fn draw(&self, painter: &mut dyn Painter) {
        painter.set_fill(&Paint::vertical(
            0.0,
            self.viewport.height,
            vec![(0.0, BG_TOP.opaque()), (1.0, BG_BOTTOM.opaque())],
        ));
        painter.fill_rect(0.0, 0.0, self.viewport.width, self.viewport.height);
        self.draw_stars(painter);
        for bird in &self.birds {
            bird.draw(painter, self.time);
        }
    }

    /// Birds keep flying; only the sky is resized.
    fn resize(&mut self, viewport: Viewport, _now_ms: f64) {
        self.viewport = viewport;
    }

    fn clear(&mut self) {
        self.birds = Vec::new();
    }

    fn entity_count(&self) -> usize {
        self.birds.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Recorder;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn turns_take_the_short_way_round() {
        assert!((shortest_turn(0.1, TAU - 0.1) + 0.2).abs() < 1e-5);
        assert!((shortest_turn(TAU - 0.1, 0.1) - 0.2).abs() < 1e-5);
        assert!((shortest_turn(0.0, FRAC_PI_2) - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn flock_size_and_start_band() {
        let mut scene = Birds::new(2);
        scene.init(Viewport::new(1000.0, 500.0), 0.0);
        assert!((25..40).contains(&scene.entity_count()));
        assert!(scene.birds().iter().all(|b| b.pos.y <= 400.0));
    }

    #[test]
    fn birds_stay_inside_the_wrap_margin() {
        let mut scene = Birds::new(6);
        scene.init(Viewport::new(800.0, 600.0), 0.0);
        for i in 0..5000 {
            scene.update(&Frame::tick(i));
        }
        for b in scene.birds() {
            assert!(b.pos.x >= -WRAP - 1.0 && b.pos.x <= 800.0 + WRAP + 1.0);
            assert!(b.pos.y >= -WRAP - 1.0 && b.pos.y <= 600.0 + WRAP + 1.0);
        }
    }

    #[test]
    fn every_bird_is_drawn_in_its_own_frame() {
        let mut scene = Birds::new(9);
        scene.init(Viewport::new(800.0, 600.0), 0.0);
        let mut rec = Recorder::new();
        scene.draw(&mut rec);
        assert!(rec.balanced());
        assert_eq!(
            rec.count(|op| matches!(op, crate::paint::Op::Rotate(_))),
            scene.entity_count()
        );
    }
}
