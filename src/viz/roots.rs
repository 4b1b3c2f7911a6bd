//! Roots reaching down from the top edge, splitting as they grow.

use crate::color::Rgb;
use crate::paint::{Paint, Painter};
use crate::rng::Rng;
use crate::scene::{Frame, Scene, Viewport};
use glam::Vec2;
use log::debug;
use std::f32::consts::{FRAC_PI_2, PI};

const EARTH: [Rgb; 5] = [
    Rgb::new(150, 120, 90),
    Rgb::new(120, 100, 70),
    Rgb::new(100, 80, 60),
    Rgb::new(130, 110, 80),
    Rgb::new(90, 70, 50),
];
const BG_TOP: Rgb = Rgb::hex(0x1a1209);
const BG_BOTTOM: Rgb = Rgb::hex(0x0a0804);

const MAX_DEPTH: u32 = 7;
const INITIAL_ROOTS: usize = 4;
pub const BRANCH_CAP: usize = 1000;
const DEEP_RESERVE: usize = 100;

#[derive(Clone, Debug)]
struct Hair {
    position: f32,
    length: f32,
    angle: f32,
}

#[derive(Clone, Debug)]
pub struct Branch {
    pub start: Vec2,
    pub angle: f32,
    pub length: f32,
    pub depth: u32,
    pub growth: f32,
    pub children: u32,
    color: Rgb,
    tip_color: Rgb,
    curve: f32,
    pulse: f32,
    waviness: f32,
    growth_speed: f32,
    growth_variation: f32,
    thickness: f32,
    segments: u32,
    tip_size: f32,
    hairs: Vec<Hair>,
    hairs_done: bool,
}

impl Branch {
    fn new(
        start: Vec2,
        angle: f32,
        length: f32,
        depth: u32,
        parent: Option<Rgb>,
        rng: &mut Rng,
    ) -> Self {
        let base = match parent {
            Some(c) => c,
            None => *rng.pick(&EARTH).unwrap_or(&EARTH[0]),
        };
        let color = base.offset(rng.signed(7.5), rng.signed(7.5), rng.signed(7.5));
        Self {
            start,
            angle,
            length,
            depth,
            growth: 0.0,
            children: 0,
            color,
            tip_color: color.offset(20.0, 15.0, 10.0),
            curve: rng.signed(0.2),
            pulse: rng.angle(),
            waviness: rng.unit() * 0.04,
            growth_speed: rng.range(0.01, 0.02),
            growth_variation: rng.range(0.7, 1.3),
            thickness: rng.range(0.8, 1.2),
            segments: 4 + rng.index(3) as u32,
            tip_size: rng.range(1.0, 2.5),
            hairs: Vec::new(),
            hairs_done: false,
        }
    }

    fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    /// Current growing tip.
    pub fn tip(&self) -> Vec2 {
        self.start + self.direction() * self.length * self.growth
    }

    /// Advance growth; false once fully grown.
    fn grow(&mut self, time: f32, rng: &mut Rng) -> bool {
        if self.growth >= 1.0 {
            return false;
        }
        let increase = self.growth_speed * (1.0 + (time * 0.8 + self.pulse).sin() * 0.1);
        self.growth += increase * self.growth_variation;
        if self.growth > 0.7 && !self.hairs_done && self.depth > 0 && rng.chance(0.6) {
            self.sprout_hairs(rng);
            self.hairs_done = true;
        }
        true
    }

    fn sprout_hairs(&mut self, rng: &mut Rng) {
        if self.depth < 3 {
            return;
        }
        let count = 2 + rng.index(5);
        for _ in 0..count {
            let length = rng.range(0.5, 1.5) * (5.0 - self.depth as f32);
            self.hairs.push(Hair {
                position: rng.unit(),
                length: length.max(1.0),
                angle: self.angle + rng.signed(FRAC_PI_2),
            });
        }
    }

    fn draw(&self, painter: &mut dyn Painter, time: f32) {
        if self.growth <= 0.0 {
            return;
        }
        let current = self.length * self.growth;
        let dir = self.direction();
        let step = current / self.segments as f32;
        let depth = self.depth as f32;
        let mut last = self.start;

        for i in 1..=self.segments {
            let t = i as f32 / self.segments as f32;
            let wobble = (time * 0.3 + self.pulse + t * 2.0).sin() * 0.01;
            let bend = self.angle + (time * 0.4 + self.pulse + t * PI).sin() * self.waviness + wobble;
            let end = self.start + dir * current * t;
            let sway = self.curve * (1.0 - t * 0.3);
            let mid = (last + end) / 2.0 + Vec2::from_angle(bend + FRAC_PI_2) * sway * step;

            let base_width = (1.0 - depth * 0.18) * self.thickness;
            let taper = (1.0 - t).powf(0.7);
            let width = (base_width * (2.2 - t * 1.2) * taper).max(0.6);

            let env = (time * 0.2 + end.x * 0.01 + end.y * 0.01).sin() * 0.05;
            let color = self.color.offset(env * 10.0, env * 10.0, env * 5.0);
            let alpha = ((0.7 - depth * 0.05) * (1.0 - t * 0.1)).clamp(0.4, 0.95);

            painter.begin_path();
            painter.move_to(last.x, last.y);
            painter.quadratic_to(mid.x, mid.y, end.x, end.y);
            painter.set_stroke(&color.alpha(alpha).into());
            painter.set_line_width(width);
            painter.stroke();
            last = end;
        }

        if self.growth < 0.95 {
            painter.circle(last.x, last.y, self.tip_size * (1.0 - depth * 0.1));
            painter.set_fill(&self.tip_color.alpha(0.7).into());
            painter.fill();
        }

        painter.set_stroke(&self.color.alpha(0.4).into());
        painter.set_line_width(0.5);
        for hair in &self.hairs {
            let root = self.start + dir * current * hair.position;
            let angle = hair.angle + (time * 0.5 + hair.position * 10.0).sin() * 0.1;
            painter.line(root, root + Vec2::from_angle(angle) * hair.length);
        }
    }
}

/// Loose soil kicked up where a root splits.
#[derive(Clone, Debug)]
pub struct Particle {
    pub pos: Vec2,
    vel: Vec2,
    size: f32,
    life: f32,
    max_life: f32,
    pub opacity: f32,
    color: Rgb,
}

impl Particle {
    fn new(pos: Vec2, color: Rgb, rng: &mut Rng) -> Self {
        Self {
            pos,
            vel: Vec2::new(rng.signed(0.75), rng.signed(0.75)),
            size: rng.range(0.5, 2.5),
            life: 1.0,
            max_life: rng.range(20.0, 60.0),
            opacity: 0.6,
            color,
        }
    }

    fn update(&mut self) {
        self.pos += self.vel;
        self.vel *= 0.98;
        self.life += 1.0;
        self.opacity = (0.6 * (1.0 - self.life / self.max_life)).max(0.0);
    }
}

pub struct Roots {
    rng: Rng,
    viewport: Viewport,
    branches: Vec<Branch>,
    particles: Vec<Particle>,
    time: f32,
}

impl Roots {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Rng::seeded(seed),
            viewport: Viewport::default(),
            branches: Vec::new(),
            particles: Vec::new(),
            time: 0.0,
        }
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn new_root(&mut self) -> Branch {
        let (w, h) = (self.viewport.width, self.viewport.height);
        let rng = &mut self.rng;
        let x = w * rng.range(0.2, 0.8);
        let angle = FRAC_PI_2 + rng.signed(0.25);
        let length = h * 0.2 + rng.unit() * 80.0;
        Branch::new(Vec2::new(x, -20.0), angle, length, 0, None, rng)
    }

    fn split(&mut self, index: usize) {
        let rng = &mut self.rng;
        let parent = &self.branches[index];
        let count = if rng.chance(0.5) {
            1
        } else if rng.chance(0.8) {
            2
        } else {
            3
        };
        let origin = parent.tip();
        let mut born = Vec::with_capacity(count);
        for i in 0..count {
            let (variation, factor) = if i == 0 && count > 1 {
                (rng.signed(PI * 0.15), rng.range(0.75, 1.05))
            } else {
                let mut v = rng.signed(PI * 0.3);
                if parent.angle < 0.0 || parent.angle > PI {
                    v += 0.3;
                }
                (v, rng.range(0.5, 0.9))
            };
            born.push(Branch::new(
                origin,
                parent.angle + variation,
                parent.length * factor,
                parent.depth + 1,
                Some(parent.color),
                rng,
            ));
        }
        let soil = parent.color;
        for _ in 0..3 + rng.index(4) {
            self.particles.push(Particle::new(origin, soil, rng));
        }
        self.branches[index].children = count as u32;
        self.branches.extend(born);
    }

    /// Thin the forest once it passes the cap, then hold it there.
    fn prune(&mut self) {
        if self.branches.len() <= BRANCH_CAP {
            return;
        }
        self.thin_deep();
        self.enforce_cap();
        debug!("roots: pruned to {} branches", self.branches.len());
    }

    /// Drop 5% of the fully grown deep branches.
    fn thin_deep(&mut self) {
        let deep = |b: &Branch| b.depth > 4 && b.growth >= 1.0;
        let deep_count = self.branches.iter().filter(|b| deep(b)).count();
        if deep_count <= DEEP_RESERVE {
            return;
        }
        let mut to_remove = (deep_count as f32 * 0.05).ceil() as usize;
        self.branches.retain(|b| {
            if to_remove > 0 && deep(b) {
                to_remove -= 1;
                false
            } else {
                true
            }
        });
    }

    /// Remove the oldest branches until at most `BRANCH_CAP` remain, finished ones first.
    fn enforce_cap(&mut self) {
        let mut excess = self.branches.len().saturating_sub(BRANCH_CAP);
        if excess == 0 {
            return;
        }
        self.branches.retain(|b| {
            if excess > 0 && b.growth >= 1.0 {
                excess -= 1;
                false
            } else {
                true
            }
        });
        if excess > 0 {
            self.branches.drain(..excess);
        }
    }
}

impl Scene for Roots {
    fn name(&self) -> &'static str {
        "roots"
    }

    fn init(&mut self, viewport: Viewport, _now_ms: f64) {
        self.viewport = viewport;
        self.time = 0.0;
        self.branches.clear();
        self.particles.clear();
        for _ in 0..INITIAL_ROOTS {
            let root = self.new_root();
            self.branches.push(root);
        }
    }

    fn update(&mut self, _frame: &Frame) {
        self.time += 0.016;

        let existing = self.branches.len();
        for i in 0..existing {
            let time = self.time;
            if !self.branches[i].grow(time, &mut self.rng) {
                continue;
            }
            let b = &self.branches[i];
            let p = 0.02 + b.growth * 0.05;
            if b.growth >= 0.3 && b.children == 0 && b.depth < MAX_DEPTH && self.rng.chance(p) {
                self.split(i);
            }
        }

        self.prune();

        for p in &mut self.particles {
            p.update();
        }
        self.particles.retain(|p| p.opacity > 0.0);

        let room = self.branches.len() < BRANCH_CAP;
        if room && (self.rng.chance(0.015) || (self.branches.len() < 15 && self.rng.chance(0.04))) {
            let root = self.new_root();
            self.branches.push(root);
        }
    }

    fn draw(&self, painter: &mut dyn Painter) {
        let (w, h) = (self.viewport.width, self.viewport.height);
        painter.set_fill(&Paint::vertical(
            0.0,
            h,
            vec![(0.0, BG_TOP.opaque()), (1.0, BG_BOTTOM.opaque())],
        ));
        painter.fill_rect(0.0, 0.0, w, h);

        let mut order: Vec<&Branch> = self.branches.iter().collect();
        order.sort_by_key(|b| b.depth);
        for branch in order {
            branch.draw(painter, self.time);
        }

        for p in &self.particles {
            painter.set_fill(&p.color.alpha(p.opacity).into());
            painter.circle(p.pos.x, p.pos.y, p.size);
            painter.fill();
        }
    }

    fn resize(&mut self, viewport: Viewport, _now_ms: f64) {
        self.viewport = viewport;
    }

    fn clear(&mut self) {
        self.branches = Vec::new();
        self.particles = Vec::new();
    }

    fn entity_count(&self) -> usize {
        self.branches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{Op, Recorder};

    fn grown(frames: u64) -> Roots {
        let mut roots = Roots::new(13);
        roots.init(Viewport::new(1200.0, 800.0), 0.0);
        for i in 0..frames {
            roots.update(&Frame::tick(i));
        }
        roots
    }

    #[test]
    fn starts_with_four_downward_roots() {
        let roots = grown(0);
        assert_eq!(roots.entity_count(), INITIAL_ROOTS);
        for b in roots.branches() {
            assert_eq!(b.start.y, -20.0);
            assert!((b.angle - FRAC_PI_2).abs() <= 0.25);
            assert!((240.0..=960.0).contains(&b.start.x));
        }
    }

    #[test]
    fn depth_never_exceeds_the_limit() {
        let roots = grown(1500);
        assert!(roots.branches().iter().all(|b| b.depth <= MAX_DEPTH));
        assert!(roots.branches().iter().any(|b| b.depth > 0));
    }

    #[test]
    fn splitting_kicks_up_soil() {
        let mut roots = grown(0);
        roots.branches[0].growth = 0.5;
        roots.split(0);
        assert!(roots.branches[0].children >= 1);
        assert!((3..=6).contains(&roots.particles().len()));
    }

    #[test]
    fn particles_fade_out() {
        let mut roots = grown(0);
        roots.split(0);
        for _ in 0..80 {
            for p in &mut roots.particles {
                p.update();
            }
            roots.particles.retain(|p| p.opacity > 0.0);
        }
        assert!(roots.particles().is_empty());
    }

    #[test]
    fn prune_trims_deep_grown_branches() {
        let mut roots = grown(0);
        let mut rng = Rng::seeded(1);
        roots.branches = (0..1200)
            .map(|i| {
                let mut b = Branch::new(Vec2::ZERO, FRAC_PI_2, 10.0, (i % 8) as u32, None, &mut rng);
                b.growth = 1.0;
                b
            })
            .collect();
        let deep_before = roots.branches().iter().filter(|b| b.depth > 4).count();
        roots.thin_deep();
        let deep_after = roots.branches().iter().filter(|b| b.depth > 4).count();
        assert_eq!(deep_before - deep_after, (deep_before as f32 * 0.05).ceil() as usize);
    }

    #[test]
    fn cap_evicts_oldest_finished_branches_first() {
        let mut roots = grown(0);
        let mut rng = Rng::seeded(2);
        roots.branches = (0..BRANCH_CAP + 50)
            .map(|i| {
                let mut b = Branch::new(Vec2::ZERO, FRAC_PI_2, i as f32, 1, None, &mut rng);
                b.growth = if i % 2 == 0 { 1.0 } else { 0.5 };
                b
            })
            .collect();
        roots.enforce_cap();
        assert_eq!(roots.entity_count(), BRANCH_CAP);
        assert_eq!(roots.branches()[0].length, 1.0);
        assert!(roots.branches().iter().filter(|b| b.length < 100.0).all(|b| b.growth < 1.0));
    }

    #[test]
    fn long_runs_stay_under_the_cap() {
        let mut roots = Roots::new(21);
        roots.init(Viewport::new(1200.0, 800.0), 0.0);
        for i in 0..20_000 {
            roots.update(&Frame::tick(i));
            assert!(roots.entity_count() <= BRANCH_CAP, "frame {}", i);
        }
    }

    #[test]
    fn draws_quadratic_segments() {
        let roots = grown(60);
        let mut rec = Recorder::new();
        roots.draw(&mut rec);
        assert!(rec.count(|op| matches!(op, Op::QuadraticTo(..))) >= INITIAL_ROOTS * 4);
        assert!(rec.all_finite());
    }
}
