//! Rows of right-angled trees growing from the left edge in bursts.

use crate::color::Rgb;
use crate::paint::{LineCap, Paint, Painter};
use crate::rng::{hash01, Rng};
use crate::scene::{Frame, Scene, Viewport};
use glam::Vec2;
use log::debug;
use std::collections::VecDeque;

const TREES: usize = 6;
const MIN_SPACING: f32 = 150.0;
const QUEUE_PER_FRAME: usize = 10;
const ACTIVE_PER_FRAME: usize = 60;
const MAX_BRANCH_ATTEMPTS: usize = 18;
const MAX_DEPTH: u32 = 25;
/// A tree past this many segments starts over.
pub const MAX_SEGMENTS: usize = 1500;
const CULL_MARGIN: f32 = 100.0;

const BG_TOP: Rgb = Rgb::hex(0x080a03);
const BG_BOTTOM: Rgb = Rgb::hex(0x101505);
const BRANCH: Rgb = Rgb::hex(0x5E4125);
const TIP: Rgb = Rgb::hex(0xD9A566);
const HIGHLIGHT: Rgb = Rgb::hex(0xF7CA45);
const GROWTH: Rgb = Rgb::hex(0xFFD700);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Heading {
    Right,
    Up,
    Down,
}

impl Heading {
    const ALL: [Heading; 3] = [Heading::Right, Heading::Up, Heading::Down];

    pub fn vector(self) -> Vec2 {
        match self {
            Heading::Right => Vec2::X,
            Heading::Up => Vec2::NEG_Y,
            Heading::Down => Vec2::Y,
        }
    }

    fn opposes(self, other: Heading) -> bool {
        self.vector() == -other.vector()
    }
}

#[derive(Clone, Debug)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
    pub length: f32,
    pub heading: Heading,
    pub depth: u32,
    pub progress: f32,
    pub age: u32,
    pub thickness: f32,
    pub branches: u32,
    pub parent: Option<usize>,
    /// Fully grown with no children yet.
    pub terminal: bool,
}

impl Segment {
    pub fn tip(&self) -> Vec2 {
        self.start.lerp(self.end, self.progress)
    }
}

pub struct Tree {
    index: usize,
    origin: Vec2,
    pub segments: Vec<Segment>,
    active: Vec<usize>,
    pending: VecDeque<usize>,
    growth_speed: f32,
    branching_chance: f32,
    rightward_bias: f32,
    thickness: f32,
    burst: Option<(u32, u32)>,
}

impl Tree {
    fn new(index: usize, spacing: f32, rng: &mut Rng) -> Self {
        let mut tree = Self {
            index,
            origin: Vec2::new(-50.0, spacing * (index + 1) as f32),
            segments: Vec::new(),
            active: Vec::new(),
            pending: VecDeque::new(),
            growth_speed: 0.0,
            branching_chance: 0.0,
            rightward_bias: 0.0,
            thickness: 0.0,
            burst: None,
        };
        tree.reset(spacing, rng);
        tree
    }

    fn reset(&mut self, spacing: f32, rng: &mut Rng) {
        self.origin = Vec2::new(-50.0, spacing * (self.index + 1) as f32);
        self.segments.clear();
        self.active.clear();
        self.pending.clear();
        self.growth_speed = rng.range(2.0, 7.0);
        self.branching_chance = rng.range(0.1, 0.35);
        self.rightward_bias = rng.range(0.4, 0.8);
        self.thickness = rng.range(2.5, 5.0);
        self.burst = None;

        let length = rng.range(70.0, 130.0);
        self.segments.push(Segment {
            start: self.origin,
            end: self.origin + Vec2::X * length,
            length,
            heading: Heading::Right,
            depth: 0,
            progress: 0.0,
            age: 0,
            thickness: self.thickness,
            branches: 0,
            parent: None,
            terminal: false,
        });
        self.active.push(0);
    }

    pub fn in_burst(&self) -> bool {
        self.burst.is_some()
    }

    fn trigger_burst(&mut self, rng: &mut Rng) {
        if self.burst.is_none() {
            self.burst = Some((0, 30 + rng.index(60) as u32));
        }
    }

    fn next_heading(&self, parent: Heading, rng: &mut Rng) -> Heading {
        if rng.chance(self.rightward_bias) {
            return if rng.chance(0.3) { parent } else { Heading::Right };
        }
        let valid: Vec<Heading> = Heading::ALL
            .into_iter()
            .filter(|h| !h.opposes(parent))
            .collect();
        rng.pick(&valid).copied().unwrap_or(Heading::Right)
    }

    fn add_segment(&mut self, parent_index: usize, rng: &mut Rng) {
        let Some(parent) = self.segments.get(parent_index) else {
            return;
        };
        let (start, depth, parent_heading) = (parent.end, parent.depth + 1, parent.heading);
        let heading = self.next_heading(parent_heading, rng);

        let base = rng.range(35.0, 80.0);
        let reduction = (depth as f32 * rng.unit() * 2.0).min(20.0);
        let length = (base - reduction).max(12.0);
        let thickness_factor = (1.0 - depth as f32 * rng.unit() * 0.08).max(0.15);

        let index = self.segments.len();
        self.segments.push(Segment {
            start,
            end: start + heading.vector() * length,
            length,
            heading,
            depth,
            progress: 0.0,
            age: 0,
            thickness: self.thickness * thickness_factor,
            branches: 0,
            parent: Some(parent_index),
            terminal: false,
        });
        self.active.push(index);

        let parent = &mut self.segments[parent_index];
        parent.branches += 1;
        parent.terminal = false;
    }

    fn terminals(&self) -> Vec<usize> {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.terminal)
            .map(|(i, _)| i)
            .collect()
    }

    fn update(&mut self, rng: &mut Rng) {
        for _ in 0..self.pending.len().min(QUEUE_PER_FRAME) {
            if let Some(parent) = self.pending.pop_front() {
                self.add_segment(parent, rng);
            }
        }

        if let Some((timer, duration)) = &mut self.burst {
            *timer += 1;
            if *timer >= *duration {
                self.burst = None;
            }
        }
        if self.burst.is_none() && rng.chance(0.015) {
            self.trigger_burst(rng);
        }

        let mut completed = Vec::new();
        for &i in self.active.iter().take(ACTIVE_PER_FRAME) {
            let seg = &mut self.segments[i];
            seg.age += 1;
            if seg.progress < 1.0 {
                let factor = if self.burst.is_some() { 2.0 } else { rng.range(0.7, 1.3) };
                seg.progress += self.growth_speed * factor / seg.length.max(20.0);
                if seg.progress >= 1.0 {
                    seg.progress = 1.0;
                    seg.terminal = true;
                    completed.push(i);
                }
            }
        }

        let mut attempts = 0;
        for &i in &completed {
            if attempts >= MAX_BRANCH_ATTEMPTS {
                break;
            }
            if self.segments[i].branches != 0 {
                continue;
            }
            let roll = rng.unit();
            let chance = self.branching_chance;
            for threshold in [1.0, 0.3, 0.1] {
                if roll < chance * threshold {
                    self.pending.push_back(i);
                    attempts += 1;
                } else {
                    break;
                }
            }
        }
        self.active.retain(|i| !completed.contains(i));

        if attempts < MAX_BRANCH_ATTEMPTS {
            let mut tips = self.terminals();
            rng.shuffle(&mut tips);
            for &i in tips.iter().take(MAX_BRANCH_ATTEMPTS - attempts) {
                if attempts >= MAX_BRANCH_ATTEMPTS {
                    break;
                }
                let seg = &self.segments[i];
                if seg.depth > MAX_DEPTH || seg.branches >= 2 {
                    continue;
                }
                let mut chance = self.branching_chance * rng.range(0.3, 0.7);
                if seg.heading == Heading::Right {
                    chance *= rng.range(0.8, 1.2);
                }
                chance *= (1.0 - seg.depth as f32 * 0.03).max(0.15);
                if rng.chance(chance) {
                    self.pending.push_back(i);
                    attempts += 1;
                }
            }
        }

        if self.active.is_empty() && self.pending.is_empty() {
            if let Some(&i) = rng.pick(&self.terminals()) {
                self.pending.push_back(i);
            }
        }
    }

    /// True once the tree can no longer add anything visible.
    fn spent(&self, width: f32) -> bool {
        if self.segments.len() >= MAX_SEGMENTS {
            return true;
        }
        let mut fronts = self
            .active
            .iter()
            .chain(self.pending.iter())
            .map(|&i| &self.segments[i])
            .chain(self.segments.iter().filter(|s| s.terminal))
            .peekable();
        fronts.peek().is_none() || fronts.all(|s| s.start.x > width + CULL_MARGIN)
    }

    fn draw(&self, painter: &mut dyn Painter, viewport: Viewport) {
        let min = Vec2::splat(-CULL_MARGIN);
        let max = Vec2::new(viewport.width, viewport.height) + CULL_MARGIN;
        let burst = self.in_burst();
        painter.set_line_cap(LineCap::Square);

        for (i, seg) in self.segments.iter().enumerate() {
            if seg.progress <= 0.0 {
                continue;
            }
            let tip = seg.tip();
            if (seg.start.x < min.x && tip.x < min.x)
                || (seg.start.x > max.x && tip.x > max.x)
                || (seg.start.y < min.y && tip.y < min.y)
                || (seg.start.y > max.y && tip.y > max.y)
            {
                continue;
            }

            let (speed, amount) = if burst { (0.2, 0.15) } else { (0.01, 0.05) };
            let thickness = seg.thickness * (1.0 + (seg.age as f32 * speed).sin() * amount);

            let color = if seg.progress < 1.0 {
                let c = TIP.lerp(GROWTH, 1.0 - seg.progress);
                if burst {
                    c.scale(1.2)
                } else {
                    c
                }
            } else if seg.branches == 0 {
                if seg.terminal {
                    TIP.lerp(HIGHLIGHT, 0.2 + (seg.age as f32 * 0.05).sin() * 0.1)
                } else {
                    TIP
                }
            } else {
                let noise = hash01(i as u32 ^ (self.index as u32) << 20, seg.age);
                let mut c = BRANCH;
                if noise < 0.02 {
                    c = c.lerp(HIGHLIGHT, 0.15 + noise * 7.5);
                }
                if burst {
                    c = c.lerp(HIGHLIGHT, 0.1 + hash01(seg.age, i as u32) * 0.1);
                }
                c
            };

            painter.set_stroke(&color.alpha(0.95).into());
            painter.set_line_width(thickness);
            painter.line(seg.start, tip);

            if seg.progress < 1.0 {
                let glow = thickness * 2.5;
                painter.set_fill(&Paint::Radial {
                    center: tip,
                    inner: 0.0,
                    outer: glow,
                    stops: vec![(0.0, GROWTH.alpha(0.8)), (1.0, GROWTH.alpha(0.0))],
                });
                painter.circle(tip.x, tip.y, glow);
                painter.fill();
            }
        }
    }
}

pub struct BinaryTrees {
    rng: Rng,
    viewport: Viewport,
    trees: Vec<Tree>,
    pulse_timer: u32,
}

impl BinaryTrees {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Rng::seeded(seed),
            viewport: Viewport::default(),
            trees: Vec::new(),
            pulse_timer: 0,
        }
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    fn spacing(&self) -> f32 {
        MIN_SPACING.max(self.viewport.height / (TREES + 1) as f32)
    }
}

impl Scene for BinaryTrees {
    fn name(&self) -> &'static str {
        "binary-trees"
    }

    fn init(&mut self, viewport: Viewport, _now_ms: f64) {
        self.viewport = viewport;
        self.pulse_timer = 0;
        let spacing = self.spacing();
        let rng = &mut self.rng;
        self.trees = (0..TREES).map(|i| Tree::new(i, spacing, rng)).collect();
    }

    fn update(&mut self, _frame: &Frame) {
        self.pulse_timer += 1;
        if self.pulse_timer > 500 && self.rng.chance(0.01) {
            self.pulse_timer = 0;
            for tree in &mut self.trees {
                if self.rng.chance(0.7) {
                    tree.trigger_burst(&mut self.rng);
                }
            }
        }

        let spacing = self.spacing();
        let width = self.viewport.width;
        for tree in &mut self.trees {
            tree.update(&mut self.rng);
            if tree.spent(width) {
                debug!("binary trees: tree {} restarts", tree.index);
                tree.reset(spacing, &mut self.rng);
            }
        }
    }

    fn draw(&self, painter: &mut dyn Painter) {
        painter.set_fill(&Paint::vertical(
            0.0,
            self.viewport.height,
            vec![(0.0, BG_TOP.opaque()), (1.0, BG_BOTTOM.opaque())],
        ));
        painter.fill_rect(0.0, 0.0, self.viewport.width, self.viewport.height);
        for tree in &self.trees {
            tree.draw(painter, self.viewport);
        }
    }

    fn clear(&mut self) {
        self.trees = Vec::new();
    }

    fn entity_count(&self) -> usize {
        self.trees.iter().map(|t| t.segments.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{Op, Recorder};

    fn grown(frames: u64) -> BinaryTrees {
        let mut scene = BinaryTrees::new(8);
        scene.init(Viewport::new(1400.0, 900.0), 0.0);
        for i in 0..frames {
            scene.update(&Frame::tick(i));
        }
        scene
    }

    #[test]
    fn trees_are_spaced_down_the_left_edge() {
        let scene = grown(0);
        assert_eq!(scene.trees().len(), TREES);
        let spacing = 900.0 / 7.0_f32;
        for (i, tree) in scene.trees().iter().enumerate() {
            let root = &tree.segments[0];
            assert_eq!(root.start.x, -50.0);
            assert!((root.start.y - spacing.max(MIN_SPACING) * (i + 1) as f32).abs() < 1e-3);
        }
    }

    #[test]
    fn children_never_turn_back() {
        let scene = grown(400);
        for tree in scene.trees() {
            for seg in &tree.segments {
                if let Some(p) = seg.parent {
                    let parent = &tree.segments[p];
                    assert!(!seg.heading.opposes(parent.heading));
                    assert_eq!(seg.start, parent.end);
                    assert_eq!(seg.depth, parent.depth + 1);
                }
            }
        }
    }

    #[test]
    fn segment_lengths_and_thickness_stay_in_range() {
        let scene = grown(400);
        for tree in scene.trees() {
            for seg in tree.segments.iter().skip(1) {
                assert!((12.0..=80.0).contains(&seg.length));
                assert!(seg.thickness > 0.0);
            }
        }
    }

    #[test]
    fn trees_stay_bounded() {
        let scene = grown(3000);
        for tree in scene.trees() {
            assert!(tree.segments.len() < MAX_SEGMENTS + QUEUE_PER_FRAME);
        }
    }

    #[test]
    fn growth_never_stalls() {
        let scene = grown(600);
        assert!(scene.entity_count() > TREES);
    }

    #[test]
    fn draw_uses_square_caps_and_finite_geometry() {
        let scene = grown(120);
        let mut rec = Recorder::new();
        scene.draw(&mut rec);
        assert!(rec.ops.contains(&Op::Cap(LineCap::Square)));
        assert!(rec.count(|op| *op == Op::StrokePath) > 0);
        assert!(rec.all_finite());
    }
}
