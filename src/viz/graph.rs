//! Drifting nodes linked by proximity edges; clicks release bursts of nodes.

use crate::color::Rgb;
use crate::grid::SpatialHash;
use crate::paint::{Paint, Painter};
use crate::rng::Rng;
use crate::scene::{Frame, InputEvent, Scene, Viewport};
use glam::Vec2;
use std::f32::consts::TAU;

const NODE_COUNT: usize = 150;
const MAX_NODES: usize = 250;
const BURST: usize = 12;
pub const LINK_DISTANCE: f32 = 150.0;
const WRAP: f32 = 50.0;

#[derive(Clone, Debug)]
pub struct Node {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub dist: f32,
}

pub struct Graph {
    rng: Rng,
    viewport: Viewport,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    grid: SpatialHash,
}

impl Graph {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Rng::seeded(seed),
            viewport: Viewport::default(),
            nodes: Vec::new(),
            edges: Vec::new(),
            grid: SpatialHash::new(LINK_DISTANCE),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    fn random_node(&mut self) -> Node {
        Node {
            pos: Vec2::new(
                self.rng.unit() * self.viewport.width,
                self.rng.unit() * self.viewport.height,
            ),
            vel: Vec2::new(self.rng.signed(0.15), self.rng.signed(0.15)),
            radius: self.rng.range(1.5, 3.0),
        }
    }

    /// Ring of faster, larger nodes radiating out of `at`.
    pub fn burst(&mut self, at: Vec2) {
        for i in 0..BURST {
            let angle = i as f32 / BURST as f32 * TAU;
            let dir = Vec2::from_angle(angle);
            let distance = self.rng.range(5.0, 15.0);
            let speed = self.rng.range(0.5, 1.5);
            let mut node = self.random_node();
            node.pos = at + dir * distance;
            node.vel = dir * speed;
            node.radius = self.rng.range(2.0, 4.0);
            self.nodes.push(node);
        }
    }

    fn link(&mut self) {
        self.grid.clear();
        for (i, n) in self.nodes.iter().enumerate() {
            self.grid.insert(i, n.pos.extend(0.0));
        }
        self.edges.clear();
        for (i, a) in self.nodes.iter().enumerate() {
            for j in self.grid.neighbors(a.pos.extend(0.0)) {
                if j <= i {
                    continue;
                }
                let dist = a.pos.distance(self.nodes[j].pos);
                if dist < LINK_DISTANCE {
                    self.edges.push(Edge { from: i, to: j, dist });
                }
            }
        }
    }
}

impl Scene for Graph {
    fn name(&self) -> &'static str {
        "graph"
    }

    fn init(&mut self, viewport: Viewport, _now_ms: f64) {
        self.viewport = viewport;
        self.nodes.clear();
        for _ in 0..NODE_COUNT {
            let node = self.random_node();
            self.nodes.push(node);
        }
        self.link();
    }

    fn update(&mut self, frame: &Frame) {
        let t = (frame.now_ms * 0.0001) as f32;
        let flow = Vec2::new((t * 0.3).sin() * 0.01, (t * 0.2).cos() * 0.01);
        let (w, h) = (self.viewport.width, self.viewport.height);

        for node in &mut self.nodes {
            node.pos += node.vel;
            node.vel += flow;
            if node.pos.x < -WRAP {
                node.pos.x = w + WRAP;
            }
            if node.pos.x > w + WRAP {
                node.pos.x = -WRAP;
            }
            if node.pos.y < -WRAP {
                node.pos.y = h + WRAP;
            }
            if node.pos.y > h + WRAP {
                node.pos.y = -WRAP;
            }
            node.vel *= 0.99;
            node.vel += Vec2::new(self.rng.signed(0.005), self.rng.signed(0.005));
        }

        if self.nodes.len() > MAX_NODES {
            let excess = self.nodes.len() - MAX_NODES;
            self.nodes.drain(..excess);
        }
        self.link();
    }

    fn draw(&self, painter: &mut dyn Painter) {
        let (w, h) = (self.viewport.width, self.viewport.height);
        painter.clear();
        painter.set_fill(&Paint::Linear {
            from: Vec2::ZERO,
            to: Vec2::new(w, h),
            stops: vec![
                (0.0, Rgb::hex(0x111111).opaque()),
                (1.0, Rgb::hex(0x121220).opaque()),
            ],
        });
        painter.fill_rect(0.0, 0.0, w, h);

        painter.set_line_width(0.5);
        for e in &self.edges {
            let opacity = 0.15 * (1.0 - e.dist / LINK_DISTANCE);
            painter.set_stroke(&Rgb::WHITE.alpha(opacity).into());
            painter.line(self.nodes[e.from].pos, self.nodes[e.to].pos);
        }

        painter.set_fill(&Rgb::WHITE.alpha(0.7).into());
        for n in &self.nodes {
            painter.circle(n.pos.x, n.pos.y, n.radius);
            painter.fill();
        }
    }

    fn input(&mut self, event: &InputEvent) {
        if let InputEvent::Click(p) = event {
            self.burst(*p);
        }
    }

    fn clear(&mut self) {
        self.nodes = Vec::new();
        self.edges = Vec::new();
        self.grid.reset();
    }

    fn entity_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Graph {
        let mut g = Graph::new(4);
        g.init(Viewport::new(1024.0, 768.0), 0.0);
        g
    }

    #[test]
    fn edges_match_brute_force() {
        let g = scene();
        let mut expected = 0;
        for i in 0..g.nodes().len() {
            for j in i + 1..g.nodes().len() {
                if g.nodes()[i].pos.distance(g.nodes()[j].pos) < LINK_DISTANCE {
                    expected += 1;
                }
            }
        }
        assert_eq!(g.edges().len(), expected);
        assert!(g.edges().iter().all(|e| e.from < e.to && e.dist < LINK_DISTANCE));
    }

    #[test]
    fn click_adds_a_burst() {
        let mut g = scene();
        g.input(&InputEvent::Click(Vec2::new(300.0, 300.0)));
        assert_eq!(g.entity_count(), NODE_COUNT + BURST);
        let burst = &g.nodes()[NODE_COUNT..];
        assert!(burst.iter().all(|n| n.pos.distance(Vec2::new(300.0, 300.0)) <= 15.0));
        assert!(burst.iter().all(|n| n.radius >= 2.0));
    }

    #[test]
    fn node_count_is_capped_dropping_oldest() {
        let mut g = scene();
        for _ in 0..12 {
            g.input(&InputEvent::Click(Vec2::new(10.0, 10.0)));
        }
        let newest = g.nodes().last().map(|n| n.radius);
        g.update(&Frame::tick(1));
        assert_eq!(g.entity_count(), MAX_NODES);
        assert_eq!(g.nodes().last().map(|n| n.radius), newest);
    }

    #[test]
    fn nodes_wrap_around_the_margin() {
        let mut g = scene();
        g.nodes[0].pos = Vec2::new(-60.0, 100.0);
        g.nodes[0].vel = Vec2::ZERO;
        g.update(&Frame::tick(1));
        assert_eq!(g.nodes()[0].pos.x, 1024.0 + WRAP);
    }
}
