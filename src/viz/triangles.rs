//! Drifting triangles coloured by a running k-means clustering, with
//! boids-style alignment between nearest neighbours. Rendered through WebGL.

use crate::color::Rgb;
use crate::mesh::{Batch, Mesh, Primitive};
use crate::paint::{Painter, TextAlign};
use crate::rng::Rng;
use crate::scene::{Frame, InputEvent, Profile, Scene, Surface, Viewport};
use glam::{Mat4, Vec2, Vec3};
use log::info;
use std::f32::consts::{PI, TAU};

pub const K: usize = 4;
const CLUSTER_COLORS: [[f32; 3]; K] = [
    [0.2, 0.9, 0.3],
    [0.3, 0.5, 0.95],
    [0.95, 0.4, 0.3],
    [0.95, 0.85, 0.2],
];
const CLEAR: [f32; 4] = [0.04, 0.09, 0.18, 1.0];

const FOV: f32 = 45.0 * PI / 180.0;
const Z_AVG: f32 = -15.0;
const Z_MIN: f32 = -20.0;
const Z_MAX: f32 = -9.0;
const MARGIN: f32 = 0.05;
const OUTER_RADIUS: f32 = 13.5;
const CLUSTER_EVERY: u64 = 5;
const NEIGHBOR_EVERY: u64 = 30;
const NEIGHBORS: usize = 3;
/// Simulated seconds the scene has already been running at init.
const HEAD_START: f64 = 60.0;

/// Container and visible extents at the average triangle depth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub visible_right: f32,
    pub visible_top: f32,
}

impl Bounds {
    pub fn new(aspect: f32) -> Self {
        let y_max = (FOV / 2.0).tan() * Z_AVG.abs();
        let x_max = y_max * aspect;
        Self {
            left: -x_max * (1.0 + MARGIN),
            right: x_max * (1.0 + MARGIN),
            top: y_max * (1.0 + MARGIN),
            bottom: -y_max * (1.0 + MARGIN),
            visible_right: x_max,
            visible_top: y_max,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// Edge anchors each cluster drifts toward: right, top, left, bottom.
    fn regions(&self) -> [Vec2; K] {
        let x = self.visible_right * 1.05;
        let y = self.visible_top * 1.05;
        [
            Vec2::new(x, 0.0),
            Vec2::new(0.0, y),
            Vec2::new(-x, 0.0),
            Vec2::new(0.0, -y),
        ]
    }
}

#[derive(Clone, Debug)]
pub struct Triangle {
    pub pos: Vec3,
    pub vel: Vec3,
    pub size: f32,
    initial_size: f32,
    pub angle: f32,
    rotation_speed: f32,
    offset: f32,
    flow_speed: f32,
    neighbor_influence: f32,
    scene_interaction: f32,
    pub cluster: usize,
    pub neighbors: Vec<usize>,
}

impl Triangle {
    fn corners(&self) -> [Vec3; 3] {
        let s = self.size;
        let (sin, cos) = self.angle.sin_cos();
        [Vec2::new(0.0, s), Vec2::new(-s, -s), Vec2::new(s, -s)].map(|p| {
            let r = Vec2::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos);
            self.pos + r.extend(0.0)
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Centroid {
    pub pos: Vec2,
    pub vel: Vec2,
    pub target: Vec2,
}

/// Index of the centroid closest to `p` in the xy plane.
pub fn nearest_centroid(p: Vec2, centroids: &[Centroid]) -> usize {
    centroids
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.pos.distance(p).total_cmp(&b.1.pos.distance(p)))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[derive(Clone, Copy, Debug, Default)]
struct Camera {
    offset: Vec2,
    target: Vec2,
    velocity: Vec2,
    pending: Vec2,
    dragging: bool,
    last: Vec2,
}

pub struct Triangles {
    profile: Profile,
    rng: Rng,
    viewport: Viewport,
    bounds: Bounds,
    triangles: Vec<Triangle>,
    centroids: Vec<Centroid>,
    camera: Camera,
    start_ms: f64,
    ticks: u64,
    show_bounds: bool,
}

impl Triangles {
    pub fn new(profile: Profile, seed: u64) -> Self {
        let viewport = Viewport::default();
        Self {
            profile,
            rng: Rng::seeded(seed),
            viewport,
            bounds: Bounds::new(viewport.aspect()),
            triangles: Vec::new(),
            centroids: Vec::new(),
            camera: Camera::default(),
            start_ms: 0.0,
            ticks: 0,
            show_bounds: false,
        }
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn centroids(&self) -> &[Centroid] {
        &self.centroids
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn camera_offset(&self) -> Vec2 {
        self.camera.offset
    }

    fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(FOV, self.viewport.aspect(), 0.1, 100.0)
    }

    /// Centroids start beyond the screen edges, as if already on their way in.
    fn seed_centroids(&mut self, t: f32) {
        let x_max = self.bounds.visible_right * 1.2;
        let y_max = self.bounds.visible_top * 1.2;
        let c = |pos: Vec2, vel: Vec2, target: Vec2| Centroid { pos, vel, target };
        self.centroids = vec![
            c(
                Vec2::new(x_max * 0.7, t.sin() * 3.0),
                Vec2::new(-0.2 + (t * 0.5).sin() * 0.1, (t * 0.7).cos() * 0.15),
                Vec2::new(x_max * 0.5, (t + 1.0).sin() * 5.0),
            ),
            c(
                Vec2::new((t * 0.8).cos() * 6.0, y_max * 0.6),
                Vec2::new((t * 1.2).sin() * 0.1, -0.25),
                Vec2::new(t.cos() * 4.0, y_max * 0.3),
            ),
            c(
                Vec2::new(-x_max * 0.8, (t * 0.6).cos() * 4.0),
                Vec2::new(0.2, (t * 0.9).sin() * 0.15),
                Vec2::new(-x_max * 0.5, (t + 2.0).cos() * 4.0),
            ),
            c(
                Vec2::new((t * 1.1).sin() * 5.0, -y_max * 0.7),
                Vec2::new((t * 0.7).cos() * 0.1, 0.18 + t.sin() * 0.05),
                Vec2::new((t + 3.0).sin() * 3.0, -y_max * 0.4),
            ),
        ];
    }

    /// Jittered grid covering the container.
    fn seed_triangles(&mut self) {
        let count: usize = self.profile.pick(150, 80);
        let b = self.bounds;
        let aspect = self.viewport.aspect();
        let columns = ((count as f32 * aspect).sqrt().ceil() as usize).max(1);
        let rows = count.div_ceil(columns);
        let x_spacing = b.width() / (columns + 1) as f32;
        let y_spacing = b.height() / (rows + 1) as f32;
        let spacing = x_spacing.min(y_spacing);
        let base_size = spacing * 0.3;
        let jitter = spacing * 0.12;

        let rng = &mut self.rng;
        self.triangles = (0..count)
            .map(|n| {
                let col = n % columns + 1;
                let row = n / columns + 1;
                let x = b.left + x_spacing * col as f32;
                let y = b.bottom + y_spacing * row as f32;
                let z = Z_AVG - rng.unit() * 5.0;
                let size = base_size * rng.range(0.85, 1.15);
                let angle = rng.angle();
                Triangle {
                    pos: Vec3::new(
                        x + rng.signed(jitter / 2.0) + rng.signed(0.75),
                        y + rng.signed(jitter / 2.0) + rng.signed(0.75),
                        z + rng.signed(1.0),
                    ),
                    vel: Vec3::new(
                        rng.signed(0.05) + 0.02 * angle.sin(),
                        rng.signed(0.05) + 0.02 * angle.cos(),
                        rng.signed(0.015),
                    ),
                    size,
                    initial_size: size,
                    angle,
                    rotation_speed: rng.signed(0.15),
                    offset: rng.angle(),
                    flow_speed: rng.range(0.05, 0.13),
                    neighbor_influence: rng.range(0.5, 1.0),
                    scene_interaction: rng.range(0.05, 0.15),
                    cluster: 0,
                    neighbors: Vec::with_capacity(NEIGHBORS),
                }
            })
            .collect();
    }

    fn assign_clusters(&mut self) {
        for tri in &mut self.triangles {
            tri.cluster = nearest_centroid(tri.pos.truncate(), &self.centroids);
        }
    }

    fn update_centroids(&mut self, now_ms: f64) {
        let mut sums = [(Vec2::ZERO, 0usize); K];
        for tri in &self.triangles {
            let slot = &mut sums[tri.cluster];
            slot.0 += tri.pos.truncate();
            slot.1 += 1;
        }

        let regions = self.bounds.regions();
        let edge = Vec2::new(regions[0].x, regions[1].y);
        for (i, c) in self.centroids.iter_mut().enumerate() {
            let region = regions[i];
            let (sum, count) = sums[i];
            c.target = if count == 0 {
                region * 0.9
            } else if c.pos.x.abs() < edge.x && c.pos.y.abs() < edge.y {
                let avg = sum / count as f32;
                let anchor = region * 0.5;
                let d = avg - anchor;
                let max_distance = 6.0;
                if d.length() > max_distance {
                    anchor + d * (max_distance / d.length())
                } else {
                    avg
                }
            } else {
                region * 0.8
            };
        }

        let time = (now_ms * 0.0002) as f32;
        for (i, c) in self.centroids.iter_mut().enumerate().skip(1) {
            let phase = time + i as f32 / K as f32 * TAU;
            c.target += Vec2::new(phase.sin() * 1.0, (phase * 1.3).cos() * 0.8);
        }

        for c in &mut self.centroids {
            c.vel += (c.target - c.pos) * 0.15 / 60.0;
            c.vel *= 0.94;
            c.pos += c.vel;
        }
    }

    fn refresh_neighbors(&mut self) {
        let positions: Vec<Vec3> = self.triangles.iter().map(|t| t.pos).collect();
        let mut order: Vec<(f32, usize)> = Vec::with_capacity(positions.len());
        for (i, tri) in self.triangles.iter_mut().enumerate() {
            order.clear();
            order.extend(
                positions
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(j, p)| (p.distance_squared(positions[i]), j)),
            );
            let keep = NEIGHBORS.min(order.len());
            if keep > 0 && keep < order.len() {
                order.select_nth_unstable_by(keep - 1, |a, b| a.0.total_cmp(&b.0));
            }
            order[..keep].sort_by(|a, b| a.0.total_cmp(&b.0));
            tri.neighbors.clear();
            tri.neighbors.extend(order[..keep].iter().map(|&(_, j)| j));
        }
    }

    fn step_triangles(&mut self, dt: f32, elapsed: f32) {
        let b = self.bounds;
        let projection = self.projection();
        let scene_time = elapsed * 0.1;
        let scene_phase = scene_time.sin() * 0.5 + 0.5;
        let scene_pulse = (scene_time * 0.25).sin() * 0.5 + 0.5;
        let velocities: Vec<Vec3> = self.triangles.iter().map(|t| t.vel).collect();

        for tri in &mut self.triangles {
            tri.angle += tri.rotation_speed * dt * 0.05;

            let t = elapsed * tri.flow_speed;
            let influence = 1.0 + tri.scene_interaction * scene_pulse;
            tri.vel.x += (t + tri.offset).sin() * 0.002 * influence;
            tri.vel.y += (t * 1.2 + tri.offset).cos() * 0.0015 * influence;
            tri.vel.z += self.rng.signed(0.001);

            if !tri.neighbors.is_empty() {
                let avg = tri
                    .neighbors
                    .iter()
                    .map(|&j| velocities[j].truncate())
                    .sum::<Vec2>()
                    / tri.neighbors.len() as f32;
                let strength = 0.001 * tri.neighbor_influence;
                let nudge = (avg - tri.vel.truncate()) * strength;
                tri.vel.x += nudge.x;
                tri.vel.y += nudge.y;
            }

            let edges = [
                (tri.pos.x - b.left).abs(),
                (tri.pos.x - b.right).abs(),
                (tri.pos.y - b.top).abs(),
                (tri.pos.y - b.bottom).abs(),
            ];
            let (closest, dist) = edges
                .iter()
                .copied()
                .enumerate()
                .fold((0, f32::MAX), |best, (i, d)| if d < best.1 { (i, d) } else { best });
            if dist < 1.5 {
                let force = 0.002 * (1.0 - dist / 2.0);
                match closest {
                    0 => tri.vel.x += force,
                    1 => tri.vel.x -= force,
                    2 => tri.vel.y -= force,
                    _ => tri.vel.y += force,
                }
            }

            let flat = tri.pos.truncate();
            let from_center = flat.length();
            if from_center > OUTER_RADIUS {
                let attraction = 0.002 * (1.0 + scene_pulse * 0.2);
                let strength = attraction * (from_center - OUTER_RADIUS) / 10.0;
                let pull = flat / from_center * strength;
                tri.vel.x -= pull.x;
                tri.vel.y -= pull.y;
            }

            let move_scale = 0.2 * (1.0 + scene_phase * 0.1);
            tri.pos += tri.vel * dt * move_scale;
            tri.vel *= 0.998;

            let size_pulse = (elapsed * 0.05 + tri.offset).sin();
            tri.size = tri.initial_size
                * (0.98 + size_pulse * 0.04 + scene_pulse * 0.03 * tri.scene_interaction);

            if tri.pos.z < Z_MIN || tri.pos.z > Z_MAX {
                tri.vel.z *= -0.7;
                tri.pos.z = tri.pos.z.clamp(Z_MIN, Z_MAX);
            }

            contain(tri, &projection);
        }
    }

    fn step_camera(&mut self, dt: f32) {
        let cam = &mut self.camera;
        if dt > 0.0 && cam.pending != Vec2::ZERO {
            cam.velocity = cam.pending / dt;
            cam.pending = Vec2::ZERO;
        }
        if !cam.dragging {
            cam.target += cam.velocity * dt;
            cam.velocity *= 0.1f32.powf(dt);
        }
        cam.offset += (cam.target - cam.offset) * 0.1;
    }

    fn clamp_centroids(&mut self) {
        let b = self.bounds;
        for c in &mut self.centroids {
            c.pos.x = c.pos.x.clamp(b.left + 1.0, b.right - 1.0);
            c.pos.y = c.pos.y.clamp(b.bottom + 1.0, b.top - 1.0);
        }
    }
}

/// Pull a triangle back when its projected footprint leaves clip space.
fn contain(tri: &mut Triangle, projection: &Mat4) {
    let ndc = tri.corners().map(|p| projection.project_point3(p));
    let min = ndc.iter().fold(Vec2::splat(f32::MAX), |m, p| m.min(p.truncate()));
    let max = ndc.iter().fold(Vec2::splat(f32::MIN), |m, p| m.max(p.truncate()));

    if max.x < -1.0 || min.x > 1.0 || max.y < -1.0 || min.y > 1.0 {
        let center = (min + max) / 2.0;
        let dir = Vec2::new(
            if center.x > 0.0 { -1.0 } else { 1.0 },
            if center.y > 0.0 { -1.0 } else { 1.0 },
        );
        tri.pos.x += dir.x * 0.7;
        tri.pos.y += dir.y * 0.7;
        tri.vel.x = dir.x * tri.vel.x.abs() * 0.7;
        tri.vel.y = dir.y * tri.vel.y.abs() * 0.7;
        return;
    }

    let correct = |lo: f32, hi: f32| {
        if lo < -1.0 {
            -1.0 - lo
        } else if hi > 1.0 {
            1.0 - hi
        } else {
            0.0
        }
    };
    let cx = correct(min.x, max.x);
    let cy = correct(min.y, max.y);
    tri.pos.x += cx * 0.5;
    tri.pos.y += cy * 0.5;
    if cx != 0.0 {
        tri.vel.x = -tri.vel.x * 0.7;
    }
    if cy != 0.0 {
        tri.vel.y = -tri.vel.y * 0.7;
    }
}

fn circle(batch: &mut Batch, center: Vec3, radius: f32, rgba: [f32; 4]) {
    const SEGMENTS: usize = 24;
    for i in 0..=SEGMENTS {
        let a = i as f32 / SEGMENTS as f32 * TAU;
        batch.push(center + Vec3::new(a.cos() * radius, a.sin() * radius, 0.0), rgba);
    }
}

impl Scene for Triangles {
    fn name(&self) -> &'static str {
        "triangles"
    }

    fn surface(&self) -> Surface {
        Surface::WebGl
    }

    fn init(&mut self, viewport: Viewport, now_ms: f64) {
        self.viewport = viewport;
        self.bounds = Bounds::new(viewport.aspect());
        self.start_ms = now_ms;
        self.ticks = 0;
        self.camera = Camera::default();
        self.seed_centroids((now_ms * 0.001) as f32);
        self.seed_triangles();
        self.assign_clusters();
        info!("triangles: init {} triangles", self.triangles.len());
    }

    fn update(&mut self, frame: &Frame) {
        if self.triangles.is_empty() {
            return;
        }
        let elapsed = ((frame.now_ms - self.start_ms) / 1000.0 + HEAD_START) as f32;
        self.step_camera(frame.dt);

        if self.ticks % CLUSTER_EVERY == 0 {
            self.assign_clusters();
            self.update_centroids(frame.now_ms);
        }
        if self.ticks % NEIGHBOR_EVERY == 0 {
            self.refresh_neighbors();
        }
        self.step_triangles(frame.dt, elapsed);
        self.clamp_centroids();
        self.ticks += 1;
    }

    fn draw(&self, painter: &mut dyn Painter) {
        let right = self.viewport.width - 20.0;
        let bottom = self.viewport.height - 20.0;
        painter.clear();
        painter.set_text_align(TextAlign::Right);
        painter.set_font("14px Arial");
        painter.set_fill(&Rgb::WHITE.alpha(0.7).into());
        painter.fill_text("K-Means Clustering Visualization", right, bottom - 30.0);
        painter.set_font("12px Arial");
        painter.set_fill(&Rgb::WHITE.alpha(0.5).into());
        painter.fill_text("Move cursor to interact", right, bottom - 10.0);
    }

    fn mesh(&self) -> Option<Mesh> {
        if self.triangles.is_empty() {
            return None;
        }
        let mut batches = Vec::with_capacity(2 + 2 * K);

        let mut tris = Batch::new(Primitive::Triangles);
        for tri in &self.triangles {
            let [r, g, b] = CLUSTER_COLORS[tri.cluster];
            for p in tri.corners() {
                tris.push(p, [r, g, b, 1.0]);
            }
        }
        batches.push(tris);

        for (c, [r, g, b]) in self.centroids.iter().zip(CLUSTER_COLORS) {
            let center = c.pos.extend(-12.0);
            let mut membrane = Batch::new(Primitive::LineLoop);
            circle(&mut membrane, center, 0.4, [r, g, b, 0.25]);
            let mut nucleus = Batch::new(Primitive::TriangleFan);
            circle(&mut nucleus, center, 0.16, [r, g, b, 0.6]);
            batches.push(membrane);
            batches.push(nucleus);
        }

        if self.show_bounds {
            let b = self.bounds;
            let corners = [
                Vec3::new(b.left, b.bottom, Z_AVG),
                Vec3::new(b.left, b.top, Z_AVG),
                Vec3::new(b.right, b.top, Z_AVG),
                Vec3::new(b.right, b.bottom, Z_AVG),
            ];
            let mut lines = Batch::new(Primitive::Lines);
            for i in 0..4 {
                lines.push(corners[i], [1.0, 1.0, 1.0, 0.1]);
                lines.push(corners[(i + 1) % 4], [1.0, 1.0, 1.0, 0.1]);
            }
            batches.push(lines);
        }

        Some(Mesh {
            projection: self.projection(),
            view: Mat4::from_translation(self.camera.offset.extend(0.0)),
            clear: CLEAR,
            batches,
        })
    }

    fn input(&mut self, event: &InputEvent) {
        let cam = &mut self.camera;
        match event {
            InputEvent::Down(p) => {
                cam.dragging = true;
                cam.last = *p;
                cam.velocity = Vec2::ZERO;
            }
            InputEvent::Move(p) if cam.dragging => {
                let delta = (*p - cam.last) * 0.01;
                let step = Vec2::new(delta.x, -delta.y);
                cam.target += step;
                cam.pending += step;
                cam.last = *p;
            }
            InputEvent::Up => cam.dragging = false,
            InputEvent::Key(key) if key == "d" => self.show_bounds = !self.show_bounds,
            _ => {}
        }
    }

    fn clear(&mut self) {
        self.triangles = Vec::new();
        self.centroids = Vec::new();
        self.camera = Camera::default();
    }

    fn frame_interval_ms(&self) -> f64 {
        self.profile.pick(0.0, 1000.0 / 30.0)
    }

    fn entity_count(&self) -> usize {
        self.triangles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Recorder;

    fn scene() -> Triangles {
        let mut s = Triangles::new(Profile::Desktop, 21);
        s.init(Viewport::new(1280.0, 720.0), 5_000.0);
        s
    }

    fn run(s: &mut Triangles, frames: u64) {
        for i in 0..frames {
            s.update(&Frame::new(5_000.0 + i as f64 * 16.7, 1.0 / 60.0, i));
        }
    }

    #[test]
    fn triangle_count_follows_profile() {
        assert_eq!(scene().entity_count(), 150);
        let mut mobile = Triangles::new(Profile::Mobile, 1);
        mobile.init(Viewport::new(390.0, 844.0), 0.0);
        assert_eq!(mobile.entity_count(), 80);
    }

    #[test]
    fn seeded_grid_covers_wide_and_tall_containers() {
        for (w, h) in [(1600.0, 600.0), (500.0, 1000.0)] {
            let mut s = Triangles::new(Profile::Desktop, 3);
            s.init(Viewport::new(w, h), 0.0);
            assert_eq!(s.entity_count(), 150);
            let b = s.bounds();
            let slack = b.width().max(b.height()) * 0.1;
            for tri in s.triangles() {
                assert!(tri.pos.x >= b.left - slack && tri.pos.x <= b.right + slack);
                assert!(tri.pos.y >= b.bottom - slack && tri.pos.y <= b.top + slack);
            }
        }
    }

    #[test]
    fn every_triangle_joins_its_nearest_centroid() {
        let mut s = scene();
        run(&mut s, 12);
        s.assign_clusters();
        for tri in s.triangles() {
            let p = tri.pos.truncate();
            let own = s.centroids()[tri.cluster].pos.distance(p);
            for c in s.centroids() {
                assert!(own <= c.pos.distance(p) + 1e-5);
            }
        }
    }

    #[test]
    fn neighbours_are_three_distinct_others() {
        let mut s = scene();
        run(&mut s, 1);
        for (i, tri) in s.triangles().iter().enumerate() {
            assert_eq!(tri.neighbors.len(), NEIGHBORS);
            assert!(!tri.neighbors.contains(&i));
            let mut sorted = tri.neighbors.clone();
            sorted.dedup();
            assert_eq!(sorted.len(), NEIGHBORS);
        }
    }

    #[test]
    fn nearest_neighbour_is_truly_nearest() {
        let mut s = scene();
        s.refresh_neighbors();
        let tris = s.triangles();
        let first = &tris[0];
        let best = first.pos.distance(tris[first.neighbors[0]].pos);
        for other in &tris[1..] {
            assert!(best <= first.pos.distance(other.pos) + 1e-5);
        }
    }

    #[test]
    fn centroids_and_depths_stay_contained() {
        let mut s = scene();
        run(&mut s, 900);
        let b = s.bounds();
        for c in s.centroids() {
            assert!(c.pos.x >= b.left + 1.0 - 1e-4 && c.pos.x <= b.right - 1.0 + 1e-4);
            assert!(c.pos.y >= b.bottom + 1.0 - 1e-4 && c.pos.y <= b.top - 1.0 + 1e-4);
        }
        for tri in s.triangles() {
            assert!((Z_MIN..=Z_MAX).contains(&tri.pos.z));
            assert!(tri.pos.is_finite());
        }
    }

    #[test]
    fn drag_pans_the_camera() {
        let mut s = scene();
        s.input(&InputEvent::Down(Vec2::new(100.0, 100.0)));
        s.input(&InputEvent::Move(Vec2::new(200.0, 100.0)));
        s.input(&InputEvent::Up);
        run(&mut s, 30);
        assert!(s.camera_offset().x > 0.5);
        assert!(s.camera_offset().y.abs() < 1e-3);
    }

    #[test]
    fn debug_key_toggles_bounds_outline() {
        let mut s = scene();
        let plain = s.mesh().map(|m| m.batches.len());
        s.input(&InputEvent::Key("d".into()));
        let debug = s.mesh().map(|m| m.batches.len());
        assert_eq!(debug, plain.map(|n| n + 1));
    }

    #[test]
    fn mesh_holds_every_triangle_and_centroid() {
        let s = scene();
        let mesh = s.mesh().expect("mesh after init");
        assert_eq!(mesh.batches[0].vertex_count(), 150 * 3);
        assert_eq!(mesh.batches.len(), 1 + 2 * K);
        assert_eq!(mesh.clear, CLEAR);
    }

    #[test]
    fn overlay_prints_captions() {
        let mut rec = Recorder::new();
        scene().draw(&mut rec);
        assert_eq!(
            rec.texts(),
            vec!["K-Means Clustering Visualization", "Move cursor to interact"]
        );
    }

    #[test]
    fn cleared_scene_has_no_mesh() {
        let mut s = scene();
        s.clear();
        assert!(s.mesh().is_none());
        s.update(&Frame::tick(0));
        assert_eq!(s.entity_count(), 0);
    }
}
