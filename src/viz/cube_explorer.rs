//! An isometric city of boxes and a small black cube that roams across the
//! rooftops while a lazy camera tries to keep up.

use crate::color::Rgb;
use crate::grid::SpatialHash;
use crate::paint::Painter;
use crate::rng::Rng;
use crate::scene::{Frame, InputEvent, Profile, Scene, Viewport};
use glam::{Vec2, Vec3};
use log::{debug, info};
use std::collections::VecDeque;
use std::f32::consts::{PI, TAU};

const TONES: [Rgb; 3] = [Rgb::hex(0x8b7355), Rgb::hex(0xa69080), Rgb::hex(0x6b5b73)];
const CUBE_SIZE: f32 = 12.0;
const ESCAPE_RADIUS: f32 = 400.0;
const EXPLORATION_RADIUS: f32 = 2000.0;
const MOTIVATION_INTERVAL: u32 = 300;
const PATH_INTERVAL: u32 = 120;
const PATH_STEP: f32 = 150.0;
const PATH_REACH: f32 = 800.0;
const HOP_REACH: f32 = 1200.0;
const SURFACE_REACH: f32 = 500.0;
const HISTORY: usize = 50;
const MAX_MOMENTUM: f32 = 3.0;
const FRICTION: f32 = 0.92;
const CULL: f32 = 300.0;
const FLOOR: f32 = -500.0;

/// World generation counts.
#[derive(Clone, Debug)]
pub struct Settings {
    pub grid_extent: i32,
    pub clusters_per_grid: usize,
    pub boxes_per_cluster: usize,
    pub towers_per_grid: usize,
    pub tower_levels: usize,
    pub bridges: usize,
    /// `(minimum, random spread)` segment count per bridge.
    pub bridge_segments: (usize, usize),
}

impl Settings {
    pub fn new(profile: Profile) -> Self {
        Self {
            grid_extent: profile.pick(3, 2),
            clusters_per_grid: profile.pick(15, 8),
            boxes_per_cluster: profile.pick(20, 10),
            towers_per_grid: profile.pick(8, 4),
            tower_levels: profile.pick(12, 8),
            bridges: profile.pick(25, 15),
            bridge_segments: profile.pick((10, 20), (5, 10)),
        }
    }
}

/// An axis-aligned box resting at `base` with extents `(width, depth, height)`.
#[derive(Clone, Copy, Debug)]
pub struct WorldBox {
    pub base: Vec3,
    pub size: Vec3,
    tone: usize,
}

impl WorldBox {
    pub fn top(&self) -> f32 {
        self.base.z + self.size.z
    }

    fn footprint_distance(&self, p: Vec2) -> f32 {
        self.base.truncate().distance(p)
    }

    /// Random point on the roof, `spread` of the footprint wide.
    fn roof_point(&self, spread: f32, rng: &mut Rng) -> Vec3 {
        Vec3::new(
            self.base.x + rng.signed(0.5) * self.size.x * spread,
            self.base.y + rng.signed(0.5) * self.size.y * spread,
            self.top() + CUBE_SIZE / 2.0,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Behavior {
    Exploring,
    Escaping,
    Investigating,
    Resting,
}

#[derive(Clone, Copy, Debug)]
struct Hop {
    origin: Vec3,
    target: Vec3,
    progress: f32,
}

#[derive(Clone, Debug)]
struct Motivation {
    target: Vec2,
    direction: f32,
    strength: f32,
    since_update: u32,
}

#[derive(Clone, Debug)]
pub struct Cube {
    pub pos: Vec3,
    vel: Vec3,
    momentum: Vec3,
    fall: f32,
    pulse: f32,
    last_pos: Vec3,
    stuck_frames: u32,
    since_hop: u32,
    hop: Option<Hop>,
    motivation: Motivation,
    pub behavior: Behavior,
    behavior_timer: u32,
    behavior_duration: f32,
    path: Vec<Vec3>,
    path_index: usize,
    path_timer: u32,
    history: VecDeque<Vec3>,
}

impl Cube {
    fn new() -> Self {
        Self {
            pos: Vec3::ZERO,
            vel: Vec3::ZERO,
            momentum: Vec3::ZERO,
            fall: 0.0,
            pulse: 0.0,
            last_pos: Vec3::ZERO,
            stuck_frames: 0,
            since_hop: 0,
            hop: None,
            motivation: Motivation {
                target: Vec2::ZERO,
                direction: 0.0,
                strength: 1.0,
                since_update: 0,
            },
            behavior: Behavior::Exploring,
            behavior_timer: 0,
            behavior_duration: 0.0,
            path: Vec::new(),
            path_index: 0,
            path_timer: 0,
            history: VecDeque::with_capacity(HISTORY + 1),
        }
    }

    pub fn is_hopping(&self) -> bool {
        self.hop.is_some()
    }

    fn set_behavior(&mut self, behavior: Behavior, duration: f32) {
        if self.behavior != behavior {
            debug!("cube explorer: {:?} -> {:?}", self.behavior, behavior);
        }
        self.behavior = behavior;
        self.behavior_timer = 0;
        self.behavior_duration = duration;
    }

    fn retarget(&mut self, reach: f32, strength: f32, rng: &mut Rng) {
        let m = &mut self.motivation;
        m.direction = rng.angle();
        m.target = self.pos.truncate() + Vec2::from_angle(m.direction) * reach;
        m.strength = strength;
        m.since_update = 0;
    }
}

#[derive(Clone, Debug)]
struct Camera {
    pos: Vec2,
    zoom: f32,
    target_zoom: f32,
}

impl Camera {
    const TRACKING_DISTANCE: f32 = 800.0;
    const MOVE_SPEED: f32 = 0.001;
}

/// Pointer drag state; while a drag is active the camera stops following.
#[derive(Clone, Debug, Default)]
struct Drag {
    last: Option<Vec2>,
    pending: Vec2,
    offset: Vec2,
}

pub struct CubeExplorer {
    settings: Settings,
    profile: Profile,
    rng: Rng,
    viewport: Viewport,
    boxes: Vec<WorldBox>,
    grid: SpatialHash,
    cube: Cube,
    camera: Camera,
    drag: Drag,
}

impl CubeExplorer {
    pub fn new(profile: Profile, seed: u64) -> Self {
        Self {
            settings: Settings::new(profile),
            profile,
            rng: Rng::seeded(seed),
            viewport: Viewport::default(),
            boxes: Vec::new(),
            grid: SpatialHash::new(SURFACE_REACH),
            cube: Cube::new(),
            camera: Camera {
                pos: Vec2::ZERO,
                zoom: 0.6,
                target_zoom: 0.6,
            },
            drag: Drag::default(),
        }
    }

    pub fn boxes(&self) -> &[WorldBox] {
        &self.boxes
    }

    pub fn cube(&self) -> &Cube {
        &self.cube
    }

    pub fn camera(&self) -> Vec2 {
        self.camera.pos
    }

    pub fn zoom(&self) -> f32 {
        self.camera.zoom
    }

    fn push_box(&mut self, base: Vec3, size: Vec3) {
        let tone = self.rng.index(TONES.len());
        self.boxes.push(WorldBox { base, size, tone });
    }

    fn generate_world(&mut self) {
        self.boxes.clear();
        let s = self.settings.clone();
        let (w, h) = (self.viewport.width, self.viewport.height);

        for gx in -s.grid_extent..=s.grid_extent {
            for gy in -s.grid_extent..=s.grid_extent {
                let center = Vec2::new(gx as f32 * w * 1.5, gy as f32 * h * 1.5);

                for _ in 0..s.clusters_per_grid {
                    let cluster = center + Vec2::new(self.rng.signed(0.5) * w, self.rng.signed(0.5) * h);
                    let cluster_z = self.rng.unit() * 400.0;
                    let count = s.boxes_per_cluster + self.rng.index(16);
                    for i in 0..count {
                        let angle = i as f32 / count as f32 * TAU + self.rng.unit() * 0.5;
                        let distance = self.rng.range(30.0, 230.0);
                        let height = self.rng.range(10.0, 160.0);
                        let at = cluster
                            + Vec2::from_angle(angle) * distance
                            + Vec2::new(self.rng.signed(50.0), self.rng.signed(50.0));
                        let base = at.extend(cluster_z + self.rng.signed(100.0));
                        let size = Vec3::new(self.rng.range(15.0, 95.0), self.rng.range(15.0, 95.0), height);
                        self.push_box(base, size);
                    }
                }

                for _ in 0..s.towers_per_grid {
                    let tower = center + Vec2::new(self.rng.signed(0.4) * w, self.rng.signed(0.4) * h);
                    for level in 0..s.tower_levels {
                        let at = tower + Vec2::new(self.rng.signed(20.0), self.rng.signed(20.0));
                        let base = at.extend(level as f32 * 80.0 + self.rng.unit() * 20.0);
                        let size = Vec3::new(
                            self.rng.range(20.0, 80.0),
                            self.rng.range(20.0, 80.0),
                            self.rng.range(20.0, 80.0),
                        );
                        self.push_box(base, size);
                    }
                }
            }
        }

        for _ in 0..s.bridges {
            let start = Vec2::new(self.rng.signed(4.0) * w, self.rng.signed(4.0) * h);
            let end = start + Vec2::new(self.rng.signed(400.0), self.rng.signed(400.0));
            let z = self.rng.range(100.0, 400.0);
            let segments = s.bridge_segments.0 + self.rng.index(s.bridge_segments.1);
            for i in 0..segments {
                let t = i as f32 / segments as f32;
                let base = start.lerp(end, t).extend(z + (t * PI).sin() * 50.0);
                let size = Vec3::new(
                    self.rng.range(25.0, 65.0),
                    self.rng.range(25.0, 65.0),
                    self.rng.range(10.0, 40.0),
                );
                self.push_box(base, size);
            }
        }

        for _ in 0..20 {
            let center = Vec2::new(self.rng.signed(3.0) * w, self.rng.signed(3.0) * h);
            let z = self.rng.unit() * 350.0;
            let radius = self.rng.range(100.0, 400.0);
            let count = 15 + self.rng.index(25);
            for i in 0..count {
                let angle = i as f32 / count as f32 * TAU;
                let r = radius + self.rng.signed(40.0);
                let base = (center + Vec2::from_angle(angle) * r).extend(z + self.rng.signed(50.0));
                let size = Vec3::new(
                    self.rng.range(20.0, 90.0),
                    self.rng.range(20.0, 90.0),
                    self.rng.range(15.0, 105.0),
                );
                self.push_box(base, size);
            }
        }

        for _ in 0..15 {
            let center = Vec2::new(self.rng.signed(3.5) * w, self.rng.signed(3.5) * h);
            let count = 20 + self.rng.index(40);
            for i in 0..count {
                let angle = i as f32 / count as f32 * PI * 6.0;
                let radius = i as f32 * 8.0 + 50.0;
                let base = (center + Vec2::from_angle(angle) * radius)
                    .extend(i as f32 * 15.0 + self.rng.unit() * 50.0);
                let size = Vec3::new(
                    self.rng.range(15.0, 65.0),
                    self.rng.range(15.0, 65.0),
                    self.rng.range(10.0, 70.0),
                );
                self.push_box(base, size);
            }
        }

        for _ in 0..800 {
            let base = Vec3::new(
                self.rng.signed(5.0) * w,
                self.rng.signed(5.0) * h,
                self.rng.unit() * 500.0,
            );
            let size = Vec3::new(
                self.rng.range(10.0, 110.0),
                self.rng.range(10.0, 110.0),
                self.rng.range(8.0, 128.0),
            );
            self.push_box(base, size);
        }

        for corner in 0..4 {
            let sx = if corner % 2 == 0 { -1.0 } else { 1.0 };
            let sy = if corner < 2 { -1.0 } else { 1.0 };
            let center = Vec2::new(sx * w * 3.0, sy * h * 3.0);
            for _ in 0..60 {
                let angle = self.rng.angle();
                let distance = self.rng.range(100.0, 500.0);
                let base = (center + Vec2::from_angle(angle) * distance).extend(self.rng.unit() * 600.0);
                let size = Vec3::new(
                    self.rng.range(30.0, 150.0),
                    self.rng.range(30.0, 150.0),
                    self.rng.range(40.0, 190.0),
                );
                self.push_box(base, size);
            }
        }

        self.grid.clear();
        for (i, b) in self.boxes.iter().enumerate() {
            self.grid.insert(i, b.base.truncate().extend(0.0));
        }
        info!("cube explorer: generated {} boxes", self.boxes.len());
    }

    /// Drop the cube on top of a random box taller than z 50.
    fn place_cube(&mut self) {
        let tall: Vec<usize> = (0..self.boxes.len())
            .filter(|&i| self.boxes[i].top() > 50.0)
            .collect();
        let pool = if tall.is_empty() {
            (0..self.boxes.len()).collect()
        } else {
            tall
        };
        let Some(&index) = self.rng.pick(&pool) else {
            return;
        };
        let host = self.boxes[index];

        let cube = &mut self.cube;
        cube.pos = host.roof_point(0.5, &mut self.rng);
        cube.vel = Vec3::ZERO;
        cube.fall = 0.0;
        cube.hop = None;
        cube.stuck_frames = 0;
        cube.last_pos = cube.pos;
        let strength = self.rng.range(0.8, 1.0);
        let reach = EXPLORATION_RADIUS * self.rng.range(0.7, 1.0);
        cube.retarget(reach, strength, &mut self.rng);
        debug!(
            "cube explorer: cube placed at ({:.0}, {:.0}, {:.0})",
            cube.pos.x, cube.pos.y, cube.pos.z
        );
    }

    fn update_motivation(&mut self) {
        let cube = &mut self.cube;
        cube.motivation.since_update += 1;
        if cube.motivation.since_update >= MOTIVATION_INTERVAL || cube.motivation.target == Vec2::ZERO {
            let reach = EXPLORATION_RADIUS * self.rng.range(0.5, 1.0);
            let strength = self.rng.range(0.7, 1.0);
            cube.retarget(reach, strength, &mut self.rng);
        }
        cube.motivation.strength *= 0.998;
        if cube.motivation.target.distance(cube.pos.truncate()) < 300.0 {
            cube.motivation.strength *= 0.95;
        }
    }

    fn update_behavior(&mut self) {
        let to_camera = self.camera.pos.distance(self.cube.pos.truncate());
        let cube = &mut self.cube;
        cube.behavior_timer += 1;
        let timed_out = cube.behavior_timer as f32 > cube.behavior_duration;

        match cube.behavior {
            Behavior::Exploring => {
                if to_camera < ESCAPE_RADIUS {
                    let duration = self.rng.range(180.0, 300.0);
                    cube.set_behavior(Behavior::Escaping, duration);
                } else if cube.behavior_timer > 300 && self.rng.chance(0.003) {
                    let duration = self.rng.range(240.0, 420.0);
                    cube.set_behavior(Behavior::Investigating, duration);
                } else if cube.motivation.strength < 0.2 {
                    let duration = self.rng.range(60.0, 120.0);
                    cube.set_behavior(Behavior::Resting, duration);
                }
            }
            Behavior::Escaping => {
                if to_camera > ESCAPE_RADIUS * 1.5 || timed_out {
                    cube.set_behavior(Behavior::Exploring, 0.0);
                }
            }
            Behavior::Investigating => {
                if timed_out {
                    cube.set_behavior(Behavior::Exploring, 0.0);
                } else if to_camera < ESCAPE_RADIUS * 0.7 {
                    let duration = self.rng.range(120.0, 180.0);
                    cube.set_behavior(Behavior::Escaping, duration);
                }
            }
            Behavior::Resting => {
                if timed_out {
                    cube.set_behavior(Behavior::Exploring, 0.0);
                }
            }
        }
    }

    fn record_history(&mut self) {
        let cube = &mut self.cube;
        if cube.behavior_timer % 30 == 0 {
            cube.history.push_back(cube.pos);
            if cube.history.len() > HISTORY {
                cube.history.pop_front();
            }
        }
    }

    /// Twenty frames without real movement outside a hop force an escape and
    /// a fresh path.
    fn detect_stuck(&mut self) {
        let cube = &mut self.cube;
        if cube.pos.distance(cube.last_pos) < 0.05 && cube.hop.is_none() {
            cube.stuck_frames += 1;
            if cube.stuck_frames > 20 {
                debug!("cube explorer: stuck, replanning");
                cube.path.clear();
                cube.path_index = 0;
                cube.path_timer = PATH_INTERVAL;
                cube.stuck_frames = 0;
                cube.set_behavior(Behavior::Escaping, 120.0);
            }
        } else {
            cube.stuck_frames = 0;
        }
        cube.last_pos = cube.pos;
    }

    /// Greedy walk over nearby rooftops toward `target`: each step picks the
    /// best of the five highest-ranked remaining boxes within two steps.
    pub fn find_path(&mut self, start: Vec3, target: Vec2) -> Vec<Vec3> {
        let origin = start.truncate();
        let mut candidates: Vec<usize> = (0..self.boxes.len())
            .filter(|&i| {
                let b = &self.boxes[i];
                b.footprint_distance(origin) < PATH_REACH && b.top() > start.z - 200.0
            })
            .collect();
        let rank = |b: &WorldBox| b.footprint_distance(target) + b.footprint_distance(origin) * 0.3;
        candidates.sort_by(|&a, &b| rank(&self.boxes[a]).total_cmp(&rank(&self.boxes[b])));

        let mut path = Vec::new();
        let mut current = start;
        let steps = (PATH_REACH / PATH_STEP) as usize;
        for _ in 0..steps {
            let mut best: Option<(usize, f32)> = None;
            for (slot, &i) in candidates.iter().take(5).enumerate() {
                let b = &self.boxes[i];
                let from_current = b.footprint_distance(current.truncate());
                if from_current >= PATH_STEP * 2.0 {
                    continue;
                }
                let score = b.footprint_distance(target)
                    + (b.top() - current.z).abs() * 0.5
                    + from_current * 0.2;
                if best.map_or(true, |(_, s)| score < s) {
                    best = Some((slot, score));
                }
            }
            let Some((slot, _)) = best else {
                break;
            };
            let host = self.boxes[candidates.remove(slot)];
            current = host.roof_point(0.6, &mut self.rng);
            path.push(current);
        }
        path
    }

    fn surface_under_cube(&self) -> Option<f32> {
        let p = self.cube.pos;
        let mut best: Option<(f32, f32)> = None;
        for i in self.grid.neighbors(p.truncate().extend(0.0)) {
            let b = &self.boxes[i];
            if b.footprint_distance(p.truncate()) >= SURFACE_REACH {
                continue;
            }
            let half = b.size.truncate() / 2.0 + Vec2::splat(30.0);
            let d = (p.truncate() - b.base.truncate()).abs();
            if d.x > half.x || d.y > half.y {
                continue;
            }
            let gap = (p.z - b.top()).abs();
            if gap < 50.0 && best.map_or(true, |(g, _)| gap < g) {
                best = Some((gap, b.top() + CUBE_SIZE / 2.0));
            }
        }
        best.map(|(_, z)| z)
    }

    fn start_hop(&mut self) -> bool {
        let cube = &self.cube;
        let here = cube.pos.truncate();
        let mut candidates: Vec<&WorldBox> = self
            .boxes
            .iter()
            .filter(|b| b.footprint_distance(here) < HOP_REACH && b.top() > cube.pos.z - 200.0)
            .collect();
        if candidates.is_empty() {
            return false;
        }
        let pool = if cube.behavior == Behavior::Escaping {
            let camera = self.camera.pos;
            candidates.sort_by(|a, b| {
                b.footprint_distance(camera).total_cmp(&a.footprint_distance(camera))
            });
            3
        } else {
            let goal = cube.motivation.target;
            candidates.sort_by(|a, b| a.footprint_distance(goal).total_cmp(&b.footprint_distance(goal)));
            5
        };
        let pick = self.rng.index(pool.min(candidates.len()));
        let target = candidates[pick].roof_point(0.8, &mut self.rng);

        let cube = &mut self.cube;
        cube.hop = Some(Hop {
            origin: cube.pos,
            target,
            progress: 0.0,
        });
        debug!(
            "cube explorer: hop to ({:.0}, {:.0}) while {:?}",
            target.x, target.y, cube.behavior
        );
        true
    }

    /// Advance an active hop; true while the cube is airborne.
    fn step_hop(&mut self) -> bool {
        let cube = &mut self.cube;
        let Some(hop) = cube.hop.as_mut() else {
            return false;
        };
        hop.progress += 0.06;
        if hop.progress >= 1.0 {
            cube.pos = hop.target;
            cube.hop = None;
            cube.since_hop = 0;
            cube.momentum = Vec3::ZERO;
            cube.fall = 0.0;
            return true;
        }
        let t = hop.progress;
        let ease = 1.0 - (1.0 - t).powi(3);
        let span = hop.origin.truncate().distance(hop.target.truncate());
        let lift = (t * PI).sin() * (span * 0.3).min(100.0);
        cube.pos = hop.origin.lerp(hop.target, ease) + Vec3::Z * lift;
        true
    }

    fn steer(&mut self) {
        let cube = &mut self.cube;
        let mut desired = Vec3::ZERO;
        match cube.behavior {
            Behavior::Exploring => {
                if cube.path_index < cube.path.len() {
                    let node = cube.path[cube.path_index];
                    if node.truncate().distance(cube.pos.truncate()) < 50.0 {
                        cube.path_index += 1;
                    }
                }
                if let Some(&node) = cube.path.get(cube.path_index) {
                    let dir = (node - cube.pos).normalize_or_zero() * 0.8;
                    desired = Vec3::new(dir.x, dir.y, dir.z * 0.3);
                } else if cube.path.is_empty() {
                    let dir = (cube.motivation.target - cube.pos.truncate()).normalize_or_zero();
                    desired = (dir * 0.5 * cube.motivation.strength).extend(0.0);
                }
            }
            Behavior::Escaping => {
                let away = (cube.pos.truncate() - self.camera.pos).normalize_or_zero() * 1.2;
                let jitter = Vec2::new(self.rng.signed(0.2), self.rng.signed(0.2));
                desired = (away + jitter).extend(0.0);
            }
            Behavior::Investigating => {
                if cube.behavior_timer % 60 < 30 {
                    desired = (Vec2::from_angle(self.rng.angle()) * 0.2).extend(0.0);
                }
            }
            Behavior::Resting => {
                desired = Vec3::new(self.rng.signed(0.05), self.rng.signed(0.05), 0.0);
            }
        }

        let m = &mut cube.momentum;
        m.x += (desired.x - m.x) * 0.15;
        m.y += (desired.y - m.y) * 0.15;
        m.z += (desired.z - m.z) * 0.1;
        *m *= FRICTION;
        let planar = m.truncate();
        if planar.length() > MAX_MOMENTUM {
            let capped = planar.normalize() * MAX_MOMENTUM;
            m.x = capped.x;
            m.y = capped.y;
        }
        cube.vel = *m;
    }

    fn update_cube(&mut self) {
        self.update_motivation();
        self.update_behavior();
        self.record_history();
        self.detect_stuck();

        if self.step_hop() {
            return;
        }
        self.cube.since_hop += 1;

        self.cube.path_timer += 1;
        if self.cube.path_timer >= PATH_INTERVAL || self.cube.path.is_empty() {
            self.cube.path_timer = 0;
            let path = self.find_path(self.cube.pos, self.cube.motivation.target);
            if !path.is_empty() {
                debug!("cube explorer: new path with {} nodes", path.len());
                self.cube.path = path;
                self.cube.path_index = 0;
            }
        }

        let surface = self.surface_under_cube();
        let cube = &self.cube;
        let hop_now = (cube.path.is_empty() && self.rng.chance(0.01))
            || (cube.since_hop > 300 && self.rng.chance(0.02))
            || (cube.behavior == Behavior::Escaping && self.rng.chance(0.03))
            || (surface.is_none() && cube.pos.z < -100.0);
        if hop_now && self.start_hop() {
            return;
        }

        match surface {
            None => {
                self.cube.fall = (self.cube.fall - 0.12) * 0.98;
                if self.cube.pos.z < FLOOR {
                    info!("cube explorer: cube fell out of the world, relocating");
                    self.place_cube();
                    return;
                }
            }
            Some(z) => {
                self.cube.pos.z += (z - self.cube.pos.z) * 0.2;
                self.cube.fall *= 0.7;
            }
        }

        self.steer();

        let world = self.viewport.width * 6.0;
        let cube = &mut self.cube;
        cube.pos += cube.vel + Vec3::Z * cube.fall;
        if cube.pos.x.abs() > world {
            cube.pos.x = cube.pos.x.signum() * world * 0.95;
            cube.momentum.x *= -0.5;
        }
        if cube.pos.y.abs() > world {
            cube.pos.y = cube.pos.y.signum() * world * 0.95;
            cube.momentum.y *= -0.5;
        }
        cube.pulse += match cube.behavior {
            Behavior::Escaping => 0.08,
            Behavior::Investigating => 0.03,
            _ => 0.05,
        };
    }

    fn update_camera(&mut self) {
        if self.drag.last.is_some() {
            let drag = &mut self.drag;
            drag.offset += (drag.pending - drag.offset) * 0.1;
            self.camera.pos += drag.offset;
            drag.pending = Vec2::ZERO;
            return;
        }

        let cube = self.cube.pos.truncate();
        let cam = &mut self.camera;
        let distance = cam.pos.distance(cube);
        let target = cube + self.cube.vel.truncate() * 5.0;
        cam.target_zoom = if distance < 150.0 {
            0.8
        } else if distance > 1000.0 {
            0.4
        } else {
            0.6
        };
        cam.zoom += (cam.target_zoom - cam.zoom) * 0.005;
        cam.pos += (target - cam.pos) * Camera::MOVE_SPEED;

        let on_screen = (cube - cam.pos) * cam.zoom;
        if on_screen.length() > self.viewport.min_side() * 0.6 {
            cam.pos += (cube - cam.pos) * 0.002;
        }
    }

    /// Isometric projection relative to the camera, in canvas pixels.
    pub fn project(&self, p: Vec3) -> Vec2 {
        let x = p.x - self.camera.pos.x;
        let y = p.y - self.camera.pos.y;
        let zoom = self.camera.zoom;
        Vec2::new((x - y) * 0.866 * zoom, ((x + y) * 0.5 - p.z * 0.8) * zoom) + self.viewport.center()
    }

    fn on_screen(&self, s: Vec2, margin: f32) -> bool {
        s.x > -margin
            && s.x < self.viewport.width + margin
            && s.y > -margin
            && s.y < self.viewport.height + margin
    }

    fn draw_box(&self, painter: &mut dyn Painter, b: &WorldBox, s: Vec2) {
        let zoom = self.camera.zoom;
        let base = TONES[b.tone];
        let w = b.size.x * 0.866 * zoom;
        let h = b.size.z * 0.5 * zoom;
        let d = b.size.y * 0.866 * zoom;
        let dh = b.size.y * 0.5 * zoom;
        let drop = Vec2::new(0.0, b.size.z * zoom);

        let a = s;
        let right = s + Vec2::new(w, h);
        let back = s + Vec2::new(w - d, h - dh);
        let left = s + Vec2::new(-d, -dh);

        painter.set_fill(&base.opaque().into());
        painter.polygon(&[a, right, back, left]);
        painter.fill();

        painter.set_fill(&base.lerp(Rgb::BLACK, 0.25).opaque().into());
        painter.polygon(&[a, left, left + drop, a + drop]);
        painter.fill();

        painter.set_fill(&base.lerp(Rgb::WHITE, 0.15).opaque().into());
        painter.polygon(&[right, back, back + drop, right + drop]);
        painter.fill();
    }

    fn draw_cube(&self, painter: &mut dyn Painter) {
        let s = self.project(self.cube.pos);
        if !self.on_screen(s, 100.0) {
            return;
        }
        let pulse = self.cube.pulse.sin() * 0.2 + 0.8;
        let size = CUBE_SIZE * pulse * self.camera.zoom;
        let corner = s - Vec2::splat(size / 2.0);
        let trail = corner - self.cube.vel.truncate() * 10.0;

        painter.set_fill(&Rgb::BLACK.opaque().into());
        painter.fill_rect(corner.x, corner.y, size, size);
        painter.set_fill(&Rgb::BLACK.alpha(0.3).into());
        painter.fill_rect(trail.x, trail.y, size, size);
        painter.set_shadow(3.0, Some(Rgb::BLACK.opaque()));
        painter.set_fill(&Rgb::BLACK.alpha(0.5).into());
        painter.fill_rect(corner.x, corner.y, size, size);
        painter.set_shadow(0.0, None);
    }

    fn draw_hud(&self, painter: &mut dyn Painter) {
        let cube = &self.cube;
        let here = cube.pos.truncate();
        let nearby = self
            .grid
            .neighbors(here.extend(0.0))
            .filter(|&i| self.boxes[i].footprint_distance(here) < 200.0)
            .count();

        painter.set_font("11px \"Courier New\"");
        painter.set_fill(&Rgb::WHITE.alpha(0.2).into());
        let lines = [
            "Mode: tracking".to_string(),
            format!("Tracking Distance: {:.0}", Camera::TRACKING_DISTANCE),
            format!("Zoom: {:.2}", self.camera.zoom),
            format!("Distance: {:.0}", self.camera.pos.distance(here)),
            "CUBE EXPLORING WITH PURPOSE".to_string(),
        ];
        let mut y = 20.0;
        for line in &lines {
            painter.fill_text(line, 10.0, y);
            y += 15.0;
        }

        painter.set_fill(&Rgb::WHITE.alpha(0.1).into());
        let m = &cube.motivation;
        let status = [
            format!("Cube Speed: {:.2}", cube.vel.truncate().length()),
            format!("Cube Z: {:.0}", cube.pos.z),
            format!("Motivation: {:.0}° ({:.0}%)", m.direction.to_degrees(), m.strength * 100.0),
            format!("Target Distance: {:.0}", m.target.distance(here)),
            format!("Nearby Structures: {}", nearby),
        ];
        for line in &status {
            painter.fill_text(line, 10.0, y);
            y += 15.0;
        }
    }
}

impl Scene for CubeExplorer {
    fn name(&self) -> &'static str {
        "cube-explorer"
    }

    fn init(&mut self, viewport: Viewport, _now_ms: f64) {
        self.viewport = viewport;
        self.cube = Cube::new();
        self.drag = Drag::default();
        self.generate_world();
        self.place_cube();
        self.camera.pos = self.cube.pos.truncate();
        self.camera.zoom = 0.6;
        self.camera.target_zoom = 0.6;
    }

    fn update(&mut self, _frame: &Frame) {
        if self.boxes.is_empty() {
            return;
        }
        self.update_cube();
        self.update_camera();
    }

    fn draw(&self, painter: &mut dyn Painter) {
        let (w, h) = (self.viewport.width, self.viewport.height);
        painter.set_fill(&TONES[0].lerp(Rgb::BLACK, 0.5).opaque().into());
        painter.fill_rect(0.0, 0.0, w, h);

        let mut visible: Vec<(&WorldBox, Vec2)> = self
            .boxes
            .iter()
            .map(|b| (b, self.project(b.base)))
            .filter(|&(_, s)| self.on_screen(s, CULL))
            .collect();
        let depth = |b: &WorldBox| b.base.x + b.base.y - b.base.z;
        visible.sort_by(|a, b| depth(b.0).total_cmp(&depth(a.0)));
        for (b, s) in visible {
            self.draw_box(painter, b, s);
        }

        if !self.boxes.is_empty() {
            self.draw_cube(painter);
            self.draw_hud(painter);
        }
    }

    /// The world is laid out in screen-sized blocks, so a resize rebuilds it.
    fn resize(&mut self, viewport: Viewport, now_ms: f64) {
        self.init(viewport, now_ms);
    }

    fn input(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Down(p) => self.drag.last = Some(*p),
            InputEvent::Move(p) => {
                if let Some(last) = self.drag.last {
                    self.drag.pending += (*p - last) * 0.5;
                    self.drag.last = Some(*p);
                }
            }
            InputEvent::Up => self.drag.last = None,
            _ => {}
        }
    }

    fn clear(&mut self) {
        self.boxes = Vec::new();
        self.grid.reset();
        self.cube = Cube::new();
        self.drag = Drag::default();
    }

    fn frame_interval_ms(&self) -> f64 {
        if self.profile.is_mobile() {
            1000.0 / 30.0
        } else {
            0.0
        }
    }

    fn entity_count(&self) -> usize {
        self.boxes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{Op, Recorder};

    fn explorer(profile: Profile) -> CubeExplorer {
        let mut scene = CubeExplorer::new(profile, 21);
        scene.init(Viewport::new(1280.0, 720.0), 0.0);
        scene
    }

    #[test]
    fn mobile_world_is_smaller() {
        let desktop = explorer(Profile::Desktop);
        let mobile = explorer(Profile::Mobile);
        assert!(mobile.entity_count() < desktop.entity_count());
        assert!(mobile.entity_count() > 800 + 4 * 60);
    }

    #[test]
    fn cube_starts_on_a_tall_roof() {
        let scene = explorer(Profile::Mobile);
        let z = scene.cube().pos.z;
        let host = scene
            .boxes()
            .iter()
            .find(|b| (b.top() + CUBE_SIZE / 2.0 - z).abs() < 1e-3);
        assert!(host.is_some_and(|b| b.top() > 50.0));
    }

    #[test]
    fn path_steps_stay_within_reach() {
        let mut scene = explorer(Profile::Mobile);
        let start = scene.cube().pos;
        let target = start.truncate() + Vec2::new(2000.0, 0.0);
        let path = scene.find_path(start, target);
        assert!(path.len() <= (PATH_REACH / PATH_STEP) as usize);
        let mut prev = start;
        for node in &path {
            // host within two steps, plus roof jitter
            assert!(node.truncate().distance(prev.truncate()) < PATH_STEP * 2.0 + 100.0);
            prev = *node;
        }
    }

    #[test]
    fn hop_lands_exactly_on_target() {
        let mut scene = explorer(Profile::Mobile);
        assert!(scene.start_hop());
        let target = scene.cube.hop.map(|h| h.target);
        let mut frames = 0;
        while scene.step_hop() && scene.cube().is_hopping() {
            frames += 1;
            assert!(frames < 30);
        }
        assert_eq!(Some(scene.cube().pos), target);
    }

    #[test]
    fn standing_still_triggers_an_escape() {
        let mut scene = explorer(Profile::Mobile);
        scene.cube.behavior = Behavior::Exploring;
        scene.cube.path = vec![Vec3::ONE];
        for _ in 0..21 {
            scene.detect_stuck();
        }
        assert_eq!(scene.cube().behavior, Behavior::Escaping);
        assert!(scene.cube.path.is_empty());
    }

    #[test]
    fn falling_out_of_the_world_relocates() {
        let mut scene = explorer(Profile::Mobile);
        scene.cube.pos = Vec3::new(1.0e5, 1.0e5, FLOOR - 10.0);
        scene.cube.path = vec![Vec3::ONE; 3];
        scene.cube.path_timer = 0;
        scene.update_cube();
        assert!(scene.cube().pos.z > 0.0);
    }

    #[test]
    fn drag_pans_the_camera() {
        let mut scene = explorer(Profile::Mobile);
        let before = scene.camera();
        scene.input(&InputEvent::Down(Vec2::new(100.0, 100.0)));
        scene.input(&InputEvent::Move(Vec2::new(200.0, 100.0)));
        scene.update(&Frame::tick(1));
        assert!(scene.camera().x > before.x);
        scene.input(&InputEvent::Up);
    }

    #[test]
    fn zoom_eases_out_when_far() {
        let mut scene = explorer(Profile::Mobile);
        scene.camera.pos = scene.cube().pos.truncate() + Vec2::new(5000.0, 0.0);
        scene.update_camera();
        assert_eq!(scene.camera.target_zoom, 0.4);
        assert!(scene.zoom() < 0.6);
    }

    #[test]
    fn draws_boxes_and_hud() {
        let mut scene = explorer(Profile::Mobile);
        for i in 0..30 {
            scene.update(&Frame::tick(i));
        }
        let mut rec = Recorder::new();
        scene.draw(&mut rec);
        assert_eq!(rec.texts().len(), 10);
        assert!(rec.count(|op| matches!(op, Op::FillPath)) >= 3);
        assert!(rec.all_finite());
    }
}
