//! Cubes rain into a container, collide, and settle into a heap until the
//! container is full.

use crate::color::Rgb;
use crate::grid::SpatialHash;
use crate::paint::{Paint, Painter};
use crate::rng::Rng;
use crate::scene::{Frame, Profile, Scene, Viewport};
use glam::{Vec2, Vec3};
use log::{debug, info};

const PALETTE: [Rgb; 5] = [
    Rgb::hex(0x2d3748),
    Rgb::hex(0x3d4a5e),
    Rgb::hex(0x1d2a3e),
    Rgb::hex(0x4a5d82),
    Rgb::hex(0x2a3a5a),
];
const BG_TOP: Rgb = Rgb::hex(0x0a0d14);
const BG_BOTTOM: Rgb = Rgb::hex(0x141a24);
const WALL: Rgb = Rgb::new(60, 70, 90);

const GRAVITY: f32 = 0.3;
const Z_BOUND: f32 = 200.0;
const SETTLE_FRAMES: u32 = 30;
const FULL: f32 = 0.98;

/// Physics and spawn tuning derived from the viewport and device class.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Settings {
    pub size: f32,
    pub max_cubes: usize,
    pub bounce: f32,
    pub friction: f32,
    pub initial_velocity: f32,
    pub rotation_speed: f32,
    pub collision_padding: f32,
    pub push_strength: f32,
    pub settle_threshold: f32,
    /// Milliseconds between spawns (jittered by +-5).
    pub spawn_interval: f32,
    pub large_chance: f32,
}

impl Settings {
    pub fn new(viewport: Viewport, profile: Profile) -> Self {
        Self {
            size: viewport.min_side() * 0.08,
            max_cubes: profile.pick(1000, 400),
            bounce: 0.4,
            friction: 0.97,
            initial_velocity: 1.5,
            rotation_speed: profile.pick(0.01, 0.008),
            collision_padding: 1.005,
            push_strength: 1.5,
            settle_threshold: 1.0,
            spawn_interval: profile.pick(60.0, 80.0),
            large_chance: profile.pick(0.05, 0.03),
        }
    }

    fn cell_size(&self) -> f32 {
        self.size * 1.5
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Falling,
    /// Gravity is off; the cube settles once the countdown runs out and it
    /// has practically stopped.
    Settling { countdown: u32 },
    Settled,
}

#[derive(Clone, Debug)]
pub struct Cube {
    pub pos: Vec3,
    pub vel: Vec3,
    pub rot: Vec3,
    pub spin: Vec3,
    pub size: f32,
    pub opacity: f32,
    pub mass: f32,
    pub color: usize,
    pub large: bool,
    pub phase: Phase,
}

impl Cube {
    pub fn is_settled(&self) -> bool {
        self.phase == Phase::Settled
    }

    fn begin_settling(&mut self) {
        if self.phase == Phase::Falling {
            self.phase = Phase::Settling {
                countdown: SETTLE_FRAMES,
            };
        }
    }

    /// World-space corners after applying X, then Y, then Z rotation.
    fn corners(&self) -> [Vec3; 8] {
        let h = self.size / 2.0;
        let (sx, cx) = self.rot.x.sin_cos();
        let (sy, cy) = self.rot.y.sin_cos();
        let (sz, cz) = self.rot.z.sin_cos();
        let local = [
            Vec3::new(-h, -h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(-h, h, -h),
            Vec3::new(-h, -h, h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
        ];
        local.map(|v| {
            let (y, z) = (v.y * cx - v.z * sx, v.y * sx + v.z * cx);
            let (x, z) = (v.x * cy + z * sy, -v.x * sy + z * cy);
            let (x, y) = (x * cz - y * sz, x * sz + y * cz);
            Vec3::new(x, y, z) + self.pos
        })
    }
}

// Wound so the right-hand normal points outward; the viewer looks down +z.
const FACES: [[usize; 4]; 6] = [
    [3, 2, 1, 0],
    [4, 5, 6, 7],
    [0, 4, 7, 3],
    [2, 6, 5, 1],
    [0, 1, 5, 4],
    [7, 6, 2, 3],
];

/// Two distinct mutable elements of a slice.
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(i, j);
    if i < j {
        let (head, tail) = items.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}

pub struct FillingCubes {
    profile: Profile,
    rng: Rng,
    viewport: Viewport,
    settings: Settings,
    ground: f32,
    cubes: Vec<Cube>,
    grid: SpatialHash,
    scratch: Vec<usize>,
    spawn_timer: f32,
    fill_level: f32,
}

impl FillingCubes {
    pub fn new(profile: Profile, seed: u64) -> Self {
        let viewport = Viewport::default();
        let settings = Settings::new(viewport, profile);
        Self {
            profile,
            rng: Rng::seeded(seed),
            viewport,
            settings,
            ground: viewport.height - 20.0,
            cubes: Vec::new(),
            grid: SpatialHash::new(settings.cell_size()),
            scratch: Vec::new(),
            spawn_timer: 0.0,
            fill_level: 0.0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cubes(&self) -> &[Cube] {
        &self.cubes
    }

    pub fn fill_level(&self) -> f32 {
        self.fill_level
    }

    pub fn ground(&self) -> f32 {
        self.ground
    }

    fn apply_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.ground = viewport.height - 20.0;
        self.settings = Settings::new(viewport, self.profile);
    }

    fn spawn_location(&mut self, large: bool) -> Vec3 {
        let max_density = if large { 4 } else { 8 };
        let size = self.settings.size;
        let width = self.viewport.width;
        let x = self.rng.unit() * width;
        let y = -size * if large { 6.0 } else { 2.0 };
        let z = self.rng.signed(75.0);
        let probe = Vec3::new(x, y, z);
        if self.grid.neighbors(probe).count() < max_density {
            return probe;
        }
        let shifted = x + self.rng.signed(width * 0.1);
        Vec3::new(shifted.clamp(size, (width - size).max(size)), y, z)
    }

    fn spawn(&mut self) {
        let large = self.rng.chance(self.settings.large_chance);
        let pos = self.spawn_location(large);
        self.spawn_at(pos, large);
        if large {
            debug!("filling cubes: spawned a large cube");
        }
    }

    fn spawn_at(&mut self, pos: Vec3, large: bool) {
        let s = self.settings;
        let rng = &mut self.rng;
        let spin_scale = s.rotation_speed * if large { 0.5 } else { 1.0 };
        let cube = Cube {
            pos,
            vel: Vec3::new(
                rng.signed(0.1),
                s.initial_velocity * if large { 1.2 } else { 0.8 },
                rng.signed(0.1),
            ),
            rot: Vec3::new(rng.angle(), rng.angle(), rng.angle()),
            spin: Vec3::new(
                rng.signed(spin_scale / 2.0),
                rng.signed(spin_scale / 2.0),
                rng.signed(spin_scale / 2.0),
            ),
            size: s.size * if large { 2.0 } else { rng.range(0.9, 1.1) },
            opacity: rng.range(0.8, 1.0),
            mass: if large { 4.0 } else { 1.0 },
            color: rng.index(PALETTE.len()),
            large,
            phase: Phase::Falling,
        };
        self.grid.insert(self.cubes.len(), cube.pos);
        self.cubes.push(cube);
    }

    fn compute_fill_level(&self) -> f32 {
        let (min_top, settled) = self
            .cubes
            .iter()
            .filter(|c| c.is_settled())
            .fold((self.ground, 0usize), |(top, n), c| {
                (top.min(c.pos.y - c.size / 2.0), n + 1)
            });
        let height_fill = 1.0 - min_top / self.ground;
        let density_fill = settled as f32 / self.settings.max_cubes as f32;
        height_fill.max(density_fill).clamp(0.0, 1.0)
    }

    fn step(&mut self, i: usize) {
        let s = self.settings;
        let width = self.viewport.width;
        let ground = self.ground;
        {
            let cube = &mut self.cubes[i];
            if cube.is_settled() {
                return;
            }
            let settling = matches!(cube.phase, Phase::Settling { .. });
            if !settling {
                cube.vel.y += GRAVITY;
            }
            cube.pos += cube.vel;
            cube.rot += cube.spin * if settling { 0.5 } else { 1.0 };
            cube.vel *= s.friction;

            let half = cube.size / 2.0;
            if cube.pos.x < half {
                cube.pos.x = half;
                cube.vel.x = cube.vel.x.abs() * s.bounce;
            }
            if cube.pos.x > width - half {
                cube.pos.x = width - half;
                cube.vel.x = -cube.vel.x.abs() * s.bounce;
            }
            if cube.pos.y > ground - half {
                cube.pos.y = ground - half;
                cube.vel.y = -cube.vel.y.abs() * s.bounce;
                if cube.vel.y.abs() < 0.5 {
                    cube.begin_settling();
                }
            }
            if cube.pos.z.abs() > Z_BOUND {
                cube.pos.z = Z_BOUND.copysign(cube.pos.z);
                cube.vel.z = -cube.vel.z * s.bounce;
            }
        }

        self.collide(i);

        let cube = &mut self.cubes[i];
        if let Phase::Settling { countdown } = &mut cube.phase {
            *countdown = countdown.saturating_sub(1);
            if *countdown == 0 && cube.vel.abs().max_element() < 0.1 {
                cube.phase = Phase::Settled;
                cube.vel = Vec3::ZERO;
                cube.spin *= 0.1;
            }
        }
    }

    fn collide(&mut self, i: usize) {
        let s = self.settings;
        let center_x = self.viewport.width / 2.0;
        let Self {
            cubes,
            grid,
            scratch,
            rng,
            ..
        } = self;

        scratch.clear();
        scratch.extend(grid.neighbors(cubes[i].pos).filter(|&j| j != i && j < cubes.len()));

        for &j in scratch.iter() {
            let (a, b) = pair_mut(cubes, i, j);
            let delta = b.pos - a.pos;
            let dist = delta.length();
            let min_dist = (a.size + b.size) / 2.0 * s.collision_padding;
            if dist >= min_dist {
                continue;
            }
            let n = if dist > 1e-4 { delta / dist } else { Vec3::Y };
            let push = n * (min_dist - dist) * 0.5;
            if !a.is_settled() {
                a.pos -= push;
            }
            if !b.is_settled() {
                b.pos += push;
            }

            if b.is_settled() {
                let v_dot_n = a.vel.dot(n);
                a.vel -= 2.0 * v_dot_n * n * s.bounce;
                if n.y > 0.5 {
                    a.vel.y -= 0.7 * s.push_strength;
                }
                if n.x.abs() > 0.7 {
                    let dir = if a.pos.x > center_x { -1.0 } else { 1.0 };
                    a.vel.x += dir * 0.4 * s.push_strength;
                }
                if a.vel.length() < s.settle_threshold {
                    a.begin_settling();
                }
            } else {
                let vel_along_normal = (b.vel - a.vel).dot(n);
                if vel_along_normal > 0.0 {
                    continue;
                }
                let impulse = -vel_along_normal * s.bounce * s.push_strength;
                let total = a.mass + b.mass;
                a.vel -= impulse * n * (2.0 * b.mass / total);
                b.vel += impulse * n * (2.0 * a.mass / total);

                if rng.chance(0.3) {
                    a.vel.x += rng.signed(0.1);
                    a.vel.z += rng.signed(0.1);
                    b.vel.x += rng.signed(0.1);
                    b.vel.z += rng.signed(0.1);
                }
            }
        }
    }

    fn rebuild_grid(&mut self) {
        self.grid.clear();
        for (i, cube) in self.cubes.iter().enumerate() {
            self.grid.insert(i, cube.pos);
        }
    }

    fn draw_cube(cube: &Cube, painter: &mut dyn Painter) {
        let corners = cube.corners();
        let mut faces: Vec<(f32, [Vec3; 4])> = FACES
            .iter()
            .map(|f| {
                let quad = f.map(|k| corners[k]);
                (quad.iter().map(|v| v.z).sum::<f32>() / 4.0, quad)
            })
            .collect();
        faces.sort_by(|a, b| b.0.total_cmp(&a.0));

        let rgb = PALETTE[cube.color];
        let light = 0.5 + cube.rot.y.sin().abs() * 0.3;
        for (_, quad) in faces {
            let v1 = (quad[1] - quad[0]).truncate();
            let v2 = (quad[2] - quad[0]).truncate();
            let normal = Vec2::new(v1.y, -v1.x);
            if normal.dot(v2) <= 0.0 {
                continue;
            }
            let depth = 1.2 - quad[0].z / 800.0;
            let opacity = cube.opacity * depth;
            painter.set_fill(&Paint::Linear {
                from: quad[0].truncate(),
                to: quad[2].truncate(),
                stops: vec![
                    (0.0, rgb.alpha(0.3 * light * opacity)),
                    (1.0, rgb.alpha(0.15 * light * opacity)),
                ],
            });
            painter.polygon(&quad.map(|v| v.truncate()));
            painter.fill();
            painter.set_stroke(&Rgb::WHITE.alpha(0.05 * depth * opacity).into());
            painter.set_line_width(0.5);
            painter.stroke();
        }
    }
}

impl Scene for FillingCubes {
    fn name(&self) -> &'static str {
        "filling-cubes"
    }

    fn init(&mut self, viewport: Viewport, _now_ms: f64) {
        self.apply_viewport(viewport);
        self.grid = SpatialHash::new(self.settings.cell_size());
        self.cubes.clear();
        self.spawn_timer = 0.0;
        self.fill_level = 0.0;
        for _ in 0..3 {
            self.spawn();
        }
        info!(
            "filling cubes: init {}x{}, max {} cubes",
            viewport.width, viewport.height, self.settings.max_cubes
        );
    }

    fn update(&mut self, _frame: &Frame) {
        self.fill_level = self.compute_fill_level();

        self.spawn_timer += 16.0;
        let interval = self.settings.spawn_interval + self.rng.signed(5.0);
        if self.spawn_timer >= interval && self.fill_level < FULL {
            self.spawn_timer = 0.0;
            if self.cubes.len() < self.settings.max_cubes {
                self.spawn();
            }
        }

        for i in 0..self.cubes.len() {
            self.step(i);
        }

        let floor = self.viewport.height + 200.0;
        self.cubes.retain(|c| c.pos.y < floor);
        self.rebuild_grid();
    }

    fn draw(&self, painter: &mut dyn Painter) {
        let (w, h) = (self.viewport.width, self.viewport.height);
        painter.set_fill(&Paint::vertical(
            0.0,
            h,
            vec![(0.0, BG_TOP.opaque()), (1.0, BG_BOTTOM.opaque())],
        ));
        painter.fill_rect(0.0, 0.0, w, h);

        painter.set_stroke(&WALL.alpha(0.2).into());
        painter.set_line_width(2.0);
        painter.begin_path();
        painter.move_to(0.0, 0.0);
        painter.line_to(0.0, self.ground);
        painter.line_to(w, self.ground);
        painter.line_to(w, 0.0);
        painter.stroke();

        painter.set_fill(&WALL.alpha(0.1).into());
        painter.fill_rect(
            w - 20.0,
            self.ground * (1.0 - self.fill_level),
            15.0,
            self.ground * self.fill_level,
        );

        let mut order: Vec<&Cube> = self.cubes.iter().collect();
        order.sort_by(|a, b| b.pos.z.total_cmp(&a.pos.z));
        for cube in order {
            Self::draw_cube(cube, painter);
        }
    }

    /// Keeps the heap; only the container and tuning follow the new size.
    fn resize(&mut self, viewport: Viewport, _now_ms: f64) {
        self.apply_viewport(viewport);
        self.grid = SpatialHash::new(self.settings.cell_size());
        self.rebuild_grid();
    }

    fn clear(&mut self) {
        self.cubes = Vec::new();
        self.scratch = Vec::new();
        self.grid.reset();
        self.fill_level = 0.0;
    }

    fn frame_interval_ms(&self) -> f64 {
        self.profile.pick(0.0, 1000.0 / 30.0)
    }

    fn entity_count(&self) -> usize {
        self.cubes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{Op, Recorder};

    fn empty_scene() -> FillingCubes {
        let mut scene = FillingCubes::new(Profile::Desktop, 11);
        scene.init(Viewport::new(800.0, 600.0), 0.0);
        scene.cubes.clear();
        scene.grid.clear();
        scene
    }

    fn run_physics(scene: &mut FillingCubes, frames: usize) {
        for _ in 0..frames {
            for i in 0..scene.cubes.len() {
                scene.step(i);
            }
            scene.rebuild_grid();
        }
    }

    #[test]
    fn init_spawns_three_cubes_above_the_top() {
        let mut scene = FillingCubes::new(Profile::Desktop, 3);
        scene.init(Viewport::new(800.0, 600.0), 0.0);
        assert_eq!(scene.entity_count(), 3);
        assert!(scene.cubes().iter().all(|c| c.pos.y < 0.0));
    }

    #[test]
    fn a_lone_cube_comes_to_rest_on_the_floor() {
        let mut scene = empty_scene();
        scene.spawn_at(Vec3::new(400.0, 0.0, 0.0), false);
        run_physics(&mut scene, 600);
        let cube = &scene.cubes()[0];
        assert!(cube.is_settled());
        assert_eq!(cube.vel, Vec3::ZERO);
        let gap = scene.ground() - (cube.pos.y + cube.size / 2.0);
        assert!((0.0..20.0).contains(&gap), "resting {} above the floor", gap);
    }

    #[test]
    fn overlapping_cubes_are_pushed_apart() {
        let mut scene = empty_scene();
        scene.spawn_at(Vec3::new(400.0, 300.0, 0.0), false);
        scene.spawn_at(Vec3::new(405.0, 300.0, 0.0), false);
        scene.rebuild_grid();
        let before = scene.cubes[0].pos.distance(scene.cubes[1].pos);
        scene.step(0);
        let after = scene.cubes[0].pos.distance(scene.cubes[1].pos);
        assert!(after > before);
    }

    #[test]
    fn settled_cubes_stay_put_when_hit() {
        let mut scene = empty_scene();
        scene.spawn_at(Vec3::new(400.0, 500.0, 0.0), false);
        scene.cubes[0].phase = Phase::Settled;
        scene.cubes[0].vel = Vec3::ZERO;
        let anchor = scene.cubes[0].pos;
        scene.spawn_at(Vec3::new(402.0, 480.0, 0.0), false);
        scene.rebuild_grid();
        run_physics(&mut scene, 30);
        assert_eq!(scene.cubes[0].pos, anchor);
    }

    #[test]
    fn heap_respects_cap_and_fill_level_bounds() {
        let mut scene = FillingCubes::new(Profile::Mobile, 5);
        scene.init(Viewport::new(320.0, 240.0), 0.0);
        for i in 0..2000 {
            scene.update(&Frame::tick(i));
            assert!(scene.entity_count() <= scene.settings().max_cubes);
            assert!((0.0..=1.0).contains(&scene.fill_level()));
        }
        assert!(scene.cubes().iter().any(Cube::is_settled));
    }

    #[test]
    fn cubes_far_below_the_floor_are_dropped() {
        let mut scene = empty_scene();
        scene.spawn_at(Vec3::new(400.0, 900.0, 0.0), false);
        scene.cubes[0].phase = Phase::Settled;
        scene.update(&Frame::tick(0));
        assert_eq!(scene.entity_count(), 0);
    }

    #[test]
    fn draw_culls_back_faces() {
        let mut scene = empty_scene();
        scene.spawn_at(Vec3::new(400.0, 300.0, 0.0), false);
        let mut rec = Recorder::new();
        scene.draw(&mut rec);
        let faces = rec.count(|op| *op == Op::FillPath);
        assert!((1..=3).contains(&faces), "drew {} faces", faces);
        assert!(rec.all_finite());
    }
}
