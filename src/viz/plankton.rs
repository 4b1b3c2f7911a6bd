//! Underwater scene: a slowly turning plankton cloud with jellyfish, fish and
//! schools, projected in software onto a 2D canvas.

use crate::color::Rgb;
use crate::paint::{Blend, Painter};
use crate::rng::Rng;
use crate::scene::{Frame, Profile, Scene, Viewport};
use crate::viz::birds::shortest_turn;
use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

pub const BOUNDS: f32 = 40.0;
const HALF: f32 = BOUNDS * 0.5;
const FOG_DENSITY: f32 = 0.02;
const FOV_DEGREES: f32 = 75.0;
const TENTACLES: usize = 8;

const BACKGROUND: Rgb = Rgb::hex(0x001a2e);
const PARTICLE: Rgb = Rgb::hex(0x6699bb);
const DOME: Rgb = Rgb::hex(0x4477aa);
const TENTACLE: Rgb = Rgb::hex(0x336688);
const FISH: [Rgb; 5] = [
    Rgb::hex(0xaa5533),
    Rgb::hex(0x447788),
    Rgb::hex(0xaa9944),
    Rgb::hex(0x884466),
    Rgb::hex(0x55aa88),
];
const SCHOOL: [Rgb; 3] = [Rgb::hex(0x5588aa), Rgb::hex(0xaa7744), Rgb::hex(0x886677)];

#[derive(Clone, Debug)]
pub struct Settings {
    pub particles: usize,
    pub jellyfish: usize,
    pub fish: usize,
    pub schools: usize,
    pub school_size: usize,
}

impl Settings {
    pub fn new(profile: Profile) -> Self {
        Self {
            particles: profile.pick(3000, 1000),
            jellyfish: profile.pick(7, 3),
            fish: profile.pick(15, 5),
            schools: profile.pick(5, 2),
            school_size: profile.pick(20, 10),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Jellyfish {
    pub pos: Vec3,
    size: f32,
    speed: f32,
    phase: f32,
}

/// A swimmer that eases toward a target point; used by lone fish and schools.
#[derive(Clone, Debug)]
pub struct Swimmer {
    pub pos: Vec3,
    pub target: Vec3,
    yaw: f32,
    speed: f32,
    turn_speed: f32,
}

impl Swimmer {
    fn new(pos: Vec3, speed: f32, turn_speed: f32, rng: &mut Rng) -> Self {
        Self {
            pos,
            target: pos + random_in_bounds(rng),
            yaw: 0.0,
            speed,
            turn_speed,
        }
    }

    fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }

    fn swim(&mut self, rng: &mut Rng) {
        let delta = self.target - self.pos;
        self.pos += delta * self.speed * 0.3;
        if delta.x.abs() > 0.1 || delta.z.abs() > 0.1 {
            let heading = delta.x.atan2(delta.z);
            self.yaw += shortest_turn(self.yaw, heading) * self.turn_speed * 0.5;
        }
        if delta.abs().max_element() < 1.0 {
            self.target = random_in_bounds(rng);
        }
        self.keep_in_bounds();
    }

    /// Clamp to the tank and send the target back toward the middle.
    fn keep_in_bounds(&mut self) {
        for axis in 0..3 {
            if self.pos[axis].abs() > HALF {
                self.pos[axis] = self.pos[axis].signum() * HALF;
                if self.target[axis] != 0.0 {
                    self.target[axis] = -self.pos[axis] * 0.8;
                }
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct Fish {
    pub swimmer: Swimmer,
    size: f32,
    color: Rgb,
}

#[derive(Clone, Debug)]
struct Member {
    home: Vec3,
    offset: Vec3,
    size: f32,
    speed: f32,
    phase: f32,
}

#[derive(Clone, Debug)]
pub struct School {
    pub swimmer: Swimmer,
    members: Vec<Member>,
    color: Rgb,
}

impl School {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

fn random_in_bounds(rng: &mut Rng) -> Vec3 {
    Vec3::new(rng.signed(HALF), rng.signed(HALF), rng.signed(HALF))
}

/// Exponential-squared fog: 1 at the eye, falling toward 0 with distance.
pub fn fog(distance: f32) -> f32 {
    let d = FOG_DENSITY * distance;
    (-d * d).exp()
}

/// Camera for one frame: projects world points to canvas pixels.
struct Lens {
    eye: Vec3,
    view: Mat4,
    clip: Mat4,
    viewport: Viewport,
    focal: f32,
}

impl Lens {
    fn new(time: f32, viewport: Viewport) -> Self {
        let eye = Vec3::new((time * 0.03).sin() * 5.0, (time * 0.015).sin() * 5.0, 30.0);
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        let fov = FOV_DEGREES.to_radians();
        let projection = Mat4::perspective_rh_gl(fov, viewport.aspect(), 0.1, 1000.0);
        Self {
            eye,
            view,
            clip: projection * view,
            viewport,
            focal: viewport.height / (2.0 * (fov / 2.0).tan()),
        }
    }

    /// Screen position and pixels-per-unit, or `None` behind the eye.
    fn project(&self, p: Vec3) -> Option<(Vec2, f32)> {
        let depth = -self.view.transform_point3(p).z;
        if depth <= 0.1 {
            return None;
        }
        let ndc = self.clip.project_point3(p);
        let screen = Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.width,
            (1.0 - ndc.y) * 0.5 * self.viewport.height,
        );
        Some((screen, self.focal / depth))
    }

    fn depth(&self, p: Vec3) -> f32 {
        -self.view.transform_point3(p).z
    }
}

pub struct Plankton {
    settings: Settings,
    rng: Rng,
    viewport: Viewport,
    particles: Vec<Vec3>,
    jellyfish: Vec<Jellyfish>,
    fish: Vec<Fish>,
    schools: Vec<School>,
    time: f32,
}

impl Plankton {
    pub fn new(profile: Profile, seed: u64) -> Self {
        Self {
            settings: Settings::new(profile),
            rng: Rng::seeded(seed),
            viewport: Viewport::default(),
            particles: Vec::new(),
            jellyfish: Vec::new(),
            fish: Vec::new(),
            schools: Vec::new(),
            time: 0.0,
        }
    }

    pub fn particles(&self) -> &[Vec3] {
        &self.particles
    }

    pub fn jellyfish(&self) -> &[Jellyfish] {
        &self.jellyfish
    }

    pub fn fish(&self) -> &[Fish] {
        &self.fish
    }

    pub fn schools(&self) -> &[School] {
        &self.schools
    }

    fn populate(&mut self) {
        let s = self.settings.clone();
        let rng = &mut self.rng;
        let spread = BOUNDS * 0.75;
        self.particles = (0..s.particles)
            .map(|_| Vec3::new(rng.signed(spread), rng.signed(spread), rng.signed(spread)))
            .collect();

        self.jellyfish = (0..s.jellyfish)
            .map(|_| Jellyfish {
                pos: random_in_bounds(rng),
                size: rng.range(1.0, 3.0),
                speed: rng.range(0.1, 0.25),
                phase: rng.angle(),
            })
            .collect();

        self.fish = (0..s.fish)
            .map(|_| {
                let color = *rng.pick(&FISH).unwrap_or(&FISH[0]);
                let pos = random_in_bounds(rng);
                Fish {
                    size: rng.range(0.5, 1.0),
                    swimmer: Swimmer::new(pos, rng.range(0.02, 0.06), 0.01, rng),
                    color,
                }
            })
            .collect();

        self.schools = (0..s.schools)
            .map(|_| {
                let color = *rng.pick(&SCHOOL).unwrap_or(&SCHOOL[0]);
                let pos = random_in_bounds(rng);
                let members = (0..s.school_size)
                    .map(|_| {
                        let home = Vec3::new(rng.signed(2.5), rng.signed(2.5), rng.signed(2.5));
                        Member {
                            home,
                            offset: home,
                            size: rng.range(0.3, 0.5),
                            speed: rng.range(0.2, 0.5),
                            phase: rng.angle(),
                        }
                    })
                    .collect();
                School {
                    swimmer: Swimmer::new(pos, rng.range(0.01, 0.02), 0.003, rng),
                    members,
                    color,
                }
            })
            .collect();
    }

    fn particle_rotation(&self) -> Mat4 {
        Mat4::from_rotation_x(self.time * 0.01) * Mat4::from_rotation_y(self.time * 0.02)
    }

    fn draw_particles(&self, painter: &mut dyn Painter, lens: &Lens) {
        let spin = self.particle_rotation();
        painter.set_blend(Blend::Lighter);
        for &p in &self.particles {
            let world = spin.transform_point3(p);
            let Some((s, scale)) = lens.project(world) else {
                continue;
            };
            let size = (0.3 * scale).max(0.5);
            let alpha = 0.6 * fog(world.distance(lens.eye));
            painter.set_fill(&PARTICLE.alpha(alpha).into());
            painter.fill_rect(s.x - size / 2.0, s.y - size / 2.0, size, size);
        }
        painter.set_blend(Blend::SourceOver);
    }

    fn draw_jellyfish(&self, painter: &mut dyn Painter, lens: &Lens, jelly: &Jellyfish) {
        let Some((center, scale)) = lens.project(jelly.pos) else {
            return;
        };
        let haze = fog(jelly.pos.distance(lens.eye));
        let pulse = (self.time * jelly.speed * 0.5 + jelly.phase).sin() * 0.1 + 1.0;
        let radius = jelly.size * scale;

        painter.set_stroke(&TENTACLE.alpha(0.6 * haze).into());
        painter.set_line_width((0.1 * jelly.size * scale).max(0.5));
        for i in 0..TENTACLES {
            let angle = i as f32 / TENTACLES as f32 * TAU;
            let rim = Vec3::new(angle.cos(), 0.0, angle.sin()) * jelly.size * 0.8;
            let sway = (self.time * 0.7 + (i + 1) as f32).sin() * 0.05;
            let root = jelly.pos + rim;
            let tip = root + Vec3::new(sway * jelly.size * 2.0, -jelly.size * 2.0 * pulse, 0.0);
            if let (Some((a, _)), Some((b, _))) = (lens.project(root), lens.project(tip)) {
                painter.line(a, b);
            }
        }

        painter.save();
        painter.translate(center.x, center.y);
        painter.begin_path();
        painter.arc(0.0, 0.0, radius, PI, TAU);
        painter.quadratic_to(0.0, radius * 0.3 * pulse, -radius, 0.0);
        painter.close_path();
        painter.set_fill(&DOME.alpha(0.7 * haze).into());
        painter.fill();
        painter.restore();
    }

    fn draw_fish_shape(
        painter: &mut dyn Painter,
        lens: &Lens,
        pos: Vec3,
        forward: Vec3,
        size: f32,
        wag: f32,
        color: Rgb,
    ) {
        let nose = pos + forward * size;
        let tail = pos - forward * size;
        let side = forward.cross(Vec3::Y).normalize_or_zero() * size * 0.6;
        let fin = tail - forward * size * 0.5 + Vec3::Y * wag * size;
        let points = [nose, tail + side, tail - side];
        let fins = [tail, fin + side * 1.2, fin - side * 1.2];
        let haze = fog(pos.distance(lens.eye));

        for (shape, alpha) in [(points, 1.0), (fins, 0.85)] {
            let projected: Option<Vec<Vec2>> = shape.iter().map(|&p| lens.project(p).map(|(s, _)| s)).collect();
            if let Some(poly) = projected {
                painter.set_fill(&color.alpha(alpha * haze).into());
                painter.polygon(&poly);
                painter.fill();
            }
        }
    }

    fn draw_school(&self, painter: &mut dyn Painter, lens: &Lens, school: &School) {
        let yaw = Mat4::from_rotation_y(school.swimmer.yaw);
        let forward = school.swimmer.forward();
        for (i, m) in school.members.iter().enumerate() {
            let pos = school.swimmer.pos + yaw.transform_vector3(m.offset);
            let wag = (self.time * 3.0 + i as f32).sin() * 0.07;
            Self::draw_fish_shape(painter, lens, pos, forward, m.size, wag, school.color);
        }
    }
}

enum Body<'a> {
    Jelly(&'a Jellyfish),
    Fish(&'a Fish),
    School(&'a School),
}

impl Scene for Plankton {
    fn name(&self) -> &'static str {
        "plankton"
    }

    fn init(&mut self, viewport: Viewport, now_ms: f64) {
        self.viewport = viewport;
        self.time = (now_ms * 0.001) as f32;
        self.populate();
    }

    fn update(&mut self, frame: &Frame) {
        self.time = (frame.now_ms * 0.001) as f32;
        let limit = BOUNDS * 0.75;
        for jelly in &mut self.jellyfish {
            jelly.pos.y += 0.005;
            if jelly.pos.y > limit {
                jelly.pos = Vec3::new(self.rng.signed(HALF), -limit, self.rng.signed(HALF));
            }
        }
        for fish in &mut self.fish {
            fish.swimmer.swim(&mut self.rng);
        }
        let t = self.time;
        for school in &mut self.schools {
            school.swimmer.swim(&mut self.rng);
            for m in &mut school.members {
                m.offset = m.home
                    + Vec3::new(
                        (t * m.speed * 0.3 + m.phase).sin() * 0.2,
                        (t * m.speed * 0.2 + m.phase).cos() * 0.15,
                        (t * m.speed * 0.15 + m.phase + FRAC_PI_2).sin() * 0.2,
                    );
            }
        }
    }

    fn draw(&self, painter: &mut dyn Painter) {
        painter.set_fill(&BACKGROUND.opaque().into());
        painter.fill_rect(0.0, 0.0, self.viewport.width, self.viewport.height);

        let lens = Lens::new(self.time, self.viewport);
        self.draw_particles(painter, &lens);

        let mut bodies: Vec<(f32, Body)> = Vec::new();
        bodies.extend(self.jellyfish.iter().map(|j| (lens.depth(j.pos), Body::Jelly(j))));
        bodies.extend(self.fish.iter().map(|f| (lens.depth(f.swimmer.pos), Body::Fish(f))));
        bodies.extend(self.schools.iter().map(|s| (lens.depth(s.swimmer.pos), Body::School(s))));
        bodies.sort_by(|a, b| b.0.total_cmp(&a.0));

        for (_, body) in bodies {
            match body {
                Body::Jelly(j) => self.draw_jellyfish(painter, &lens, j),
                Body::Fish(f) => {
                    let wag = (self.time * 3.0).sin() * 0.2;
                    Self::draw_fish_shape(painter, &lens, f.swimmer.pos, f.swimmer.forward(), f.size, wag, f.color);
                }
                Body::School(s) => self.draw_school(painter, &lens, s),
            }
        }
    }

    fn resize(&mut self, viewport: Viewport, _now_ms: f64) {
        self.viewport = viewport;
    }

    fn clear(&mut self) {
        self.particles = Vec::new();
        self.jellyfish = Vec::new();
        self.fish = Vec::new();
        self.schools = Vec::new();
    }

    fn entity_count(&self) -> usize {
        self.particles.len()
            + self.jellyfish.len()
            + self.fish.len()
            + self.schools.iter().map(School::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{Op, Recorder};

    fn tank(profile: Profile) -> Plankton {
        let mut scene = Plankton::new(profile, 8);
        scene.init(Viewport::new(1200.0, 800.0), 0.0);
        scene
    }

    #[test]
    fn populations_follow_profile() {
        let desktop = tank(Profile::Desktop);
        assert_eq!(desktop.particles().len(), 3000);
        assert_eq!(desktop.jellyfish().len(), 7);
        assert_eq!(desktop.fish().len(), 15);
        assert_eq!(desktop.schools().len(), 5);
        assert!(desktop.schools().iter().all(|s| s.len() == 20));

        let mobile = tank(Profile::Mobile);
        assert_eq!(mobile.entity_count(), 1000 + 3 + 5 + 2 * 10);
    }

    #[test]
    fn swimmers_stay_in_the_tank() {
        let mut scene = tank(Profile::Mobile);
        for i in 0..3000 {
            scene.update(&Frame::tick(i));
        }
        let inside = |p: Vec3| p.abs().max_element() <= HALF + 1e-4;
        assert!(scene.fish().iter().all(|f| inside(f.swimmer.pos)));
        assert!(scene.schools().iter().all(|s| inside(s.swimmer.pos)));
    }

    #[test]
    fn clamping_reflects_the_target() {
        let mut rng = Rng::seeded(1);
        let mut s = Swimmer::new(Vec3::ZERO, 0.05, 0.01, &mut rng);
        s.pos = Vec3::new(25.0, 0.0, 0.0);
        s.target = Vec3::new(30.0, 1.0, 1.0);
        s.keep_in_bounds();
        assert_eq!(s.pos.x, HALF);
        assert!((s.target.x + HALF * 0.8).abs() < 1e-5);
    }

    #[test]
    fn jellyfish_wrap_to_the_bottom() {
        let mut scene = tank(Profile::Mobile);
        scene.jellyfish[0].pos.y = BOUNDS * 0.75;
        scene.update(&Frame::tick(1));
        assert_eq!(scene.jellyfish()[0].pos.y, -BOUNDS * 0.75);
    }

    #[test]
    fn fog_thins_with_distance() {
        assert_eq!(fog(0.0), 1.0);
        assert!(fog(10.0) > fog(40.0));
        assert!(fog(200.0) < 0.01);
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let lens = Lens::new(0.0, Viewport::new(1200.0, 800.0));
        let (s, scale) = lens.project(Vec3::ZERO).map_or((Vec2::NAN, 0.0), |v| v);
        assert!((s - Vec2::new(600.0, 400.0)).length() < 1e-2);
        assert!(scale > 0.0);
        assert!(lens.project(Vec3::new(0.0, 0.0, 40.0)).is_none());
    }

    #[test]
    fn particles_are_additive() {
        let scene = tank(Profile::Mobile);
        let mut rec = Recorder::new();
        scene.draw(&mut rec);
        assert_eq!(rec.count(|op| matches!(op, Op::Blend(Blend::Lighter))), 1);
        assert!(rec.balanced());
        assert!(rec.all_finite());
    }
}
