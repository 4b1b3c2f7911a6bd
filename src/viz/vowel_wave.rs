//! Phonetic symbols drifting in a deep volume while the camera falls through
//! them; awakened symbols of similar meaning link up.

use crate::color::Rgb;
use crate::paint::{Paint, Painter};
use crate::rng::Rng;
use crate::scene::{Frame, Scene, Viewport};
use glam::{Vec2, Vec3};
use log::debug;
use std::f32::consts::PI;

const GLYPHS: &str = "ɑæɐɒʌəɚɛɜɝɪɨɔɵʊʉeɘɤøɶœɶʏiɪɨʉuʊyʋɹɻʀɽɾrɺɥjɰwʍʎʟɫɬɮɱmɯɰɲnɳŋɴβbɓƀɕcçɗdðɖɟfɡɠɢhɦħɧʜʝkɬɭɮlɫʟɱmɲnɳŋɴɸpɹɺɻʁɽɾʀʃʂsʃtθʈʧʦʋvʌɣxχʒʐzʑʔʕʡʢ";

pub const MAX_SYMBOLS: usize = 700;
pub const MAX_LINKS: usize = 3;
const LINK_RANGE: f32 = 200.0;
const LINK_WINDOW: usize = 20;
const AWAKE: f32 = 0.6;
const MIN_DEPTH: f32 = -750.0;
const MAX_DEPTH: f32 = 750.0;
const FOCAL: f32 = 500.0;
const BREATHE_CYCLE: u32 = 500;
const SPAWN_EVERY: u64 = 30;
const SPAWN_BATCH: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    pub index: usize,
    pub strength: f32,
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub pos: Vec3,
    vel: Vec3,
    screen: Vec2,
    scale: f32,
    glyph: char,
    font_size: f32,
    base_font_size: f32,
    alpha: f32,
    pub consciousness: f32,
    awakening: bool,
    awakening_speed: f32,
    rotation: f32,
    rotation_speed: f32,
    pub meaning: f32,
    brightness: f32,
    pub links: Vec<Link>,
}

impl Symbol {
    fn new(glyph: char, pos: Vec3, rng: &mut Rng) -> Self {
        let font_size = rng.range(14.0, 40.0);
        Self {
            pos,
            vel: Vec3::new(rng.signed(0.1), rng.signed(0.1), rng.signed(0.025)),
            screen: Vec2::ZERO,
            scale: FOCAL / (FOCAL + pos.z).max(1.0),
            glyph,
            font_size,
            base_font_size: font_size,
            alpha: rng.range(0.2, 0.7),
            consciousness: 0.0,
            awakening: rng.chance(0.3),
            awakening_speed: rng.range(0.0001, 0.0004),
            rotation: rng.angle(),
            rotation_speed: rng.signed(0.0005),
            meaning: rng.unit(),
            brightness: rng.range(0.2, 0.5),
            links: Vec::with_capacity(MAX_LINKS),
        }
    }

    fn awake(&self) -> bool {
        self.consciousness >= AWAKE
    }
}

#[derive(Clone, Debug, Default)]
struct Camera {
    pos: Vec3,
    fall: f32,
    rotation: f32,
}

pub struct VowelWave {
    rng: Rng,
    viewport: Viewport,
    glyphs: Vec<char>,
    symbols: Vec<Symbol>,
    camera: Camera,
    space: Vec2,
    ticks: u64,
    breathe: u32,
}

impl VowelWave {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Rng::seeded(seed),
            viewport: Viewport::default(),
            glyphs: GLYPHS.chars().collect(),
            symbols: Vec::new(),
            camera: Camera::default(),
            space: Vec2::ZERO,
            ticks: 0,
            breathe: 0,
        }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn camera_depth(&self) -> f32 {
        self.camera.pos.z
    }

    fn spawn(&mut self, z: Option<f32>) {
        let glyph = self.rng.pick(&self.glyphs).copied().unwrap_or('ə');
        let half = self.space / 2.0;
        let pos = Vec3::new(
            self.rng.signed(half.x),
            self.rng.signed(half.y),
            z.unwrap_or_else(|| self.rng.range(MIN_DEPTH, MAX_DEPTH)),
        );
        let mut symbol = Symbol::new(glyph, pos, &mut self.rng);
        symbol.screen = self.viewport.center() + pos.truncate() * symbol.scale;
        self.symbols.push(symbol);
    }

    fn move_camera(&mut self) {
        let t = self.ticks as f32;
        let cam = &mut self.camera;
        cam.pos.x = (t * 0.0003).sin() * 50.0;
        cam.pos.y = (t * 0.0002).cos() * 30.0;
        cam.fall = (cam.fall * 1.001).min(0.05);
        cam.pos.z += 0.8 + cam.fall;
        if self.ticks % 500 < 100 {
            cam.pos.x += (t * 0.01).sin() * 1.5;
            cam.pos.y += (t * 0.008).cos() * 1.5;
        }
        if cam.pos.z > MAX_DEPTH {
            cam.pos.z = MIN_DEPTH;
            cam.fall = 0.001;
            debug!("vowel wave: camera recycled");
        }
        cam.rotation += 0.0005;
    }

    fn move_symbols(&mut self) {
        let breathe = (self.breathe as f32 / BREATHE_CYCLE as f32 * PI).sin();
        let (sin, cos) = self.camera.rotation.sin_cos();
        let cam = self.camera.pos;
        let center = self.viewport.center();
        let half = self.space / 2.0;

        for s in &mut self.symbols {
            s.links.clear();
            s.pos += s.vel;
            if s.pos.z < MIN_DEPTH {
                s.pos.z = MAX_DEPTH;
            }
            if s.pos.z > MAX_DEPTH {
                s.pos.z = MIN_DEPTH;
            }

            let rel = s.pos - cam;
            if rel.z <= 0.0 {
                s.pos.z = MAX_DEPTH;
                s.scale = FOCAL / (FOCAL + MAX_DEPTH - cam.z);
                continue;
            }
            let turned = Vec2::new(rel.x * cos - rel.y * sin, rel.x * sin + rel.y * cos);
            s.scale = FOCAL / (FOCAL + rel.z);
            s.screen = center + turned * s.scale;
            s.rotation += s.rotation_speed;
            s.font_size = s.base_font_size * (1.0 + breathe * 0.05);

            if s.awakening && s.consciousness < 1.0 {
                s.consciousness = (s.consciousness + s.awakening_speed).min(1.0);
                s.alpha = 0.2 + s.consciousness * 0.7;
                s.brightness = 0.2 + s.consciousness * 0.6;
            }

            if s.pos.x < -half.x {
                s.pos.x = half.x;
            }
            if s.pos.x > half.x {
                s.pos.x = -half.x;
            }
            if s.pos.y < -half.y {
                s.pos.y = half.y;
            }
            if s.pos.y > half.y {
                s.pos.y = -half.y;
            }

            if self.rng.chance(0.005) {
                s.vel += Vec3::new(
                    self.rng.signed(0.0025),
                    self.rng.signed(0.0025),
                    self.rng.signed(0.00125),
                );
                s.vel *= 0.98;
            }
        }
    }

    /// Links awake symbols of similar meaning among depth-sorted neighbours.
    fn link(&mut self) {
        let n = self.symbols.len();
        for i in 0..n {
            if !self.symbols[i].awake() || self.symbols[i].links.len() >= MAX_LINKS {
                continue;
            }
            let lo = i.saturating_sub(LINK_WINDOW);
            let hi = (i + LINK_WINDOW).min(n);
            for j in lo..hi {
                if i == j {
                    continue;
                }
                let (a, b) = (&self.symbols[i], &self.symbols[j]);
                if !b.awake() || b.links.len() >= MAX_LINKS || a.links.len() >= MAX_LINKS {
                    continue;
                }
                if a.pos.distance(b.pos) >= LINK_RANGE {
                    continue;
                }
                let diff = (a.meaning - b.meaning).abs();
                if diff < 0.2 && !a.links.iter().any(|l| l.index == j) {
                    self.symbols[i].links.push(Link {
                        index: j,
                        strength: 1.0 - diff,
                    });
                }
            }
        }
    }

    fn proximity(&self, s: &Symbol) -> Option<f32> {
        let depth = s.pos.z - self.camera.pos.z;
        (depth > 0.0).then(|| (MAX_DEPTH / depth).min(1.0))
    }
}

impl Scene for VowelWave {
    fn name(&self) -> &'static str {
        "vowel-wave"
    }

    fn init(&mut self, viewport: Viewport, _now_ms: f64) {
        self.viewport = viewport;
        self.space = Vec2::new(viewport.width * 3.0, viewport.height * 3.0);
        self.camera = Camera {
            fall: 0.001,
            ..Camera::default()
        };
        self.ticks = 0;
        self.breathe = 0;
        self.symbols.clear();
        let count = MAX_SYMBOLS.min((viewport.width * viewport.height / 6000.0) as usize);
        for _ in 0..count {
            self.spawn(None);
        }
    }

    fn update(&mut self, _frame: &Frame) {
        self.ticks += 1;
        self.breathe = (self.breathe + 1) % BREATHE_CYCLE;
        self.move_camera();

        if self.ticks % SPAWN_EVERY == 0 && self.symbols.len() < MAX_SYMBOLS {
            let batch = SPAWN_BATCH.min(MAX_SYMBOLS - self.symbols.len());
            for _ in 0..batch {
                self.spawn(Some(MAX_DEPTH));
            }
        }

        self.move_symbols();
        let cam_z = self.camera.pos.z;
        self.symbols
            .sort_by(|a, b| (b.pos.z - cam_z).total_cmp(&(a.pos.z - cam_z)));
        self.link();
    }

    fn draw(&self, painter: &mut dyn Painter) {
        let (w, h) = (self.viewport.width, self.viewport.height);
        painter.set_fill(&Paint::vertical(
            0.0,
            h,
            vec![
                (0.0, Rgb::new(5, 5, 15).alpha(0.12)),
                (1.0, Rgb::new(15, 12, 5).alpha(0.12)),
            ],
        ));
        painter.fill_rect(0.0, 0.0, w, h);

        painter.set_line_width(0.4);
        for s in &self.symbols {
            if !s.awake() {
                continue;
            }
            let Some(near) = self.proximity(s) else {
                continue;
            };
            for link in &s.links {
                let Some(other) = self.symbols.get(link.index) else {
                    continue;
                };
                if self.proximity(other).is_none() {
                    continue;
                }
                let blue = 100.0 + (near * 80.0).floor();
                let yellow = 180.0 - (near * 50.0).floor();
                let color = Rgb::new(yellow as u8, (yellow - 30.0) as u8, blue as u8);
                painter.set_stroke(&color.alpha(link.strength * 0.3 * near).into());
                painter.line(s.screen, other.screen);
            }
        }

        let mut buf = [0u8; 4];
        for s in &self.symbols {
            let Some(near) = self.proximity(s) else {
                continue;
            };
            if near < 0.05 || s.alpha < 0.05 {
                continue;
            }
            let size = (s.font_size * s.scale * 1.3).floor();
            if !size.is_finite() || size < 1.0 {
                continue;
            }
            let shadow = (1.0 - near).max(0.0);
            let bright = (s.brightness * 255.0 * near).floor();
            let blue = (bright + (shadow * 50.0).floor()).min(255.0);
            let yellow = (bright + (near * 35.0).floor()).min(255.0);
            let alpha = s.alpha * near;

            painter.set_font(&format!("{}px Arial", size as u32));
            painter.set_fill(&Rgb::new(yellow as u8, (yellow - 20.0).max(0.0) as u8, blue as u8).alpha(alpha).into());
            painter.set_alpha(alpha);
            painter.save();
            painter.translate(s.screen.x, s.screen.y);
            painter.rotate(s.rotation);
            painter.fill_text(s.glyph.encode_utf8(&mut buf), -size / 2.0, size / 3.0);
            painter.restore();
        }
        painter.set_alpha(1.0);
    }

    fn resize(&mut self, viewport: Viewport, now_ms: f64) {
        self.init(viewport, now_ms);
    }

    fn clear(&mut self) {
        self.symbols = Vec::new();
    }

    fn frame_interval_ms(&self) -> f64 {
        1000.0 / 30.0
    }

    fn entity_count(&self) -> usize {
        self.symbols.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{Op, Recorder};

    fn wave(w: f32, h: f32) -> VowelWave {
        let mut scene = VowelWave::new(17);
        scene.init(Viewport::new(w, h), 0.0);
        scene
    }

    #[test]
    fn initial_population_scales_with_area() {
        assert_eq!(wave(1200.0, 800.0).entity_count(), 160);
        assert_eq!(wave(4000.0, 3000.0).entity_count(), MAX_SYMBOLS);
    }

    #[test]
    fn new_symbols_arrive_in_batches_up_to_the_cap() {
        let mut scene = wave(1200.0, 800.0);
        for i in 0..SPAWN_EVERY {
            scene.update(&Frame::tick(i));
        }
        assert_eq!(scene.entity_count(), 165);

        let mut full = wave(4000.0, 3000.0);
        for i in 0..90 {
            full.update(&Frame::tick(i));
        }
        assert_eq!(full.entity_count(), MAX_SYMBOLS);
    }

    #[test]
    fn symbols_are_sorted_far_to_near() {
        let mut scene = wave(1200.0, 800.0);
        scene.update(&Frame::tick(1));
        let depths: Vec<f32> = scene.symbols().iter().map(|s| s.pos.z).collect();
        assert!(depths.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn links_respect_every_rule() {
        let mut scene = wave(1200.0, 800.0);
        for s in scene.symbols.iter_mut() {
            s.consciousness = 1.0;
            s.meaning = 0.5;
            s.pos = Vec3::new(0.0, 0.0, 100.0) + s.pos * 0.01;
        }
        scene.link();
        let symbols = scene.symbols();
        assert!(symbols.iter().any(|s| !s.links.is_empty()));
        for (i, s) in symbols.iter().enumerate() {
            assert!(s.links.len() <= MAX_LINKS);
            for l in &s.links {
                assert_ne!(l.index, i);
                assert!(l.index.abs_diff(i) <= LINK_WINDOW);
                assert!(s.pos.distance(symbols[l.index].pos) < LINK_RANGE);
            }
        }
    }

    #[test]
    fn sleeping_symbols_never_link() {
        let mut scene = wave(1200.0, 800.0);
        for s in scene.symbols.iter_mut() {
            s.consciousness = 0.0;
        }
        scene.link();
        assert!(scene.symbols().iter().all(|s| s.links.is_empty()));
    }

    #[test]
    fn camera_recycles_at_the_far_plane() {
        let mut scene = wave(800.0, 600.0);
        scene.camera.pos.z = MAX_DEPTH - 0.5;
        scene.update(&Frame::tick(1));
        assert_eq!(scene.camera_depth(), MIN_DEPTH);
    }

    #[test]
    fn glyphs_are_drawn_rotated() {
        let mut scene = wave(1200.0, 800.0);
        scene.update(&Frame::tick(1));
        let mut rec = Recorder::new();
        scene.draw(&mut rec);
        let glyphs = rec.count(|op| matches!(op, Op::Text(..)));
        assert!(glyphs > 0 && glyphs <= scene.entity_count());
        assert_eq!(rec.count(|op| matches!(op, Op::Rotate(_))), glyphs);
        assert!(rec.balanced());
    }
}
