//! Every visualization driven headless through the `Scene` trait.

use backdrop_viz::paint::{Op, Recorder};
use backdrop_viz::scene::{InputEvent, Surface};
use backdrop_viz::viz::filling_cubes::FillingCubes;
use backdrop_viz::viz::graph::Graph;
use backdrop_viz::viz::vowel_wave::{VowelWave, MAX_SYMBOLS};
use backdrop_viz::{Frame, Kind, Profile, Scene, Viewport};
use glam::Vec2;

fn run(scene: &mut dyn Scene, frames: u64) {
    for i in 0..frames {
        scene.update(&Frame::tick(i));
    }
}

fn draw(scene: &dyn Scene) -> Recorder {
    let mut rec = Recorder::new();
    scene.draw(&mut rec);
    rec
}

#[test]
fn every_kind_runs_and_draws_cleanly() {
    for kind in Kind::ALL {
        for profile in [Profile::Desktop, Profile::Mobile] {
            let mut scene = kind.build(profile, 7);
            scene.init(Viewport::new(800.0, 600.0), 0.0);
            run(scene.as_mut(), 90);
            let rec = draw(scene.as_ref());
            assert!(rec.balanced(), "{} leaves save/restore unbalanced", kind);
            assert!(rec.all_finite(), "{} draws non-finite geometry", kind);
            assert!(!rec.ops.is_empty(), "{} drew nothing", kind);
        }
    }
}

#[test]
fn update_and_draw_before_init_do_not_panic() {
    for kind in Kind::ALL {
        let mut scene = kind.build(Profile::Desktop, 3);
        run(scene.as_mut(), 3);
        let _ = draw(scene.as_ref());
        let _ = scene.mesh();
    }
}

#[test]
fn clear_releases_entities_and_stays_safe() {
    for kind in Kind::ALL {
        let mut scene = kind.build(Profile::Desktop, 11);
        scene.init(Viewport::default(), 0.0);
        run(scene.as_mut(), 10);
        scene.clear();
        assert_eq!(scene.entity_count(), 0, "{} kept entities", kind);
        run(scene.as_mut(), 3);
        let _ = draw(scene.as_ref());
        scene.input(&InputEvent::Click(Vec2::new(10.0, 10.0)));
    }
}

#[test]
fn init_discards_previous_entities() {
    for kind in [Kind::Graph, Kind::Water, Kind::VowelWave, Kind::Plankton] {
        let mut scene = kind.build(Profile::Desktop, 5);
        scene.init(Viewport::default(), 0.0);
        let fresh = scene.entity_count();
        scene.input(&InputEvent::Click(Vec2::new(300.0, 300.0)));
        run(scene.as_mut(), 40);
        scene.init(Viewport::default(), 0.0);
        assert_eq!(scene.entity_count(), fresh, "{} init is not a reset", kind);
    }
}

#[test]
fn resize_survives_tiny_viewports() {
    for kind in Kind::ALL {
        let mut scene = kind.build(Profile::Mobile, 9);
        scene.init(Viewport::default(), 0.0);
        scene.resize(Viewport::new(0.0, 0.0), 100.0);
        run(scene.as_mut(), 5);
        assert!(draw(scene.as_ref()).all_finite(), "{} after resize", kind);
    }
}

#[test]
fn only_triangles_use_webgl() {
    for kind in Kind::ALL {
        let mut scene = kind.build(Profile::Desktop, 1);
        scene.init(Viewport::default(), 0.0);
        let gl = scene.surface() == Surface::WebGl;
        assert_eq!(gl, kind == Kind::Triangles);
        assert_eq!(scene.mesh().is_some(), gl);
    }
}

#[test]
fn graph_stays_under_its_cap_after_bursts() {
    let mut graph = Graph::new(2);
    graph.init(Viewport::default(), 0.0);
    for i in 0..20 {
        graph.input(&InputEvent::Click(Vec2::new(100.0 + i as f32, 200.0)));
        graph.update(&Frame::tick(i));
    }
    assert!(graph.entity_count() <= 250);
}

#[test]
fn filling_cubes_respect_max_cubes() {
    let mut cubes = FillingCubes::new(Profile::Mobile, 4);
    cubes.init(Viewport::new(400.0, 300.0), 0.0);
    run(&mut cubes, 1500);
    assert!(cubes.entity_count() <= cubes.settings().max_cubes);
}

#[test]
fn vowel_wave_never_exceeds_symbol_cap() {
    let mut wave = VowelWave::new(6);
    wave.init(Viewport::new(3000.0, 2000.0), 0.0);
    run(&mut wave, 120);
    assert!(wave.entity_count() <= MAX_SYMBOLS);
}

#[test]
fn text_only_comes_from_captioned_scenes() {
    let mut scene = Kind::Birds.build(Profile::Desktop, 8);
    scene.init(Viewport::default(), 0.0);
    run(scene.as_mut(), 10);
    let rec = draw(scene.as_ref());
    assert_eq!(rec.count(|op| matches!(op, Op::Text(..))), 0);
}
