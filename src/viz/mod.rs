//! The visualization catalogue.

pub mod binary_trees;
pub mod birds;
pub mod cube_explorer;
pub mod filling_cubes;
pub mod graph;
pub mod plankton;
pub mod roots;
pub mod triangles;
pub mod vowel_wave;
pub mod water;

use crate::error::VizError;
use crate::scene::{Profile, Scene};
use std::fmt;
use std::str::FromStr;

/// Every visualization the page can host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    BinaryTrees,
    Birds,
    CubeExplorer,
    Graph,
    FillingCubes,
    Triangles,
    Roots,
    Plankton,
    Water,
    VowelWave,
}

impl Kind {
    pub const ALL: [Kind; 10] = [
        Kind::BinaryTrees,
        Kind::Birds,
        Kind::CubeExplorer,
        Kind::Graph,
        Kind::FillingCubes,
        Kind::Triangles,
        Kind::Roots,
        Kind::Plankton,
        Kind::Water,
        Kind::VowelWave,
    ];

    /// Kebab-case name used by the JS API.
    pub fn name(self) -> &'static str {
        match self {
            Kind::BinaryTrees => "binary-trees",
            Kind::Birds => "birds",
            Kind::CubeExplorer => "cube-explorer",
            Kind::Graph => "graph",
            Kind::FillingCubes => "filling-cubes",
            Kind::Triangles => "triangles",
            Kind::Roots => "roots",
            Kind::Plankton => "plankton",
            Kind::Water => "water",
            Kind::VowelWave => "vowel-wave",
        }
    }

    /// Global namespace the page scripts have always used for this animation.
    pub fn legacy_name(self) -> &'static str {
        match self {
            Kind::BinaryTrees => "BinaryTrees",
            Kind::Birds => "Birds",
            Kind::CubeExplorer => "Climber",
            Kind::Graph => "GraphNetwork",
            Kind::FillingCubes => "RotatingCubes",
            Kind::Triangles => "Triangles",
            Kind::Roots => "DecisionTrees",
            Kind::Plankton => "Plankton",
            Kind::Water => "Water",
            Kind::VowelWave => "LifesArrival",
        }
    }

    pub fn canvas_id(self) -> &'static str {
        match self {
            Kind::BinaryTrees => "binary-trees-canvas",
            Kind::Birds => "birds-canvas",
            Kind::CubeExplorer => "climber-canvas",
            Kind::Graph => "graph-canvas",
            Kind::FillingCubes => "rotating-cubes-canvas",
            Kind::Triangles => "triangles-canvas",
            Kind::Roots => "decision-trees-canvas",
            Kind::Plankton => "plankton-canvas",
            Kind::Water => "water-canvas",
            Kind::VowelWave => "lifesarrival-canvas",
        }
    }

    /// Fresh, uninitialised scene.
    pub fn build(self, profile: Profile, seed: u64) -> Box<dyn Scene> {
        match self {
            Kind::BinaryTrees => Box::new(binary_trees::BinaryTrees::new(seed)),
            Kind::Birds => Box::new(birds::Birds::new(seed)),
            Kind::CubeExplorer => Box::new(cube_explorer::CubeExplorer::new(profile, seed)),
            Kind::Graph => Box::new(graph::Graph::new(seed)),
            Kind::FillingCubes => Box::new(filling_cubes::FillingCubes::new(profile, seed)),
            Kind::Triangles => Box::new(triangles::Triangles::new(profile, seed)),
            Kind::Roots => Box::new(roots::Roots::new(seed)),
            Kind::Plankton => Box::new(plankton::Plankton::new(profile, seed)),
            Kind::Water => Box::new(water::Water::new(seed)),
            Kind::VowelWave => Box::new(vowel_wave::VowelWave::new(seed)),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kind {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Kind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s) || k.legacy_name() == s || k.canvas_id() == s)
            .ok_or_else(|| VizError::UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_naming_scheme() {
        for kind in Kind::ALL {
            assert_eq!(kind.name().parse::<Kind>(), Ok(kind));
            assert_eq!(kind.legacy_name().parse::<Kind>(), Ok(kind));
            assert_eq!(kind.canvas_id().parse::<Kind>(), Ok(kind));
        }
        assert_eq!("Climber".parse::<Kind>(), Ok(Kind::CubeExplorer));
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert_eq!(
            "fireworks".parse::<Kind>(),
            Err(VizError::UnknownKind("fireworks".into()))
        );
    }

    #[test]
    fn built_scenes_report_their_kind() {
        for kind in Kind::ALL {
            assert_eq!(kind.build(Profile::Desktop, 1).name(), kind.name());
        }
    }
}
