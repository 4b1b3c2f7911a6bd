//! Vertex batches handed from GL scenes to the WebGL renderer.

use glam::{Mat4, Vec3};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
    TriangleFan,
    Lines,
    LineLoop,
}

/// Interleaved-free vertex data: `positions` holds xyz, `colors` rgba.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    pub primitive: Primitive,
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
}

impl Batch {
    pub fn new(primitive: Primitive) -> Self {
        Self {
            primitive,
            positions: Vec::new(),
            colors: Vec::new(),
        }
    }

    pub fn push(&mut self, p: Vec3, rgba: [f32; 4]) {
        self.positions.extend_from_slice(&p.to_array());
        self.colors.extend_from_slice(&rgba);
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// One frame of GL output.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub projection: Mat4,
    pub view: Mat4,
    pub clear: [f32; 4],
    pub batches: Vec<Batch>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.batches.iter().map(Batch::vertex_count).sum()
    }
}
