//! Uniform spatial hash over 3D cells.

use glam::{IVec3, Vec3};
use std::collections::HashMap;

/// Maps cells of side `cell_size` to the entity indices inside them.
/// Rebuilt from scratch each frame by its owner.
#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell_size: f32,
    cells: HashMap<IVec3, Vec<usize>>,
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn cell_of(&self, p: Vec3) -> IVec3 {
        (p / self.cell_size).floor().as_ivec3()
    }

    /// Empties every bucket but keeps allocations around for the next frame.
    pub fn clear(&mut self) {
        self.cells.values_mut().for_each(Vec::clear);
    }

    /// Release all memory, including bucket allocations.
    pub fn reset(&mut self) {
        self.cells = HashMap::new();
    }

    pub fn insert(&mut self, index: usize, p: Vec3) {
        let cell = self.cell_of(p);
        self.cells.entry(cell).or_default().push(index);
    }

    /// Indices in the 3x3x3 block of cells around `p`.
    pub fn neighbors(&self, p: Vec3) -> impl Iterator<Item = usize> + '_ {
        let c = self.cell_of(p);
        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| {
                (-1..=1).flat_map(move |dz| {
                    self.cells
                        .get(&(c + IVec3::new(dx, dy, dz)))
                        .into_iter()
                        .flatten()
                        .copied()
                })
            })
        })
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbors_cover_adjacent_cells() {
        let mut grid = SpatialHash::new(10.0);
        grid.insert(0, Vec3::new(5.0, 5.0, 0.0));
        grid.insert(1, Vec3::new(14.0, 5.0, 0.0));
        grid.insert(2, Vec3::new(50.0, 5.0, 0.0));
        let mut found: Vec<usize> = grid.neighbors(Vec3::new(9.0, 9.0, 0.0)).collect();
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn negative_coordinates_floor() {
        let grid = SpatialHash::new(10.0);
        assert_eq!(grid.cell_of(Vec3::new(-0.5, 0.5, -10.0)), IVec3::new(-1, 0, -1));
    }

    #[test]
    fn clear_keeps_nothing_visible() {
        let mut grid = SpatialHash::new(4.0);
        grid.insert(3, Vec3::ONE);
        assert_eq!(grid.len(), 1);
        grid.clear();
        assert!(grid.is_empty());
        assert_eq!(grid.neighbors(Vec3::ONE).count(), 0);
    }
}
