//! Barnes-Hut spatial decomposition for the force simulator.
//!
//! A quadtree (2D) or octree (3D) over node positions, rebuilt at the start of
//! every simulation step and dropped at its end. Each cell stores the node
//! count of its subtree (the aggregate mass) and the subtree's centroid, so a
//! far-away cluster can stand in for all of its members.
//!
//! # Acceptance criterion
//!
//! While walking the tree for a node at `p`, a cell of side `s` whose centroid
//! lies at distance `d` is taken as a single body when `s / d < theta` and the
//! cell does not contain `p`. Otherwise its children are visited. Leaves are
//! always evaluated body by body.
//!
//! Cells live in a flat arena; the children of a split cell occupy a
//! contiguous run of `fanout` slots starting at `first_child`.

use serde::{Deserialize, Serialize};

use crate::graph::{GraphModel, NodeId};

/// Dimensionality of the layout space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    /// Planar layout, z held at 0, quadtree.
    #[default]
    Two,
    /// Spatial layout, octree.
    Three,
}

impl Dimension {
    /// Number of active axes.
    #[inline]
    pub fn axes(self) -> usize {
        match self {
            Dimension::Two => 2,
            Dimension::Three => 3,
        }
    }

    /// Children per split cell.
    #[inline]
    pub fn fanout(self) -> usize {
        1 << self.axes()
    }
}

/// Splitting stops at this depth; deeper coincident nodes share a leaf.
pub const MAX_DEPTH: u32 = 32;

#[derive(Debug, Clone)]
struct Cell {
    center: [f32; 3],
    half: f32,
    depth: u32,
    mass: f32,
    centroid: [f32; 3],
    first_child: Option<usize>,
    body: Option<(NodeId, [f32; 3])>,
    /// Extra members of a leaf at MAX_DEPTH.
    overflow: Vec<(NodeId, [f32; 3])>,
}

impl Cell {
    fn empty(center: [f32; 3], half: f32, depth: u32) -> Self {
        Self {
            center,
            half,
            depth,
            mass: 0.0,
            centroid: [0.0; 3],
            first_child: None,
            body: None,
            overflow: Vec::new(),
        }
    }

    fn contains(&self, p: [f32; 3], axes: usize) -> bool {
        (0..axes).all(|axis| (p[axis] - self.center[axis]).abs() <= self.half)
    }

    fn members(&self) -> impl Iterator<Item = &(NodeId, [f32; 3])> {
        self.body.iter().chain(self.overflow.iter())
    }
}

/// One body reported during a tree walk: either a single node or a whole
/// subtree collapsed to its centroid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    /// Position of the node, or centroid of the subtree.
    pub position: [f32; 3],
    /// Number of nodes represented.
    pub mass: f32,
}

/// Per-step spatial tree over node positions.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    dimension: Dimension,
    cells: Vec<Cell>,
}

impl SpatialIndex {
    /// Build the tree over every node of the model.
    ///
    /// An empty model yields an empty tree.
    pub fn build(model: &GraphModel, dimension: Dimension) -> Self {
        let mut index = Self {
            dimension,
            cells: Vec::new(),
        };

        let Some((min, max)) = model.bounds() else {
            return index;
        };

        let axes = dimension.axes();
        let mut center = [0.0f32; 3];
        let mut extent = 0.0f32;
        for axis in 0..axes {
            center[axis] = (min[axis] + max[axis]) * 0.5;
            extent = extent.max(max[axis] - min[axis]);
        }
        // Pad so that boundary nodes fall strictly inside the root.
        let half = extent * 0.5 * 1.01 + 1e-3;
        index.cells.push(Cell::empty(center, half, 0));

        let xs = model.positions_x();
        let ys = model.positions_y();
        let zs = model.positions_z();
        for id in model.node_ids() {
            let i = id.index();
            let mut p = [xs[i], ys[i], zs[i]];
            if axes == 2 {
                p[2] = 0.0;
            }
            index.insert(id, p);
        }

        index
    }

    /// Whether the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of allocated cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Node count of the whole tree.
    pub fn total_mass(&self) -> f32 {
        self.cells.first().map_or(0.0, |root| root.mass)
    }

    /// Centroid of every node in the tree.
    pub fn centroid(&self) -> Option<[f32; 3]> {
        self.cells.first().map(|root| root.centroid)
    }

    /// Side length of the root region.
    pub fn extent(&self) -> f32 {
        self.cells.first().map_or(0.0, |root| root.half * 2.0)
    }

    fn child_slot(&self, cell: usize, p: [f32; 3]) -> usize {
        let c = &self.cells[cell];
        let mut slot = 0;
        for axis in 0..self.dimension.axes() {
            if p[axis] >= c.center[axis] {
                slot |= 1 << axis;
            }
        }
        slot
    }

    fn split(&mut self, cell: usize) -> usize {
        let first = self.cells.len();
        let (center, quarter, depth) = {
            let c = &self.cells[cell];
            (c.center, c.half * 0.5, c.depth + 1)
        };
        for slot in 0..self.dimension.fanout() {
            let mut child_center = center;
            for axis in 0..self.dimension.axes() {
                if slot & (1 << axis) != 0 {
                    child_center[axis] += quarter;
                } else {
                    child_center[axis] -= quarter;
                }
            }
            self.cells.push(Cell::empty(child_center, quarter, depth));
        }
        self.cells[cell].first_child = Some(first);
        first
    }

    fn insert(&mut self, id: NodeId, p: [f32; 3]) {
        let mut cell = 0;
        loop {
            let (prev_mass, first_child, depth) = {
                let c = &mut self.cells[cell];
                let prev_mass = c.mass;
                for axis in 0..3 {
                    c.centroid[axis] = (c.centroid[axis] * prev_mass + p[axis]) / (prev_mass + 1.0);
                }
                c.mass += 1.0;
                (prev_mass, c.first_child, c.depth)
            };

            if let Some(first) = first_child {
                cell = first + self.child_slot(cell, p);
                continue;
            }

            if prev_mass == 0.0 {
                self.cells[cell].body = Some((id, p));
                return;
            }

            if depth >= MAX_DEPTH {
                self.cells[cell].overflow.push((id, p));
                return;
            }

            // Occupied leaf: push the resident down one level, then keep
            // descending with the new node.
            let resident = self.cells[cell].body.take();
            let first = self.split(cell);
            if let Some((other, q)) = resident {
                let child = first + self.child_slot(cell, q);
                let c = &mut self.cells[child];
                c.mass = 1.0;
                c.centroid = q;
                c.body = Some((other, q));
            }
            cell = first + self.child_slot(cell, p);
        }
    }

    /// Walk the tree on behalf of `target` located at `p`, reporting every
    /// body that acts on it. The target itself is never reported.
    pub fn visit_bodies<F>(&self, target: NodeId, p: [f32; 3], theta: f32, mut visit: F)
    where
        F: FnMut(Body),
    {
        if self.cells.is_empty() {
            return;
        }
        let axes = self.dimension.axes();
        let fanout = self.dimension.fanout();

        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let cell = &self.cells[index];
            if cell.mass == 0.0 {
                continue;
            }

            let Some(first) = cell.first_child else {
                for &(member, position) in cell.members() {
                    if member != target {
                        visit(Body {
                            position,
                            mass: 1.0,
                        });
                    }
                }
                continue;
            };

            let distance = distance(p, cell.centroid);
            let size = cell.half * 2.0;
            if !cell.contains(p, axes) && distance > 0.0 && size / distance < theta {
                visit(Body {
                    position: cell.centroid,
                    mass: cell.mass,
                });
            } else {
                stack.extend(first..first + fanout);
            }
        }
    }
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}
