//! Procedural static terrain.
//!
//! [`TerrainGenerator`] builds a 2D maze of box cells. The layout is a
//! string with one character per cell, row by row starting at the
//! bottom-left corner: `'x'` for a blocked cell, `'*'` for an empty one.
//!
//! Every grid position owns one cell entity for the whole life of the
//! generator. Changing the layout toggles cells instead of rebuilding them,
//! so adapters bound to the cells stay valid.

use std::cell::RefCell;
use std::rc::Rc;

use nalgebra::{Point3, Vector2, Vector3};
use sim_types::Pose;

use crate::adapter::{ColliderAdapter, DrawableAdapter};
use crate::collider::Collider;
use crate::drawable::Drawable;
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::shape::ShapeDescriptor;

/// Layout character for an empty cell.
pub const CELL_EMPTY: char = '*';

/// Layout character for a blocked cell.
pub const CELL_BLOCKED: char = 'x';

/// One grid position of a maze.
#[derive(Debug, Clone)]
pub struct TerrainCell {
    collider: Collider,
    drawable: Drawable,
    blocked: bool,
}

impl TerrainCell {
    /// Collision box of this cell.
    #[must_use]
    pub fn collider(&self) -> &Collider {
        &self.collider
    }

    /// Visual box of this cell.
    #[must_use]
    pub fn drawable(&self) -> &Drawable {
        &self.drawable
    }

    /// Whether the cell is part of the maze walls.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Bind a physics adapter to the cell's collider.
    pub fn attach_collider_adapter(&mut self, adapter: &Rc<RefCell<dyn ColliderAdapter>>) {
        self.collider.attach_adapter(adapter);
    }

    /// Bind a visualizer adapter to the cell's drawable.
    pub fn attach_drawable_adapter(&mut self, adapter: &Rc<RefCell<dyn DrawableAdapter>>) {
        self.drawable.attach_adapter(adapter);
    }

    fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
        let bits = i32::from(blocked);
        self.collider.set_collision_group(bits);
        self.collider.set_collision_mask(bits);
        self.drawable.set_visible(blocked);
    }
}

/// Maze of static boxes on a regular grid.
#[derive(Debug, Clone)]
pub struct TerrainGenerator {
    name: String,
    count_x: usize,
    count_y: usize,
    cell_size: Vector3<f64>,
    bottom_left: Vector2<f64>,
    cells: Vec<TerrainCell>,
    world: Pose,
    state: LifecycleState,
}

impl TerrainGenerator {
    /// Create a maze of `count_x` by `count_y` cells.
    ///
    /// The initial layout blocks every cell whose two indices are even.
    #[must_use]
    pub fn maze2d(
        name: impl Into<String>,
        count_x: usize,
        count_y: usize,
        cell_size: Vector3<f64>,
        bottom_left: Vector2<f64>,
    ) -> Self {
        let name = name.into();
        let mut cells = Vec::with_capacity(count_x * count_y);
        for iy in 0..count_y {
            for ix in 0..count_x {
                let cell_name = format!("{name}_cell_{ix}_{iy}");
                let center = Point3::new(
                    (ix as f64 + 0.5) * cell_size.x + bottom_left.x,
                    (iy as f64 + 0.5) * cell_size.y + bottom_left.y,
                    0.5 * cell_size.z,
                );
                let shape = ShapeDescriptor::cuboid(cell_size).with_local(Pose::from_position(center));
                cells.push(TerrainCell {
                    collider: Collider::new(cell_name.clone(), shape.clone()),
                    drawable: Drawable::new(cell_name, shape),
                    blocked: true,
                });
            }
        }

        let mut terrain = Self {
            name,
            count_x,
            count_y,
            cell_size,
            bottom_left,
            cells,
            world: Pose::identity(),
            state: LifecycleState::Uninitialized,
        };
        let layout: Vec<bool> = (0..count_x * count_y)
            .map(|i| (i % count_x.max(1)) % 2 == 0 && (i / count_x.max(1)) % 2 == 0)
            .collect();
        terrain.apply(&layout);
        terrain
    }

    /// Cells along x and y.
    #[must_use]
    pub fn counts(&self) -> (usize, usize) {
        (self.count_x, self.count_y)
    }

    /// Size of one cell.
    #[must_use]
    pub fn cell_size(&self) -> &Vector3<f64> {
        &self.cell_size
    }

    /// Position of the bottom-left corner of the grid.
    #[must_use]
    pub fn bottom_left(&self) -> &Vector2<f64> {
        &self.bottom_left
    }

    /// Overall extents of the maze.
    #[must_use]
    pub fn maze_size(&self) -> Vector3<f64> {
        Vector3::new(
            self.count_x as f64 * self.cell_size.x,
            self.count_y as f64 * self.cell_size.y,
            self.cell_size.z,
        )
    }

    /// All cells, row by row from the bottom-left corner.
    #[must_use]
    pub fn cells(&self) -> &[TerrainCell] {
        &self.cells
    }

    /// Mutable cells, for binding adapters.
    pub fn cells_mut(&mut self) -> &mut [TerrainCell] {
        &mut self.cells
    }

    /// Cell at grid position `(ix, iy)`.
    #[must_use]
    pub fn cell(&self, ix: usize, iy: usize) -> Option<&TerrainCell> {
        if ix >= self.count_x || iy >= self.count_y {
            return None;
        }
        self.cells.get(ix + iy * self.count_x)
    }

    /// Number of blocked cells.
    #[must_use]
    pub fn blocked_count(&self) -> usize {
        self.cells.iter().filter(|c| c.blocked).count()
    }

    /// Current layout as a string of [`CELL_BLOCKED`] and [`CELL_EMPTY`].
    #[must_use]
    pub fn layout_string(&self) -> String {
        self.cells
            .iter()
            .map(|c| if c.blocked { CELL_BLOCKED } else { CELL_EMPTY })
            .collect()
    }

    /// Replace the layout from a string.
    ///
    /// A layout whose length does not match the grid is ignored with a
    /// warning. Any character other than [`CELL_BLOCKED`] is an empty cell.
    pub fn set_layout(&mut self, layout: &str) {
        let layout: Vec<bool> = layout.chars().map(|c| c == CELL_BLOCKED).collect();
        self.set_layout_cells(&layout);
    }

    /// Replace the layout from per-cell flags, `true` meaning blocked.
    pub fn set_layout_cells(&mut self, layout: &[bool]) {
        if layout.len() != self.cells.len() {
            tracing::warn!(
                terrain = %self.name,
                expected = self.cells.len(),
                got = layout.len(),
                "maze layout size mismatch, ignoring"
            );
            return;
        }
        self.apply(layout);
    }

    fn apply(&mut self, layout: &[bool]) {
        for (cell, &blocked) in self.cells.iter_mut().zip(layout) {
            cell.set_blocked(blocked);
        }
        tracing::debug!(terrain = %self.name, blocked = self.blocked_count(), "maze layout applied");
    }
}

impl Lifecycle for TerrainGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self) -> &Pose {
        &self.world
    }

    fn state(&self) -> LifecycleState {
        self.state
    }

    fn initialize(&mut self, parent: &Pose) {
        self.world = *parent;
        for cell in &mut self.cells {
            cell.collider.initialize(parent);
            cell.drawable.initialize(parent);
        }
        self.state = LifecycleState::Initialized;
    }

    fn pre_step(&mut self) {}

    fn post_step(&mut self, parent: &Pose) {
        self.world = *parent;
        for cell in &mut self.cells {
            cell.collider.post_step(parent);
            cell.drawable.post_step(parent);
        }
    }

    fn reset(&mut self, parent: &Pose) {
        self.world = *parent;
        for cell in &mut self.cells {
            cell.collider.reset(parent);
            cell.drawable.reset(parent);
        }
    }

    fn detach_sim(&mut self) {
        for cell in &mut self.cells {
            cell.collider.detach_sim();
        }
    }

    fn detach_viz(&mut self) {
        for cell in &mut self.cells {
            cell.drawable.detach_viz();
        }
    }
}
