//! Bounded-step tracing
//!
//! A [`Tracer`] answers one ray query with a step count attached, so callers
//! can budget raycasts across many pixels. [`MipmapTracer`] starts at the
//! coarsest level of a hierarchy and moves one level finer on every hit,
//! running at most `step_budget` probes per level visit.
//!
//! Refinement is monotonic: once a level is left for a finer one, the tracer
//! never returns to a coarser level, even after a long run of misses.

use glam::{IVec3, Vec3};

use super::dda::{occupancy_probe, DdaState, DdaStop};
use super::hit::{RayHit, Side};
use crate::voxel::grid::VoxelGrid;
use crate::voxel::hierarchy::GridHierarchy;

/// Input to a trace
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceParams {
    /// World-space ray origin
    pub origin: Vec3,
    /// Ray direction (normalized for meaningful distances)
    pub direction: Vec3,
    /// Maximum cells probed over the whole trace, 0 for no limit
    pub max_steps: u32,
}

impl TraceParams {
    /// Unbounded trace
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            max_steps: 0,
        }
    }

    pub fn with_max_steps(self, max_steps: u32) -> Self {
        Self { max_steps, ..self }
    }
}

/// Output of a trace
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TraceResult {
    pub hit: bool,
    /// The ray left the grid
    pub out_of_bounds: bool,
    /// Hit face, or the side of the last step when nothing was hit
    pub side: Option<Side>,
    /// World-space stop position, snapped to the crossed boundary
    pub position: Vec3,
    pub map_pos: IVec3,
    /// Cells probed over the whole trace
    pub steps: u32,
    /// Hierarchy level the trace stopped at (0 = finest)
    pub level: usize,
}

impl TraceResult {
    /// Neither hit nor left the grid: the step limit ran out
    pub fn exhausted(&self) -> bool {
        !self.hit && !self.out_of_bounds
    }

    pub fn to_ray_hit(&self) -> RayHit {
        RayHit {
            side: if self.hit { self.side } else { None },
            position: self.position,
            map_pos: self.map_pos,
            level: self.level,
        }
    }
}

/// Something that can answer ray queries with a step count
pub trait Tracer {
    fn trace(&self, params: &TraceParams) -> TraceResult;
}

/// `entered` is the face the current level's traversal started on, used as
/// the side when no step has been taken at this level yet.
fn finish(
    state: &DdaState,
    stop: DdaStop,
    entered: Option<Side>,
    steps: u32,
    level: usize,
) -> TraceResult {
    let (hit, out_of_bounds, side) = match stop {
        DdaStop::Hit(side) => (true, false, Some(side)),
        DdaStop::OutOfBounds => (false, true, state.side().or(entered)),
        DdaStop::Budget => (false, false, state.side().or(entered)),
    };

    TraceResult {
        hit,
        out_of_bounds,
        side,
        position: state.boundary_position(),
        map_pos: state.map_pos(),
        steps,
        level,
    }
}

/// Trace one grid with directional out-of-bounds and `params.max_steps` as the limit
pub fn trace(grid: &VoxelGrid, params: &TraceParams) -> TraceResult {
    trace_with(grid, params, |_, _| {})
}

/// [`trace`] with an observer called for every probed cell
pub fn trace_with<F>(grid: &VoxelGrid, params: &TraceParams, mut observer: F) -> TraceResult
where
    F: FnMut(&VoxelGrid, IVec3),
{
    let direction = params.direction;
    let mut probe = |g: &VoxelGrid, p: IVec3| {
        observer(g, p);
        occupancy_probe(g, p, direction)
    };

    let mut state = DdaState::new(grid, params.origin, direction);
    let stop = state.run(grid, &mut probe, params.max_steps);
    finish(&state, stop, None, state.steps(), 0)
}

/// Tracer over a single grid
#[derive(Clone, Copy, Debug)]
pub struct GridTracer<'a> {
    grid: &'a VoxelGrid,
}

impl<'a> GridTracer<'a> {
    pub fn new(grid: &'a VoxelGrid) -> Self {
        Self { grid }
    }
}

impl Tracer for GridTracer<'_> {
    fn trace(&self, params: &TraceParams) -> TraceResult {
        trace(self.grid, params)
    }
}

/// Coarse-to-fine tracer over a grid hierarchy
#[derive(Clone, Copy, Debug)]
pub struct MipmapTracer<'a> {
    hierarchy: &'a GridHierarchy,
    step_budget: u32,
}

impl<'a> MipmapTracer<'a> {
    /// Probes per level visit before the tracer re-evaluates
    pub const DEFAULT_STEP_BUDGET: u32 = 4;

    pub fn new(hierarchy: &'a GridHierarchy) -> Self {
        Self {
            hierarchy,
            step_budget: Self::DEFAULT_STEP_BUDGET,
        }
    }

    /// Set the per-visit probe budget (at least 1)
    pub fn with_step_budget(self, step_budget: u32) -> Self {
        Self {
            step_budget: step_budget.max(1),
            ..self
        }
    }

    pub fn step_budget(&self) -> u32 {
        self.step_budget
    }

    /// Trace with an observer called for every probed cell, at every level
    pub fn trace_with<F>(&self, params: &TraceParams, mut observer: F) -> TraceResult
    where
        F: FnMut(&VoxelGrid, IVec3),
    {
        let direction = params.direction;
        let mut probe = |g: &VoxelGrid, p: IVec3| {
            observer(g, p);
            occupancy_probe(g, p, direction)
        };

        let mut level = self.hierarchy.coarsest_index();
        let mut grid = &self.hierarchy.levels()[level];
        let mut state = DdaState::new(grid, params.origin, direction);
        let mut entered = None;
        let mut steps = 0;

        loop {
            let budget = if params.max_steps > 0 {
                self.step_budget.min(params.max_steps - steps)
            } else {
                self.step_budget
            };

            let before = state.steps();
            let stop = state.run(grid, &mut probe, budget);
            steps += state.steps() - before;

            match stop {
                DdaStop::OutOfBounds => return finish(&state, stop, entered, steps, level),
                DdaStop::Hit(side) => {
                    // A finer level restarts on the crossed boundary, so its
                    // first cell can hit before any step: keep the entry face
                    let side = match (state.side(), entered) {
                        (None, Some(entered)) => entered,
                        _ => side,
                    };
                    if level == 0 {
                        return finish(&state, DdaStop::Hit(side), entered, steps, level);
                    }

                    // Continue one level finer from where the coarse hit landed
                    let position = state.boundary_position();
                    entered = Some(side);
                    level -= 1;
                    grid = &self.hierarchy.levels()[level];
                    state = DdaState::new(grid, position, direction);
                }
                DdaStop::Budget => {}
            }

            if params.max_steps > 0 && steps >= params.max_steps {
                return finish(&state, DdaStop::Budget, entered, steps, level);
            }
        }
    }
}

impl Tracer for MipmapTracer<'_> {
    fn trace(&self, params: &TraceParams) -> TraceResult {
        self.trace_with(params, |_, _| {})
    }
}
