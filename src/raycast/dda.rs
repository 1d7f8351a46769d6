//! Single-resolution voxel traversal (DDA)
//!
//! Visits every cell a ray passes through, in order, using only additions per
//! step. The traversal state is kept in [`DdaState`] so bounded-step callers
//! can stop and resume without re-deriving the start cell.

use glam::{IVec3, Vec3};

use super::hit::{RayHit, Side};
use crate::voxel::grid::VoxelGrid;

/// Step length used for axes the ray does not move along
const NO_STEP: f32 = 1e30;

/// Outcome of testing one cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Probe {
    Hit,
    Miss,
    OutOfBounds,
}

/// Why [`DdaState::run`] returned
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DdaStop {
    Hit(Side),
    OutOfBounds,
    /// Step budget used up, the state can be resumed
    Budget,
}

/// True if `map_pos` is outside the grid on some axis and the ray is not
/// heading back toward the grid on that axis.
pub fn heading_away(grid: &VoxelGrid, map_pos: IVec3, direction: Vec3) -> bool {
    let dims = grid.dims().as_ivec3();
    (map_pos.x < 0 && direction.x <= 0.0)
        || (map_pos.y < 0 && direction.y <= 0.0)
        || (map_pos.z < 0 && direction.z <= 0.0)
        || (map_pos.x >= dims.x && direction.x >= 0.0)
        || (map_pos.y >= dims.y && direction.y >= 0.0)
        || (map_pos.z >= dims.z && direction.z >= 0.0)
}

/// Standard occupancy test with directional out-of-bounds.
///
/// A cell outside the grid only terminates the traversal when the ray is
/// moving away from the grid; otherwise it is a miss, so rays that start
/// outside one face can still enter through another.
pub fn occupancy_probe(grid: &VoxelGrid, map_pos: IVec3, direction: Vec3) -> Probe {
    if !grid.contains(map_pos) {
        if heading_away(grid, map_pos, direction) {
            Probe::OutOfBounds
        } else {
            Probe::Miss
        }
    } else if grid.is_occupied(map_pos) {
        Probe::Hit
    } else {
        Probe::Miss
    }
}

/// Resumable traversal through one grid
#[derive(Clone, Debug)]
pub struct DdaState {
    voxel_size: f32,
    /// Ray origin in voxel space
    origin: Vec3,
    direction: Vec3,
    map_pos: IVec3,
    step: IVec3,
    /// Ray length between boundaries on each axis
    delta_dist: Vec3,
    /// Ray length to the next boundary on each axis
    side_dist: Vec3,
    /// Ray length travelled to the current cell
    distance: f32,
    /// Side of the most recent step
    side: Option<Side>,
    /// Cells probed so far
    steps: u32,
}

impl DdaState {
    /// Start a traversal of `grid` from a world-space origin
    pub fn new(grid: &VoxelGrid, origin: Vec3, direction: Vec3) -> Self {
        let voxel_size = grid.voxel_size();
        let origin = origin / voxel_size;
        let map_pos = origin.floor().as_ivec3();

        let inverse = |d: f32| if d != 0.0 { (1.0 / d).abs() } else { NO_STEP };
        let delta_dist = Vec3::new(inverse(direction.x), inverse(direction.y), inverse(direction.z));

        let mut step = IVec3::ONE;
        let mut side_dist = Vec3::ZERO;
        for axis in 0..3 {
            let cell = map_pos[axis] as f32;
            if direction[axis] < 0.0 {
                step[axis] = -1;
                side_dist[axis] = (origin[axis] - cell) * delta_dist[axis];
            } else {
                side_dist[axis] = (cell + 1.0 - origin[axis]) * delta_dist[axis];
            }
        }

        Self {
            voxel_size,
            origin,
            direction,
            map_pos,
            step,
            delta_dist,
            side_dist,
            distance: 0.0,
            side: None,
            steps: 0,
        }
    }

    /// Current cell
    pub fn map_pos(&self) -> IVec3 {
        self.map_pos
    }

    /// Side of the most recent step, `None` before the first step
    pub fn side(&self) -> Option<Side> {
        self.side
    }

    /// Cells probed so far
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// World-space point where the ray entered the current cell
    pub fn position(&self) -> Vec3 {
        (self.origin + self.direction * self.distance) * self.voxel_size
    }

    /// Like [`DdaState::position`], with the coordinate on the last stepped
    /// axis snapped to the exact cell boundary.
    pub fn boundary_position(&self) -> Vec3 {
        let mut p = self.origin + self.direction * self.distance;
        if let Some(axis) = self.side.and_then(Side::axis) {
            let cell = self.map_pos[axis];
            let boundary = if self.step[axis] > 0 { cell } else { cell + 1 };
            p[axis] = boundary as f32;
        }
        p * self.voxel_size
    }

    /// Move to the next cell along the axis with the nearest boundary.
    /// Ties go to X, then Y, then Z.
    pub fn advance(&mut self) {
        let s = self.side_dist;
        let axis = if s.x <= s.y && s.x <= s.z {
            0
        } else if s.y <= s.x && s.y <= s.z {
            1
        } else {
            2
        };

        self.distance = self.side_dist[axis];
        self.side_dist[axis] += self.delta_dist[axis];
        self.map_pos[axis] += self.step[axis];
        self.side = Some(Side::from_step(axis, self.step[axis]));
    }

    /// Probe cells until a hit, out-of-bounds, or `max_steps` probes (0 = no limit).
    ///
    /// `grid` must be the grid the state was created for.
    pub fn run<F>(&mut self, grid: &VoxelGrid, probe: &mut F, max_steps: u32) -> DdaStop
    where
        F: FnMut(&VoxelGrid, IVec3) -> Probe,
    {
        let mut taken = 0;
        loop {
            let result = probe(grid, self.map_pos);
            self.steps += 1;
            taken += 1;

            match result {
                Probe::OutOfBounds => return DdaStop::OutOfBounds,
                Probe::Hit => return DdaStop::Hit(self.side.unwrap_or(Side::Inside)),
                Probe::Miss => {}
            }

            self.advance();

            if max_steps > 0 && taken >= max_steps {
                return DdaStop::Budget;
            }
        }
    }
}

/// Cast a ray through one grid using [`occupancy_probe`]
pub fn raycast(grid: &VoxelGrid, origin: Vec3, direction: Vec3) -> RayHit {
    raycast_with(grid, origin, direction, |g, p| occupancy_probe(g, p, direction))
}

/// Cast a ray through one grid with a custom per-cell probe.
///
/// The probe must eventually report `OutOfBounds` for cells the ray can no
/// longer return from, or the traversal does not terminate.
pub fn raycast_with<F>(grid: &VoxelGrid, origin: Vec3, direction: Vec3, mut probe: F) -> RayHit
where
    F: FnMut(&VoxelGrid, IVec3) -> Probe,
{
    let mut state = DdaState::new(grid, origin, direction);
    let side = match state.run(grid, &mut probe, 0) {
        DdaStop::Hit(side) => Some(side),
        DdaStop::OutOfBounds | DdaStop::Budget => None,
    };

    RayHit {
        side,
        position: state.position(),
        map_pos: state.map_pos(),
        level: 0,
    }
}

/// Cast a ray from `start` toward `end`, reporting a hit only if it lies
/// before `end`.
pub fn raycast_segment(grid: &VoxelGrid, start: Vec3, end: Vec3) -> RayHit {
    let direction = (end - start).normalize_or_zero();
    if direction == Vec3::ZERO {
        return RayHit {
            side: None,
            position: start,
            map_pos: (start / grid.voxel_size()).floor().as_ivec3(),
            level: 0,
        };
    }

    let hit = raycast(grid, start, direction);
    if hit.is_hit() && start.distance(hit.position) < start.distance(end) {
        hit
    } else {
        RayHit { side: None, ..hit }
    }
}
