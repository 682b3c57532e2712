//! Frame-by-frame ball physics in scaled integer arithmetic.
//!
//! All quantities are `i64` multiplied by the fixed-point scale. Every
//! division truncates toward zero, so a frame computes the same result on
//! any platform and the score of a move is fully determined by its inputs.
//!
//! # Frame Pipeline
//!
//! 1. **Integrate** -- drag acceleration from the old velocity, position
//!    advanced with the old velocity, then velocity advanced.
//! 2. **Walls** -- a ball overlapping a wall and moving outward has that
//!    velocity component reflected.
//! 3. **Collisions** -- each overlapping pair that is approaching exchanges
//!    the velocity component along the line of centres (equal masses). Both
//!    balls are marked touched.
//! 4. **Rest** -- a ball slower than the rest threshold on both axes stops.

use puzzlepool_chain::{CalldataReader, CalldataWriter, ContractError, WireFormat};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Ball layout
// ---------------------------------------------------------------------------

/// Balls in a system: three score balls, the forbidden ball, the player.
pub const BALL_COUNT: usize = 5;

/// Indices of the score balls.
pub const SCORE_BALLS: [usize; 3] = [0, 1, 2];

/// Index of the ball that must not be touched.
pub const FORBID: usize = 3;

/// Index of the ball the player launches.
pub const PLAYER: usize = 4;

/// Fixed-point scale used when none is configured.
pub const DEFAULT_SCALE: i64 = 10_000;

/// Largest coordinate or speed magnitude a frame accepts, whatever the
/// parameters. Keeps the collision products inside `i128`.
pub const MAX_MAGNITUDE: i64 = 1 << 40;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Physical constants of the arena. Lengths and speeds are scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    /// Fixed-point scale shared by every scaled quantity.
    pub scale: i64,
    pub width: i64,
    pub height: i64,
    pub radius: i64,
    /// Frames per unit of time (`dt = 1 / frames_per_second`).
    pub frames_per_second: i64,
    /// Drag coefficient as a fraction: `a = -v * drag_num / drag_den`.
    pub drag_num: i64,
    pub drag_den: i64,
    /// Per-axis speed under which a ball snaps to rest.
    pub rest_threshold: i64,
}

impl PhysicsParams {
    /// Arena 400 x 500, radius 15, dt = 1/20, drag v/10, rest below 5,
    /// all multiplied by `scale`.
    pub const fn with_scale(scale: i64) -> Self {
        Self {
            scale,
            width: scale.saturating_mul(400),
            height: scale.saturating_mul(500),
            radius: scale.saturating_mul(15),
            frames_per_second: 20,
            drag_num: 1,
            drag_den: 10,
            rest_threshold: scale.saturating_mul(5),
        }
    }

    /// Bound on every coordinate and speed of a state fed to
    /// [`euler_forward`]: sixteen arena lengths, capped at [`MAX_MAGNITUDE`].
    pub fn magnitude_limit(&self) -> i64 {
        self.width
            .max(self.height)
            .saturating_mul(16)
            .clamp(0, MAX_MAGNITUDE)
    }
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self::with_scale(DEFAULT_SCALE)
    }
}

// ---------------------------------------------------------------------------
// State types
// ---------------------------------------------------------------------------

/// Kinematic state of one ball.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BallState {
    pub x: i64,
    pub y: i64,
    pub vx: i64,
    pub vy: i64,
    pub ax: i64,
    pub ay: i64,
}

impl BallState {
    /// A ball at rest at `(x, y)`.
    pub const fn at(x: i64, y: i64) -> Self {
        Self {
            x,
            y,
            vx: 0,
            vy: 0,
            ax: 0,
            ay: 0,
        }
    }

    pub const fn from_array(v: [i64; 6]) -> Self {
        Self {
            x: v[0],
            y: v[1],
            vx: v[2],
            vy: v[3],
            ax: v[4],
            ay: v[5],
        }
    }

    pub const fn to_array(&self) -> [i64; 6] {
        [self.x, self.y, self.vx, self.vy, self.ax, self.ay]
    }

    pub fn is_at_rest(&self) -> bool {
        self.vx == 0 && self.vy == 0
    }

    /// Whether position and velocity all lie within `[-limit, limit]`.
    pub fn is_within(&self, limit: i64) -> bool {
        [self.x, self.y, self.vx, self.vy]
            .iter()
            .all(|v| (-limit..=limit).contains(v))
    }
}

/// All balls of one game, in layout order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SystemState {
    pub balls: [BallState; BALL_COUNT],
}

impl SystemState {
    pub fn all_at_rest(&self) -> bool {
        self.balls.iter().all(BallState::is_at_rest)
    }

    /// Whether every ball is within the magnitude limit of `params`.
    pub fn is_within(&self, params: &PhysicsParams) -> bool {
        let limit = params.magnitude_limit();
        self.balls.iter().all(|b| b.is_within(limit))
    }

    pub fn player(&self) -> &BallState {
        &self.balls[PLAYER]
    }

    /// Launch the player ball.
    pub fn with_player_velocity(mut self, vx: i64, vy: i64) -> Self {
        self.balls[PLAYER].vx = vx;
        self.balls[PLAYER].vy = vy;
        self
    }
}

/// Which balls have been hit at least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TouchedMask(pub [bool; BALL_COUNT]);

impl TouchedMask {
    pub const NONE: TouchedMask = TouchedMask([false; BALL_COUNT]);

    pub fn is_touched(&self, ball: usize) -> bool {
        self.0.get(ball).copied().unwrap_or(false)
    }

    pub fn mark(&mut self, ball: usize) {
        if let Some(t) = self.0.get_mut(ball) {
            *t = true;
        }
    }

    pub fn union(self, other: TouchedMask) -> TouchedMask {
        let mut out = self;
        for (o, t) in out.0.iter_mut().zip(other.0) {
            *o |= t;
        }
        out
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|t| **t).count()
    }
}

// ---------------------------------------------------------------------------
// Wire layouts
// ---------------------------------------------------------------------------

impl WireFormat for BallState {
    const WIDTH: usize = 6;

    fn write(&self, w: &mut CalldataWriter) {
        for v in self.to_array() {
            w.push_i64(v);
        }
    }

    fn read(r: &mut CalldataReader<'_>) -> Result<Self, ContractError> {
        let mut v = [0i64; 6];
        for slot in &mut v {
            *slot = r.next_i64()?;
        }
        Ok(Self::from_array(v))
    }
}

impl WireFormat for SystemState {
    const WIDTH: usize = BallState::WIDTH * BALL_COUNT;

    fn write(&self, w: &mut CalldataWriter) {
        for ball in &self.balls {
            w.push(ball);
        }
    }

    fn read(r: &mut CalldataReader<'_>) -> Result<Self, ContractError> {
        let mut balls = [BallState::default(); BALL_COUNT];
        for ball in &mut balls {
            *ball = r.next()?;
        }
        Ok(Self { balls })
    }
}

impl WireFormat for TouchedMask {
    const WIDTH: usize = BALL_COUNT;

    fn write(&self, w: &mut CalldataWriter) {
        for t in self.0 {
            w.push_bool(t);
        }
    }

    fn read(r: &mut CalldataReader<'_>) -> Result<Self, ContractError> {
        let mut mask = [false; BALL_COUNT];
        for t in &mut mask {
            *t = r.next_bool()?;
        }
        Ok(Self(mask))
    }
}

// ---------------------------------------------------------------------------
// Integration
// ---------------------------------------------------------------------------

/// Advance the system by one frame. Returns the new state and the balls
/// that collided during this frame.
///
/// `state` must satisfy [`SystemState::is_within`]; callers decoding
/// untrusted input check that first.
pub fn euler_forward(state: &SystemState, params: &PhysicsParams) -> (SystemState, TouchedMask) {
    let mut next = *state;
    let mut touched = TouchedMask::NONE;

    for ball in &mut next.balls {
        integrate(ball, params);
        bounce_off_walls(ball, params);
    }

    let contact = 2 * params.radius as i128;
    let contact_sq = contact.saturating_mul(contact);
    for i in 0..BALL_COUNT {
        for j in (i + 1)..BALL_COUNT {
            let (head, tail) = next.balls.split_at_mut(j);
            if collide(&mut head[i], &mut tail[0], contact_sq) {
                touched.mark(i);
                touched.mark(j);
            }
        }
    }

    for ball in &mut next.balls {
        if ball.vx.abs() < params.rest_threshold && ball.vy.abs() < params.rest_threshold {
            ball.vx = 0;
            ball.vy = 0;
        }
    }

    (next, touched)
}

fn integrate(ball: &mut BallState, params: &PhysicsParams) {
    let dt = params.frames_per_second;
    ball.ax = -(ball.vx * params.drag_num / params.drag_den);
    ball.ay = -(ball.vy * params.drag_num / params.drag_den);
    ball.x += ball.vx / dt;
    ball.y += ball.vy / dt;
    ball.vx += ball.ax / dt;
    ball.vy += ball.ay / dt;
}

fn bounce_off_walls(ball: &mut BallState, params: &PhysicsParams) {
    let r = params.radius;
    let (max_x, max_y) = (params.width.saturating_sub(r), params.height.saturating_sub(r));
    if (ball.x < r && ball.vx < 0) || (ball.x > max_x && ball.vx > 0) {
        ball.vx = -ball.vx;
    }
    if (ball.y < r && ball.vy < 0) || (ball.y > max_y && ball.vy > 0) {
        ball.vy = -ball.vy;
    }
}

/// Equal-mass elastic impulse between two overlapping, approaching balls.
fn collide(a: &mut BallState, b: &mut BallState, contact_sq: i128) -> bool {
    let dx = b.x as i128 - a.x as i128;
    let dy = b.y as i128 - a.y as i128;
    let d2 = dx * dx + dy * dy;
    if d2 == 0 || d2 >= contact_sq {
        return false;
    }
    let k = (a.vx as i128 - b.vx as i128) * dx + (a.vy as i128 - b.vy as i128) * dy;
    if k <= 0 {
        return false;
    }
    let ix = (k * dx / d2) as i64;
    let iy = (k * dy / d2) as i64;
    a.vx -= ix;
    a.vy -= iy;
    b.vx += ix;
    b.vy += iy;
    true
}

// ---------------------------------------------------------------------------
// Whole-game driver
// ---------------------------------------------------------------------------

/// Outcome of simulating a game in one go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Simulation {
    pub state: SystemState,
    pub touched: TouchedMask,
    pub frames: u64,
}

/// Run frames until every ball rests or `max_frames` is reached.
pub fn simulate(initial: &SystemState, params: &PhysicsParams, max_frames: u64) -> Simulation {
    let mut state = *initial;
    let mut touched = TouchedMask::NONE;
    let mut frames = 0;
    while frames < max_frames {
        let (next, hit) = euler_forward(&state, params);
        state = next;
        touched = touched.union(hit);
        frames += 1;
        if state.all_at_rest() {
            break;
        }
    }
    Simulation {
        state,
        touched,
        frames,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
