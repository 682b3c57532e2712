//! Puzzle layouts and scoring.

use crate::physics::{BALL_COUNT, BallState, FORBID, SCORE_BALLS, SystemState, TouchedMask};
use puzzlepool_chain::{CalldataReader, CalldataWriter, ContractError, WireFormat};
use serde::{Deserialize, Serialize};

/// Points for touching each score ball, in ball order.
pub const SCORE_POINTS: [u64; 3] = [10, 15, 20];

/// Frame cap of a single game.
pub const MAX_FRAMES: u64 = 150;

/// Starting positions of the five balls, in arena units (unscaled).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub positions: [(i64, i64); BALL_COUNT],
}

/// The built-in catalog, in rotation order.
pub const PUZZLES: [Puzzle; 2] = [
    Puzzle {
        positions: [(300, 250), (200, 250), (100, 250), (200, 350), (200, 100)],
    },
    Puzzle {
        positions: [(70, 70), (170, 220), (260, 350), (150, 430), (250, 400)],
    },
];

impl Puzzle {
    /// Scaled layout of this puzzle.
    pub fn layout(&self, scale: i64) -> PuzzleLayout {
        let mut positions = [(0, 0); BALL_COUNT];
        for (out, (x, y)) in positions.iter_mut().zip(self.positions) {
            *out = (x.saturating_mul(scale), y.saturating_mul(scale));
        }
        PuzzleLayout { positions }
    }
}

/// Scaled starting positions as exchanged between contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PuzzleLayout {
    pub positions: [(i64, i64); BALL_COUNT],
}

impl PuzzleLayout {
    /// Every ball at rest at its starting position.
    pub fn initial_state(&self) -> SystemState {
        let mut state = SystemState::default();
        for (ball, (x, y)) in state.balls.iter_mut().zip(self.positions) {
            *ball = BallState::at(x, y);
        }
        state
    }
}

impl WireFormat for PuzzleLayout {
    const WIDTH: usize = 2 * BALL_COUNT;

    fn write(&self, w: &mut CalldataWriter) {
        for (x, y) in self.positions {
            w.push_i64(x);
            w.push_i64(y);
        }
    }

    fn read(r: &mut CalldataReader<'_>) -> Result<Self, ContractError> {
        let mut positions = [(0, 0); BALL_COUNT];
        for p in &mut positions {
            *p = (r.next_i64()?, r.next_i64()?);
        }
        Ok(Self { positions })
    }
}

/// Score of a finished game: nothing if the forbidden ball was hit,
/// otherwise the points of every score ball that was hit.
pub fn evaluate(touched: &TouchedMask) -> u64 {
    if touched.is_touched(FORBID) {
        return 0;
    }
    SCORE_BALLS
        .iter()
        .zip(SCORE_POINTS)
        .filter(|(ball, _)| touched.is_touched(**ball))
        .map(|(_, points)| points)
        .sum()
}
