//! The `server` contract: puzzle catalog, chunked simulation, scoring.
//!
//! A game is simulated in chunks because one transaction cannot afford all
//! of its frames. `run_simulation` picks up from a given state and frame,
//! asks the chef for up to `frames` further frames, and reports whether the
//! game is over.

use crate::physics::{DEFAULT_SCALE, SystemState, TouchedMask};
use crate::puzzle::{MAX_FRAMES, PUZZLES, Puzzle, evaluate};
use puzzlepool_chain::{
    CalldataReader, CalldataWriter, Contract, ContractError, EntryPoint, ExecutionContext,
    WireFormat, ensure,
};
use puzzlepool_felt::Felt;

const ENTRY_POINTS: &[EntryPoint] = &[
    EntryPoint::view("view_puzzle_count"),
    EntryPoint::view("view_puzzle"),
    EntryPoint::view("run_simulation"),
    EntryPoint::view("evaluate"),
];

/// Where a game stands after a chunk of frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationChunk {
    pub state: SystemState,
    pub touched: TouchedMask,
    /// Frames simulated since the move was made.
    pub frame: u64,
    pub finished: bool,
}

impl WireFormat for SimulationChunk {
    const WIDTH: usize = SystemState::WIDTH + TouchedMask::WIDTH + 2;

    fn write(&self, w: &mut CalldataWriter) {
        w.push(&self.state);
        w.push(&self.touched);
        w.push_u64(self.frame);
        w.push_bool(self.finished);
    }

    fn read(r: &mut CalldataReader<'_>) -> Result<Self, ContractError> {
        Ok(Self {
            state: r.next()?,
            touched: r.next()?,
            frame: r.next_u64()?,
            finished: r.next_bool()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Server {
    catalog: Vec<Puzzle>,
    scale: i64,
    max_frames: u64,
}

impl Server {
    pub fn new(catalog: Vec<Puzzle>, scale: i64, max_frames: u64) -> Self {
        Self {
            catalog,
            scale,
            max_frames,
        }
    }

    /// The built-in catalog laid out at `scale`.
    pub fn with_scale(scale: i64) -> Self {
        Self::new(PUZZLES.to_vec(), scale, MAX_FRAMES)
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::with_scale(DEFAULT_SCALE)
    }
}

impl Contract for Server {
    fn name(&self) -> &str {
        "server"
    }

    fn entry_points(&self) -> &[EntryPoint] {
        ENTRY_POINTS
    }

    fn execute(
        &self,
        ctx: &mut ExecutionContext<'_>,
        selector: &str,
        calldata: &[Felt],
    ) -> Result<Vec<Felt>, ContractError> {
        let field = ctx.field();
        let mut r = CalldataReader::new(field, calldata);
        match selector {
            "view_puzzle_count" => {
                r.finish()?;
                Ok(CalldataWriter::new(field)
                    .u64(self.catalog.len() as u64)
                    .finish())
            }
            "view_puzzle" => {
                let puzzle_id = r.next_u64()?;
                r.finish()?;
                let puzzle = usize::try_from(puzzle_id)
                    .ok()
                    .and_then(|i| self.catalog.get(i))
                    .ok_or_else(|| {
                        ContractError::assertion(format!("unknown puzzle {puzzle_id}"))
                    })?;
                Ok(CalldataWriter::new(field)
                    .with(&puzzle.layout(self.scale))
                    .finish())
            }
            "run_simulation" => {
                let mut state: SystemState = r.next()?;
                let mut touched: TouchedMask = r.next()?;
                let mut frame = r.next_u64()?;
                let frames = r.next_u64()?;
                let chef = r.next_address()?;
                r.finish()?;
                ensure(frame < self.max_frames, "simulation already at frame cap")?;

                let mut finished = false;
                let mut ran = 0;
                while ran < frames && !finished {
                    let calldata = CalldataWriter::new(field).with(&state).finish();
                    let ret = ctx.call_contract(chef, "euler_forward", &calldata)?;
                    let mut out = CalldataReader::new(field, &ret);
                    state = out.next()?;
                    touched = touched.union(out.next()?);
                    out.finish()?;
                    frame += 1;
                    ran += 1;
                    finished = state.all_at_rest() || frame >= self.max_frames;
                }

                let chunk = SimulationChunk {
                    state,
                    touched,
                    frame,
                    finished,
                };
                Ok(CalldataWriter::new(field).with(&chunk).finish())
            }
            "evaluate" => {
                let touched: TouchedMask = r.next()?;
                r.finish()?;
                Ok(CalldataWriter::new(field).u64(evaluate(&touched)).finish())
            }
            _ => Err(ContractError::UnknownEntryPoint {
                contract: self.name().to_string(),
                selector: selector.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chef::Chef;
    use crate::physics::{PhysicsParams, simulate};
    use crate::puzzle::PuzzleLayout;
    use puzzlepool_chain::{ContractAddress, ExecutionState};
    use std::sync::Arc;

    fn setup() -> (ExecutionState, ContractAddress, ContractAddress) {
        let mut state = ExecutionState::default();
        let chef = state.deploy(&[], Arc::new(Chef::default())).unwrap();
        let server = state.deploy(&[], Arc::new(Server::default())).unwrap();
        (state, chef, server)
    }

    fn run_chunk(
        state: &ExecutionState,
        server: ContractAddress,
        chef: ContractAddress,
        from: &SimulationChunk,
        frames: u64,
    ) -> SimulationChunk {
        let calldata = CalldataWriter::new(state.field())
            .with(&from.state)
            .with(&from.touched)
            .u64(from.frame)
            .u64(frames)
            .address(chef)
            .finish();
        let ret = state.call(server, "run_simulation", &calldata).unwrap();
        let mut r = CalldataReader::new(state.field(), &ret);
        let chunk = r.next().unwrap();
        r.finish().unwrap();
        chunk
    }

    fn layout(state: &ExecutionState, server: ContractAddress, id: u64) -> PuzzleLayout {
        let calldata = CalldataWriter::new(state.field()).u64(id).finish();
        let ret = state.call(server, "view_puzzle", &calldata).unwrap();
        CalldataReader::new(state.field(), &ret).next().unwrap()
    }

    #[test]
    fn catalog_views() {
        let (state, _, server) = setup();
        let ret = state.call(server, "view_puzzle_count", &[]).unwrap();
        assert_eq!(ret, vec![Felt::from_u64(2)]);
        assert_eq!(layout(&state, server, 1), PUZZLES[1].layout(10_000));

        let calldata = CalldataWriter::new(state.field()).u64(2).finish();
        assert!(state.call(server, "view_puzzle", &calldata).is_err());
    }

    #[test]
    fn chunked_simulation_matches_direct_run() {
        let (state, chef, server) = setup();
        let initial = layout(&state, server, 0)
            .initial_state()
            .with_player_velocity(1_900_000, 2_400_000);

        let mut chunk = SimulationChunk {
            state: initial,
            touched: TouchedMask::NONE,
            frame: 0,
            finished: false,
        };
        let mut chunks = 0;
        while !chunk.finished {
            chunk = run_chunk(&state, server, chef, &chunk, 40);
            chunks += 1;
        }
        assert_eq!(chunks, 4);
        assert_eq!(chunk.frame, MAX_FRAMES);

        let direct = simulate(&initial, &PhysicsParams::default(), MAX_FRAMES);
        assert_eq!(chunk.state, direct.state);
        assert_eq!(chunk.touched, direct.touched);
    }

    #[test]
    fn resting_system_finishes_immediately() {
        let (state, chef, server) = setup();
        let start = SimulationChunk {
            state: layout(&state, server, 0).initial_state(),
            touched: TouchedMask::NONE,
            frame: 0,
            finished: false,
        };
        let chunk = run_chunk(&state, server, chef, &start, 40);
        assert!(chunk.finished);
        assert_eq!(chunk.frame, 1);
    }

    #[test]
    fn too_many_frames_exhaust_the_step_budget() {
        let (state, chef, server) = setup();
        let start = SimulationChunk {
            state: layout(&state, server, 0)
                .initial_state()
                .with_player_velocity(1_900_000, 2_400_000),
            touched: TouchedMask::NONE,
            frame: 0,
            finished: false,
        };
        let calldata = CalldataWriter::new(state.field())
            .with(&start.state)
            .with(&start.touched)
            .u64(0)
            .u64(60)
            .address(chef)
            .finish();
        let err = state.call(server, "run_simulation", &calldata).unwrap_err();
        assert!(matches!(
            err.contract_error(),
            Some(ContractError::OutOfResources { .. })
        ));
    }

    #[test]
    fn evaluate_entry_point() {
        let (state, _, server) = setup();
        let calldata = CalldataWriter::new(state.field())
            .with(&TouchedMask([true, true, true, false, true]))
            .finish();
        let ret = state.call(server, "evaluate", &calldata).unwrap();
        assert_eq!(ret, vec![Felt::from_u64(45)]);
    }
}
