//! The `manager` contract: game sessions.
//!
//! The manager owns the single game in progress. A move launches the player
//! ball and simulates the first `frames_per_tx` frames; while frames remain
//! the game is *unfinished* and anyone may push it forward with
//! `ContinueMove`. When the server reports the game finished, the manager
//! settles it: the score is evaluated, recorded at the shrine and minted to
//! the player by the inventory.
//!
//! # Storage
//!
//! | var | keys | meaning |
//! |-----|------|---------|
//! | `admin` | | account that wired the addresses |
//! | `wired` | | `admin_initialize_addresses` has run |
//! | `inventory`, `server`, `chef`, `shrine` | | collaborator addresses |
//! | `puzzle_ready` / `puzzle_id` / `puzzles_issued` | | current puzzle and rotation counter |
//! | `unfinished` / `player` / `frame` | | game in progress |
//! | `ball` | ball, component | scaled ball state |
//! | `touched` | ball | touched mask |

use crate::physics::{BALL_COUNT, BallState, DEFAULT_SCALE, SystemState, TouchedMask};
use crate::puzzle::PuzzleLayout;
use crate::server::SimulationChunk;
use puzzlepool_chain::{
    CalldataReader, CalldataWriter, Contract, ContractAddress, ContractError, EntryPoint,
    ExecutionContext, WireFormat, ensure,
};
use puzzlepool_felt::Felt;

const ENTRY_POINTS: &[EntryPoint] = &[
    EntryPoint::external("admin_initialize_addresses"),
    EntryPoint::external("admin_initialize_puzzle"),
    EntryPoint::view("client_pull_puzzle"),
    EntryPoint::external("MakeMove"),
    EntryPoint::view("client_poll_if_manager_has_unfinished_game"),
    EntryPoint::external("ContinueMove"),
    EntryPoint::view("client_view_game"),
];

// ---------------------------------------------------------------------------
// Return types
// ---------------------------------------------------------------------------

/// Result of `MakeMove` and `ContinueMove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Frames simulated by this transaction.
    pub frames_run: u64,
    /// Whether the game was settled by this transaction.
    pub finished: bool,
}

impl WireFormat for MoveOutcome {
    const WIDTH: usize = 2;

    fn write(&self, w: &mut CalldataWriter) {
        w.push_u64(self.frames_run);
        w.push_bool(self.finished);
    }

    fn read(r: &mut CalldataReader<'_>) -> Result<Self, ContractError> {
        Ok(Self {
            frames_run: r.next_u64()?,
            finished: r.next_bool()?,
        })
    }
}

/// Snapshot of the current or most recent game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameView {
    pub puzzle_id: u64,
    pub player: ContractAddress,
    pub frame: u64,
    pub unfinished: bool,
    pub touched: TouchedMask,
    pub state: SystemState,
}

impl WireFormat for GameView {
    const WIDTH: usize = 4 + TouchedMask::WIDTH + SystemState::WIDTH;

    fn write(&self, w: &mut CalldataWriter) {
        w.push_u64(self.puzzle_id);
        w.push_address(self.player);
        w.push_u64(self.frame);
        w.push_bool(self.unfinished);
        w.push(&self.touched);
        w.push(&self.state);
    }

    fn read(r: &mut CalldataReader<'_>) -> Result<Self, ContractError> {
        Ok(Self {
            puzzle_id: r.next_u64()?,
            player: r.next_address()?,
            frame: r.next_u64()?,
            unfinished: r.next_bool()?,
            touched: r.next()?,
            state: r.next()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Wiring {
    inventory: ContractAddress,
    server: ContractAddress,
    chef: ContractAddress,
    shrine: ContractAddress,
}

impl Wiring {
    fn load(ctx: &ExecutionContext<'_>) -> Result<Self, ContractError> {
        ensure(ctx.read_bool("wired", &[]), "addresses not initialized")?;
        Ok(Self {
            inventory: ctx.read_address("inventory", &[]),
            server: ctx.read_address("server", &[]),
            chef: ctx.read_address("chef", &[]),
            shrine: ctx.read_address("shrine", &[]),
        })
    }
}

/// Storage keys of component `c` of ball `i`.
fn ball_keys(i: usize, c: usize) -> [Felt; 2] {
    [Felt::from_u64(i as u64), Felt::from_u64(c as u64)]
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Manager {
    frames_per_tx: u64,
    max_speed: i64,
}

impl Manager {
    pub const DEFAULT_FRAMES_PER_TX: u64 = 40;

    /// Largest launch speed per axis, in arena units per unit time.
    pub const MAX_LAUNCH_SPEED: i64 = 400;

    /// `max_speed` is the largest accepted launch speed per axis, scaled.
    pub fn new(frames_per_tx: u64, max_speed: i64) -> Self {
        Self {
            frames_per_tx,
            max_speed,
        }
    }

    /// Default chunking, launch speed capped at [`Self::MAX_LAUNCH_SPEED`]
    /// times `scale`.
    pub fn with_scale(scale: i64) -> Self {
        Self::new(
            Self::DEFAULT_FRAMES_PER_TX,
            Self::MAX_LAUNCH_SPEED.saturating_mul(scale),
        )
    }

    pub fn frames_per_tx(&self) -> u64 {
        self.frames_per_tx
    }

    fn load_state(ctx: &ExecutionContext<'_>) -> Result<SystemState, ContractError> {
        let mut state = SystemState::default();
        for (i, ball) in state.balls.iter_mut().enumerate() {
            let mut v = [0i64; 6];
            for (c, slot) in v.iter_mut().enumerate() {
                *slot = ctx.read_i64("ball", &ball_keys(i, c))?;
            }
            *ball = BallState::from_array(v);
        }
        Ok(state)
    }

    fn store_state(
        ctx: &mut ExecutionContext<'_>,
        state: &SystemState,
    ) -> Result<(), ContractError> {
        for (i, ball) in state.balls.iter().enumerate() {
            for (c, v) in ball.to_array().into_iter().enumerate() {
                ctx.write_i64("ball", &ball_keys(i, c), v)?;
            }
        }
        Ok(())
    }

    fn load_touched(ctx: &ExecutionContext<'_>) -> TouchedMask {
        let mut mask = [false; BALL_COUNT];
        for (i, t) in mask.iter_mut().enumerate() {
            *t = ctx.read_bool("touched", &[Felt::from_u64(i as u64)]);
        }
        TouchedMask(mask)
    }

    fn store_touched(
        ctx: &mut ExecutionContext<'_>,
        touched: &TouchedMask,
    ) -> Result<(), ContractError> {
        for (i, t) in touched.0.iter().enumerate() {
            ctx.write_bool("touched", &[Felt::from_u64(i as u64)], *t)?;
        }
        Ok(())
    }

    fn layout(
        ctx: &mut ExecutionContext<'_>,
        wiring: &Wiring,
        puzzle_id: u64,
    ) -> Result<PuzzleLayout, ContractError> {
        let field = ctx.field();
        let calldata = CalldataWriter::new(field).u64(puzzle_id).finish();
        let ret = ctx.call_contract(wiring.server, "view_puzzle", &calldata)?;
        let mut r = CalldataReader::new(field, &ret);
        let layout = r.next()?;
        r.finish()?;
        Ok(layout)
    }

    /// Simulate the next chunk of the stored game and settle it if done.
    fn advance(
        &self,
        ctx: &mut ExecutionContext<'_>,
        wiring: &Wiring,
    ) -> Result<MoveOutcome, ContractError> {
        let field = ctx.field();
        let from = ctx.read_u64("frame", &[])?;
        let calldata = CalldataWriter::new(field)
            .with(&Self::load_state(ctx)?)
            .with(&Self::load_touched(ctx))
            .u64(from)
            .u64(self.frames_per_tx)
            .address(wiring.chef)
            .finish();
        let ret = ctx.call_contract(wiring.server, "run_simulation", &calldata)?;
        let mut r = CalldataReader::new(field, &ret);
        let chunk: SimulationChunk = r.next()?;
        r.finish()?;

        Self::store_state(ctx, &chunk.state)?;
        Self::store_touched(ctx, &chunk.touched)?;
        ctx.write_u64("frame", &[], chunk.frame)?;
        ctx.write_bool("unfinished", &[], !chunk.finished)?;
        if chunk.finished {
            Self::settle(ctx, wiring, &chunk.touched)?;
        }

        Ok(MoveOutcome {
            frames_run: chunk.frame - from,
            finished: chunk.finished,
        })
    }

    fn settle(
        ctx: &mut ExecutionContext<'_>,
        wiring: &Wiring,
        touched: &TouchedMask,
    ) -> Result<(), ContractError> {
        let field = ctx.field();
        let puzzle_id = ctx.read_u64("puzzle_id", &[])?;
        let player = ctx.read_address("player", &[]);

        let calldata = CalldataWriter::new(field).with(touched).finish();
        let ret = ctx.call_contract(wiring.server, "evaluate", &calldata)?;
        let mut r = CalldataReader::new(field, &ret);
        let score = r.next_u64()?;
        r.finish()?;

        let record = CalldataWriter::new(field)
            .u64(puzzle_id)
            .address(player)
            .u64(score)
            .finish();
        ctx.call_contract(wiring.shrine, "submit_record", &record)?;

        let reward = CalldataWriter::new(field).address(player).u64(score).finish();
        ctx.call_contract(wiring.inventory, "mint", &reward)?;

        ctx.emit_event(
            "game_finished",
            vec![field.encode_u64(puzzle_id), player.felt()],
            CalldataWriter::new(field).u64(score).finish(),
        )?;
        tracing::debug!(puzzle_id, %player, score, "game settled");
        Ok(())
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::with_scale(DEFAULT_SCALE)
    }
}

impl Contract for Manager {
    fn name(&self) -> &str {
        "manager"
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
            "admin_initialize_addresses" => {
                let wiring = Wiring {
                    inventory: r.next_address()?,
                    server: r.next_address()?,
                    chef: r.next_address()?,
                    shrine: r.next_address()?,
                };
                r.finish()?;
                ensure(!ctx.read_bool("wired", &[]), "addresses already initialized")?;
                for address in [wiring.inventory, wiring.server, wiring.chef, wiring.shrine] {
                    ensure(address != ContractAddress::ZERO, "zero address")?;
                }

                let admin = ctx.caller_address();
                ctx.write_address("admin", &[], admin)?;
                ctx.write_address("inventory", &[], wiring.inventory)?;
                ctx.write_address("server", &[], wiring.server)?;
                ctx.write_address("chef", &[], wiring.chef)?;
                ctx.write_address("shrine", &[], wiring.shrine)?;
                ctx.write_bool("wired", &[], true)?;

                ctx.call_contract(wiring.shrine, "bind_manager", &[])?;
                ctx.call_contract(wiring.inventory, "bind_manager", &[])?;
                Ok(vec![])
            }
            "admin_initialize_puzzle" => {
                r.finish()?;
                let wiring = Wiring::load(ctx)?;
                ensure(
                    ctx.caller_address() == ctx.read_address("admin", &[]),
                    "caller is not the admin",
                )?;
                ensure(!ctx.read_bool("unfinished", &[]), "a game is unfinished")?;

                let ret = ctx.call_contract(wiring.server, "view_puzzle_count", &[])?;
                let mut out = CalldataReader::new(field, &ret);
                let count = out.next_u64()?;
                out.finish()?;
                ensure(count > 0, "server has no puzzles")?;

                let issued = ctx.read_u64("puzzles_issued", &[])?;
                let puzzle_id = issued % count;
                ctx.write_u64("puzzle_id", &[], puzzle_id)?;
                ctx.write_u64("puzzles_issued", &[], issued + 1)?;
                ctx.write_bool("puzzle_ready", &[], true)?;
                ctx.emit_event("puzzle_initialized", vec![field.encode_u64(puzzle_id)], vec![])?;
                Ok(vec![])
            }
            "client_pull_puzzle" => {
                r.finish()?;
                let wiring = Wiring::load(ctx)?;
                ensure(ctx.read_bool("puzzle_ready", &[]), "no puzzle initialized")?;
                let puzzle_id = ctx.read_u64("puzzle_id", &[])?;
                let layout = Self::layout(ctx, &wiring, puzzle_id)?;
                Ok(CalldataWriter::new(field).u64(puzzle_id).with(&layout).finish())
            }
            "MakeMove" => {
                let vx = r.next_i64()?;
                let vy = r.next_i64()?;
                r.finish()?;
                let wiring = Wiring::load(ctx)?;
                ensure(ctx.read_bool("puzzle_ready", &[]), "no puzzle initialized")?;
                ensure(!ctx.read_bool("unfinished", &[]), "a game is unfinished")?;
                ensure(
                    vx.unsigned_abs() <= self.max_speed.unsigned_abs()
                        && vy.unsigned_abs() <= self.max_speed.unsigned_abs(),
                    "launch speed out of range",
                )?;

                let puzzle_id = ctx.read_u64("puzzle_id", &[])?;
                let initial = Self::layout(ctx, &wiring, puzzle_id)?
                    .initial_state()
                    .with_player_velocity(vx, vy);
                let player = ctx.caller_address();
                Self::store_state(ctx, &initial)?;
                Self::store_touched(ctx, &TouchedMask::NONE)?;
                ctx.write_u64("frame", &[], 0)?;
                ctx.write_address("player", &[], player)?;

                let outcome = self.advance(ctx, &wiring)?;
                Ok(CalldataWriter::new(field).with(&outcome).finish())
            }
            "client_poll_if_manager_has_unfinished_game" => {
                r.finish()?;
                let unfinished = ctx.read_bool("unfinished", &[]);
                Ok(CalldataWriter::new(field).bool(unfinished).finish())
            }
            "ContinueMove" => {
                r.finish()?;
                let wiring = Wiring::load(ctx)?;
                ensure(ctx.read_bool("unfinished", &[]), "no unfinished game")?;
                let outcome = self.advance(ctx, &wiring)?;
                Ok(CalldataWriter::new(field).with(&outcome).finish())
            }
            "client_view_game" => {
                r.finish()?;
                let view = GameView {
                    puzzle_id: ctx.read_u64("puzzle_id", &[])?,
                    player: ctx.read_address("player", &[]),
                    frame: ctx.read_u64("frame", &[])?,
                    unfinished: ctx.read_bool("unfinished", &[]),
                    touched: Self::load_touched(ctx),
                    state: Self::load_state(ctx)?,
                };
                Ok(CalldataWriter::new(field).with(&view).finish())
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
    use crate::test_utils::*;

    fn rejection(err: &puzzlepool_chain::StateError) -> String {
        match err.contract_error() {
            Some(ContractError::Assertion(msg)) => msg.clone(),
            other => panic!("expected assertion, got {other:?}"),
        }
    }

    #[test]
    fn reference_move_on_first_puzzle() {
        let mut game = wired_game();
        assert_eq!(game.next_puzzle(), 0);

        let outcome = game.make_move(190, 240).unwrap();
        assert_eq!(
            outcome,
            MoveOutcome {
                frames_run: 40,
                finished: false
            }
        );
        assert_eq!(game.finish_game(), 3);

        let record = game.record(0);
        assert_eq!(record.score, 45);
        assert_eq!(record.attempts, 1);
        assert_eq!(game.balance(), 45);

        let view = game.manager.view_game(&game.state).unwrap();
        assert_eq!(view.frame, 150);
        assert!(!view.unfinished);
        assert_eq!(view.player, PLAYER);
        assert_eq!(view.touched, TouchedMask([true, true, true, false, true]));
    }

    #[test]
    fn puzzles_rotate() {
        let mut game = wired_game();
        assert_eq!(game.next_puzzle(), 0);
        assert_eq!(game.next_puzzle(), 1);
        assert_eq!(game.next_puzzle(), 0);
    }

    #[test]
    fn move_requires_a_puzzle() {
        let mut game = wired_game();
        let err = game.make_move(190, 240).unwrap_err();
        assert_eq!(rejection(&err), "no puzzle initialized");
    }

    #[test]
    fn one_game_at_a_time() {
        let mut game = wired_game();
        game.next_puzzle();
        game.make_move(190, 240).unwrap();

        let err = game.make_move(190, 240).unwrap_err();
        assert_eq!(rejection(&err), "a game is unfinished");

        let err = game
            .manager
            .admin_initialize_puzzle(&mut game.state, ADMIN)
            .unwrap_err();
        assert_eq!(rejection(&err), "a game is unfinished");
    }

    #[test]
    fn continue_requires_unfinished_game() {
        let mut game = wired_game();
        game.next_puzzle();
        let err = game
            .manager
            .continue_move(&mut game.state, PLAYER)
            .unwrap_err();
        assert_eq!(rejection(&err), "no unfinished game");
    }

    #[test]
    fn launch_speed_is_bounded() {
        let mut game = wired_game();
        game.next_puzzle();
        let err = game.make_move(401, 0).unwrap_err();
        assert_eq!(rejection(&err), "launch speed out of range");
        assert!(game.make_move(-400, 400).is_ok());
    }

    #[test]
    fn most_negative_launch_speed_is_rejected() {
        let mut game = wired_game();
        game.next_puzzle();
        let field = game.state.field();
        let min = field.to_unsigned(i64::MIN as i128);
        for (vx, vy) in [(min, Felt::ZERO), (Felt::ZERO, min)] {
            let err = game
                .manager
                .make_move(&mut game.state, PLAYER, vx, vy)
                .unwrap_err();
            assert_eq!(rejection(&err), "launch speed out of range");
        }
        assert!(!game.manager.has_unfinished_game(&game.state).unwrap());
    }

    #[test]
    fn launch_speed_cap_follows_the_scale() {
        let mut game = wired_game_scaled(puzzlepool_chain::ExecutionState::default(), 100);
        game.next_puzzle();
        let err = game.make_move(401, 0).unwrap_err();
        assert_eq!(rejection(&err), "launch speed out of range");
        assert!(game.make_move(400, -400).is_ok());
    }

    #[test]
    fn only_admin_initializes_puzzles() {
        let mut game = wired_game();
        let err = game
            .manager
            .admin_initialize_puzzle(&mut game.state, PLAYER)
            .unwrap_err();
        assert_eq!(rejection(&err), "caller is not the admin");
    }

    #[test]
    fn addresses_initialize_once() {
        let mut game = wired_game();
        let d = game.deployment;
        let err = game
            .manager
            .admin_initialize_addresses(
                &mut game.state,
                ADMIN,
                d.inventory,
                d.server,
                d.chef,
                d.shrine,
            )
            .unwrap_err();
        assert_eq!(rejection(&err), "addresses already initialized");
    }

    #[test]
    fn settlement_emits_game_finished() {
        let mut game = wired_game();
        game.next_puzzle();
        game.make_move(190, 240).unwrap();
        game.finish_game();
        let finished: Vec<_> = game
            .state
            .events()
            .iter()
            .filter(|e| e.is(game.deployment.manager, "game_finished"))
            .collect();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].data, vec![Felt::from_u64(45)]);
    }
}
