//! The `shrine` contract: best score per puzzle and player.

use crate::access;
use puzzlepool_chain::{
    CalldataReader, CalldataWriter, Contract, ContractError, EntryPoint, ExecutionContext,
    WireFormat,
};
use puzzlepool_felt::Felt;

const ENTRY_POINTS: &[EntryPoint] = &[
    EntryPoint::external("bind_manager"),
    EntryPoint::external("submit_record"),
    EntryPoint::view("view_record"),
    EntryPoint::view("view_manager"),
];

/// A player's standing on one puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Record {
    /// Best score over all attempts.
    pub score: u64,
    pub attempts: u64,
}

impl WireFormat for Record {
    const WIDTH: usize = 2;

    fn write(&self, w: &mut CalldataWriter) {
        w.push_u64(self.score);
        w.push_u64(self.attempts);
    }

    fn read(r: &mut CalldataReader<'_>) -> Result<Self, ContractError> {
        Ok(Self {
            score: r.next_u64()?,
            attempts: r.next_u64()?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Shrine;

impl Shrine {
    fn read_record(ctx: &ExecutionContext<'_>, keys: &[Felt]) -> Result<Record, ContractError> {
        Ok(Record {
            score: ctx.read_u64("record_score", keys)?,
            attempts: ctx.read_u64("record_attempts", keys)?,
        })
    }
}

impl Contract for Shrine {
    fn name(&self) -> &str {
        "shrine"
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
            "bind_manager" => {
                r.finish()?;
                access::bind_manager(ctx)?;
                Ok(vec![])
            }
            "submit_record" => {
                let puzzle_id = r.next_u64()?;
                let player = r.next_address()?;
                let score = r.next_u64()?;
                r.finish()?;
                access::require_manager(ctx)?;

                let keys = [field.encode_u64(puzzle_id), player.felt()];
                let previous = Self::read_record(ctx, &keys)?;
                let record = Record {
                    score: previous.score.max(score),
                    attempts: previous.attempts + 1,
                };
                ctx.write_u64("record_score", &keys, record.score)?;
                ctx.write_u64("record_attempts", &keys, record.attempts)?;
                ctx.emit_event(
                    "record_submitted",
                    keys.to_vec(),
                    CalldataWriter::new(field)
                        .u64(score)
                        .with(&record)
                        .finish(),
                )?;
                Ok(vec![])
            }
            "view_record" => {
                let puzzle_id = r.next_u64()?;
                let player = r.next_address()?;
                r.finish()?;
                let keys = [field.encode_u64(puzzle_id), player.felt()];
                let record = Self::read_record(ctx, &keys)?;
                Ok(CalldataWriter::new(field).with(&record).finish())
            }
            "view_manager" => {
                r.finish()?;
                Ok(vec![access::manager(ctx).felt()])
            }
            _ => Err(ContractError::UnknownEntryPoint {
                contract: self.name().to_string(),
                selector: selector.to_string(),
            }),
        }
    }
}
