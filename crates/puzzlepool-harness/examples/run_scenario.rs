//! Run the reference scenario, optionally with a configuration file.
//!
//! ```text
//! cargo run -p puzzlepool-harness --example run_scenario -- [config.ron|toml|json]
//! RUST_LOG=debug cargo run -p puzzlepool-harness --example run_scenario
//! ```

use puzzlepool_harness::{HarnessConfig, HarnessError, Scenario, init_logging};
use std::path::PathBuf;

fn main() -> Result<(), HarnessError> {
    init_logging();

    let config = match std::env::args().nth(1) {
        Some(path) => HarnessConfig::load(&PathBuf::from(path))?,
        None => HarnessConfig::default(),
    };

    let report = Scenario::new(config).run()?;
    println!(
        "puzzle {}: score {} after 1 MakeMove + {} ContinueMove",
        report.puzzle.puzzle_id, report.record.score, report.continues
    );
    Ok(())
}
