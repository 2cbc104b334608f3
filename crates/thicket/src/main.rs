//! Runs the compiled-in scenario and logs one line per simulated month.
//!
//! Log verbosity follows `RUST_LOG` and defaults to `info`.

use std::process::ExitCode;

use thicket::prelude::*;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install tracing subscriber: {e}");
        return ExitCode::FAILURE;
    }

    match standard_simulation(SimConfig::default())
        .with_sink(TracingSink)
        .run()
    {
        Ok(report) => {
            for agent in &report.agents {
                info!(
                    agent = %agent.name,
                    cycles = agent.cycles,
                    mean_compute = ?agent.mean_compute_time(),
                    outranked = agent.values_outranked,
                    "agent summary"
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("simulation failed: {e}");
            ExitCode::FAILURE
        }
    }
}
