//! The [`Simulation`] orchestrator.
//!
//! Owns the team until [`Simulation::run`], which validates it, spawns one
//! named thread per participant behind a start gate, joins them all, and
//! returns a [`RunReport`].

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use thicket_core::{AgentError, SharedWorld};
use thicket_sync::CyclicBarrier;
use tracing::info;

use crate::agent::{Agent, Observer};
use crate::config::{ConfigError, SimConfig};
use crate::metrics::{AgentMetrics, RunReport};
use crate::ownership::plan_writes;
use crate::sink::{ObservationSink, TracingSink};
use crate::team::{self, Team};

// ── RunError ───────────────────────────────────────────────────────

/// Why a run did not complete.
#[derive(Debug, PartialEq)]
pub enum RunError {
    /// The team could not be started.
    Config(ConfigError),
    /// A participant reported an error; the team halted at the end of
    /// that cycle.
    AgentFailed {
        /// Name of the failing agent or observer.
        agent: String,
        /// Cycle in which it failed.
        cycle: u64,
        /// The reported error.
        reason: AgentError,
    },
    /// A team thread panicked outside the guarded agent hooks.
    AgentPanicked {
        /// Name of the thread's participant.
        agent: String,
    },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::AgentFailed {
                agent,
                cycle,
                reason,
            } => write!(f, "agent '{agent}' failed in cycle {cycle}: {reason}"),
            Self::AgentPanicked { agent } => write!(f, "thread of '{agent}' panicked"),
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::AgentFailed { reason, .. } => Some(reason),
            Self::AgentPanicked { .. } => None,
        }
    }
}

impl From<ConfigError> for RunError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ── Simulation ─────────────────────────────────────────────────────

/// A lockstep team ready to run.
///
/// Agents are registered in order; that order sets commit precedence for
/// shared fields (see [`CommitMode::Ordered`](crate::CommitMode::Ordered)).
pub struct Simulation {
    config: SimConfig,
    agents: Vec<Box<dyn Agent>>,
    observer: Box<dyn Observer>,
    sink: Box<dyn ObservationSink>,
}

impl Simulation {
    /// Create a simulation with no agents that logs reports through
    /// [`TracingSink`].
    pub fn new(config: SimConfig, observer: impl Observer) -> Self {
        Self {
            config,
            agents: Vec::new(),
            observer: Box::new(observer),
            sink: Box::new(TracingSink),
        }
    }

    /// Register an agent after those already present.
    pub fn with_agent(mut self, agent: impl Agent) -> Self {
        self.agents.push(Box::new(agent));
        self
    }

    /// Register a boxed agent after those already present.
    pub fn add_agent(&mut self, agent: Box<dyn Agent>) {
        self.agents.push(agent);
    }

    /// Replace the observation sink.
    pub fn with_sink(mut self, sink: impl ObservationSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// The run configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Agents plus the observer.
    pub fn team_size(&self) -> usize {
        self.agents.len() + 1
    }

    /// Run the team to completion on `team_size()` threads.
    ///
    /// Blocks until every thread has joined. A participant that stops
    /// calling the barrier deadlocks the run; there is no timeout.
    ///
    /// # Errors
    ///
    /// [`RunError::Config`] if the configuration or team is invalid or a
    /// thread cannot be spawned; [`RunError::AgentFailed`] if any
    /// participant reported an error.
    pub fn run(self) -> Result<RunReport, RunError> {
        let Self {
            config,
            agents,
            mut observer,
            sink,
        } = self;

        config.validate()?;
        let plan = plan_writes(&agents, observer.as_ref())?;
        let team_size = plan.team_size();

        let mut initial = config.initial_state();
        observer
            .prime(&mut initial)
            .map_err(|reason| RunError::AgentFailed {
                agent: observer.name().to_string(),
                cycle: 0,
                reason,
            })?;

        let barrier = CyclicBarrier::with_strategy(team_size, config.wait)
            .map_err(|_| ConfigError::EmptyTeam)?;
        let team = Arc::new(Team::new(
            SharedWorld::new(&initial),
            barrier,
            config.end_year,
        ));

        info!(
            team_size,
            seed = config.seed,
            start = %config.start,
            end_year = config.end_year,
            "starting simulation"
        );

        // Threads block on the gate until every spawn has succeeded, so a
        // failed spawn never leaves a partial team inside the barrier.
        let (gate_tx, gate_rx) = crossbeam_channel::bounded::<()>(team_size);
        let (grants, observer_grant) = plan.into_parts();
        let mut handles: Vec<(String, JoinHandle<AgentMetrics>)> = Vec::with_capacity(agents.len());

        for (agent, grant) in agents.into_iter().zip(grants) {
            let name = agent.name().to_string();
            let team = Arc::clone(&team);
            let gate = gate_rx.clone();
            let spawned = thread::Builder::new()
                .name(format!("thicket-{name}"))
                .spawn(move || {
                    if gate.recv().is_err() {
                        return AgentMetrics::new(agent.name());
                    }
                    team::run_agent(&team, agent, grant)
                });
            match spawned {
                Ok(handle) => handles.push((name, handle)),
                Err(e) => {
                    drop(gate_tx);
                    abandon(handles);
                    return Err(ConfigError::ThreadSpawnFailed {
                        reason: format!("agent '{name}': {e}"),
                    }
                    .into());
                }
            }
        }

        let observer_name = observer.name().to_string();
        let observer_handle = {
            let team = Arc::clone(&team);
            let gate = gate_rx;
            thread::Builder::new()
                .name(format!("thicket-{observer_name}"))
                .spawn(move || {
                    if gate.recv().is_err() {
                        return;
                    }
                    team::run_observer(&team, observer, observer_grant, sink);
                })
        };
        let observer_handle = match observer_handle {
            Ok(handle) => handle,
            Err(e) => {
                drop(gate_tx);
                abandon(handles);
                return Err(ConfigError::ThreadSpawnFailed {
                    reason: format!("observer '{observer_name}': {e}"),
                }
                .into());
            }
        };

        let started = Instant::now();
        for _ in 0..team_size {
            // Every receiver is alive until it has taken its token.
            let _ = gate_tx.send(());
        }
        drop(gate_tx);

        let mut panicked: Option<String> = None;
        let mut metrics = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            match handle.join() {
                Ok(m) => metrics.push(m),
                Err(_) => {
                    panicked.get_or_insert(name);
                }
            }
        }
        if observer_handle.join().is_err() {
            panicked.get_or_insert(observer_name);
        }
        let elapsed = started.elapsed();

        if let Some(agent) = panicked {
            return Err(RunError::AgentPanicked { agent });
        }
        if let Some(failure) = team.take_failure() {
            return Err(RunError::AgentFailed {
                agent: failure.participant,
                cycle: failure.cycle,
                reason: failure.error,
            });
        }

        let report = RunReport {
            cycles: team.world.cycle(),
            final_state: team.world.snapshot(),
            elapsed,
            agents: metrics,
        };
        info!(
            cycles = report.cycles,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "simulation complete"
        );
        Ok(report)
    }
}

/// Join threads whose gate was closed before the team started.
fn abandon(handles: Vec<(String, JoinHandle<AgentMetrics>)>) {
    for (_, handle) in handles {
        let _ = handle.join();
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let agents: Vec<&str> = self.agents.iter().map(|a| a.name()).collect();
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .field("agents", &agents)
            .field("observer", &self.observer.name())
            .finish()
    }
}
