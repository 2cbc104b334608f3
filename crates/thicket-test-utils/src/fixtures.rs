//! Reusable agent and observer fixtures.
//!
//! - [`ConstAgent`]: proposes a fixed value every cycle.
//! - [`EchoAgent`]: proposes a value derived from the snapshot's cycle, so
//!   tests can tell which cycle and which writer a committed value came from.
//! - [`FailingAgent`]: returns an error on a chosen cycle.
//! - [`PanickingAgent`]: panics on a chosen cycle.
//! - [`StaticObserver`]: owns a set of fields, proposes nothing and counts
//!   its calls.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thicket_core::{
    AgentError, CalendarDate, Field, FieldSet, FieldValue, Proposal, ValueKind, WorldState,
};
use thicket_engine::{Agent, CommitMode, Observer, WriteDecls};

/// Proposes the same value for one field every cycle.
pub struct ConstAgent {
    pub name: String,
    pub field: Field,
    pub value: FieldValue,
    pub mode: CommitMode,
}

impl ConstAgent {
    /// An exclusive writer.
    pub fn new(name: impl Into<String>, field: Field, value: FieldValue) -> Self {
        Self {
            name: name.into(),
            field,
            value,
            mode: CommitMode::Exclusive,
        }
    }

    /// An ordered writer.
    pub fn ordered(name: impl Into<String>, field: Field, value: FieldValue) -> Self {
        Self {
            mode: CommitMode::Ordered,
            ..Self::new(name, field, value)
        }
    }
}

impl Agent for ConstAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn writes(&self) -> WriteDecls {
        [(self.field, self.mode)].into_iter().collect()
    }

    fn compute(&mut self, _snapshot: &WorldState) -> Result<Proposal, AgentError> {
        Ok(Proposal::new().with(self.field, self.value))
    }
}

/// Proposes `cycle * 100 + tag` for its field.
///
/// For real-valued fields the value is converted to `f32`, exact for the
/// cycle counts tests use.
pub struct EchoAgent {
    pub name: String,
    pub field: Field,
    pub tag: u32,
    pub mode: CommitMode,
    /// Propose only on cycles where this returns true.
    pub active: fn(u64) -> bool,
}

impl EchoAgent {
    pub fn new(name: impl Into<String>, field: Field, tag: u32, mode: CommitMode) -> Self {
        Self {
            name: name.into(),
            field,
            tag,
            mode,
            active: |_| true,
        }
    }

    /// Only propose on cycles accepted by `active`.
    pub fn when(mut self, active: fn(u64) -> bool) -> Self {
        self.active = active;
        self
    }

    /// The value this agent proposes in `cycle`.
    pub fn expected(tag: u32, cycle: u64) -> u32 {
        cycle as u32 * 100 + tag
    }
}

impl Agent for EchoAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn writes(&self) -> WriteDecls {
        [(self.field, self.mode)].into_iter().collect()
    }

    fn compute(&mut self, snapshot: &WorldState) -> Result<Proposal, AgentError> {
        if !(self.active)(snapshot.cycle) {
            return Ok(Proposal::new());
        }
        let raw = Self::expected(self.tag, snapshot.cycle);
        let value = match self.field.kind() {
            ValueKind::Count => FieldValue::Count(raw),
            ValueKind::Real => FieldValue::Real(raw as f32),
        };
        Ok(Proposal::new().with(self.field, value))
    }
}

/// Writes nothing until `fail_at`, then returns
/// [`AgentError::ExecutionFailed`].
pub struct FailingAgent {
    pub name: String,
    pub field: Field,
    pub fail_at: u64,
}

impl FailingAgent {
    pub fn new(name: impl Into<String>, field: Field, fail_at: u64) -> Self {
        Self {
            name: name.into(),
            field,
            fail_at,
        }
    }
}

impl Agent for FailingAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn writes(&self) -> WriteDecls {
        [(self.field, CommitMode::Exclusive)].into_iter().collect()
    }

    fn compute(&mut self, snapshot: &WorldState) -> Result<Proposal, AgentError> {
        if snapshot.cycle >= self.fail_at {
            return Err(AgentError::ExecutionFailed {
                reason: format!("scripted failure at cycle {}", snapshot.cycle),
            });
        }
        Ok(Proposal::new())
    }
}

/// Panics inside `compute` on cycle `panic_at`.
pub struct PanickingAgent {
    pub name: String,
    pub panic_at: u64,
}

impl Agent for PanickingAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn writes(&self) -> WriteDecls {
        WriteDecls::new()
    }

    fn compute(&mut self, snapshot: &WorldState) -> Result<Proposal, AgentError> {
        if snapshot.cycle == self.panic_at {
            panic!("scripted panic at cycle {}", snapshot.cycle);
        }
        Ok(Proposal::new())
    }
}

/// An observer that owns `fields` but never proposes values for them.
///
/// Counts `advance` calls through a shared handle, readable after the
/// observer has moved into a running simulation.
pub struct StaticObserver {
    pub name: String,
    pub fields: FieldSet,
    advances: Arc<AtomicU64>,
}

impl StaticObserver {
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            name: name.into(),
            fields: fields.into_iter().collect(),
            advances: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared count of `advance` calls.
    pub fn advances(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.advances)
    }
}

impl Observer for StaticObserver {
    fn name(&self) -> &str {
        &self.name
    }

    fn writes(&self) -> FieldSet {
        self.fields
    }

    fn advance(
        &mut self,
        _committed: &WorldState,
        _next: CalendarDate,
    ) -> Result<Proposal, AgentError> {
        self.advances.fetch_add(1, Ordering::Relaxed);
        Ok(Proposal::new())
    }
}
