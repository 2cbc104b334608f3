//! Write-ownership planning.
//!
//! [`plan_writes`] runs once before a team starts. It checks that every
//! shared field has a legal set of writers and assigns each writer its
//! commit rank, producing one [`WriteGrant`] per participant.

use indexmap::IndexMap;
use thicket_core::{AgentError, Field, FieldSet, Proposal, SharedWorld, MAX_RANK};

use crate::agent::{Agent, CommitMode, Observer};
use crate::config::ConfigError;

/// Largest team (agents plus observer) a plan supports.
pub const MAX_PARTICIPANTS: usize = MAX_RANK as usize;

/// Fields only the engine writes, on the observer's thread.
const CALENDAR: [Field; 2] = [Field::Year, Field::Month];

// ── WriteGrant ─────────────────────────────────────────────────────

/// The fields one participant may commit, with its rank for each.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteGrant {
    writer: String,
    ranks: [Option<u8>; Field::COUNT],
}

impl WriteGrant {
    fn new(writer: &str) -> Self {
        Self {
            writer: writer.to_string(),
            ranks: [None; Field::COUNT],
        }
    }

    /// Name of the participant holding this grant.
    pub fn writer(&self) -> &str {
        &self.writer
    }

    /// Commit rank for `field`, or `None` if not granted.
    pub fn rank(&self, field: Field) -> Option<u8> {
        self.ranks[field.index()]
    }

    /// Every granted field.
    pub fn fields(&self) -> FieldSet {
        Field::ALL
            .into_iter()
            .filter(|f| self.ranks[f.index()].is_some())
            .collect()
    }

    /// Publish `proposal` into `world`.
    ///
    /// Every entry is checked against the grant and by
    /// [`SharedWorld::admit`] before any is written, so a rejected proposal
    /// leaves the world untouched. Returns how many values took effect;
    /// the rest were outranked by another writer this cycle.
    ///
    /// # Errors
    ///
    /// [`AgentError::UndeclaredWrite`] for a field outside the grant, or
    /// any error from [`SharedWorld::admit`].
    pub fn commit(&self, world: &SharedWorld, proposal: &Proposal) -> Result<usize, AgentError> {
        let mut admitted = Vec::with_capacity(proposal.len());
        for (field, value) in proposal.iter() {
            let Some(rank) = self.rank(field) else {
                return Err(AgentError::UndeclaredWrite {
                    agent: self.writer.clone(),
                    field,
                });
            };
            admitted.push((field, SharedWorld::admit(field, value)?, rank));
        }
        let mut written = 0;
        for (field, value, rank) in admitted {
            if world.commit(field, value, rank)? {
                written += 1;
            }
        }
        Ok(written)
    }
}

// ── WritePlan ──────────────────────────────────────────────────────

/// Grants for a whole team, in agent registration order.
#[derive(Debug)]
#[must_use]
pub struct WritePlan {
    agents: Vec<WriteGrant>,
    observer: WriteGrant,
}

impl WritePlan {
    /// Grant of the agent at `index`.
    pub fn agent(&self, index: usize) -> Option<&WriteGrant> {
        self.agents.get(index)
    }

    /// The observer's grant, including the calendar fields.
    pub fn observer(&self) -> &WriteGrant {
        &self.observer
    }

    /// Number of agents (excluding the observer).
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Agents plus the observer.
    pub fn team_size(&self) -> usize {
        self.agents.len() + 1
    }

    pub(crate) fn into_parts(self) -> (Vec<WriteGrant>, WriteGrant) {
        (self.agents, self.observer)
    }
}

/// Validate a team's write declarations and assign commit ranks.
///
/// Checks, in order:
///
/// 1. At least one agent, and no more than [`MAX_PARTICIPANTS`] including
///    the observer.
/// 2. Agent names are unique.
/// 3. Nobody declares a calendar field.
/// 4. No agent writes a field the observer owns.
/// 5. A field with several writers is [`CommitMode::Ordered`] for all of
///    them.
///
/// Ranks follow registration order per field: the first writer of a field
/// gets rank 0, the next rank 1, and so on.
pub fn plan_writes(
    agents: &[Box<dyn Agent>],
    observer: &dyn Observer,
) -> Result<WritePlan, ConfigError> {
    // 1. Team size
    if agents.is_empty() {
        return Err(ConfigError::EmptyTeam);
    }
    let participants = agents.len() + 1;
    if participants > MAX_PARTICIPANTS {
        return Err(ConfigError::TeamTooLarge {
            participants,
            max: MAX_PARTICIPANTS,
        });
    }

    // 2. Unique names
    let mut names: IndexMap<&str, usize> = IndexMap::new();
    for (i, agent) in agents.iter().enumerate() {
        if names.insert(agent.name(), i).is_some() {
            return Err(ConfigError::DuplicateAgent {
                name: agent.name().to_string(),
            });
        }
    }

    // 3. Calendar is reserved
    let observed = observer.writes();
    for field in CALENDAR {
        if observed.contains(field) {
            return Err(ConfigError::ReservedField {
                field,
                writer: observer.name().to_string(),
            });
        }
    }

    // 4-5. Agent writers per field
    let mut writers: IndexMap<Field, Vec<(usize, CommitMode)>> = IndexMap::new();
    for (i, agent) in agents.iter().enumerate() {
        for (field, mode) in agent.writes() {
            if CALENDAR.contains(&field) {
                return Err(ConfigError::ReservedField {
                    field,
                    writer: agent.name().to_string(),
                });
            }
            if observed.contains(field) {
                return Err(ConfigError::ObserverFieldContested {
                    field,
                    agent: agent.name().to_string(),
                });
            }
            let entry = writers.entry(field).or_default();
            // A repeated declaration by the same agent keeps its first rank.
            if entry.iter().any(|&(j, _)| j == i) {
                continue;
            }
            entry.push((i, mode));
        }
    }

    let mut grants: Vec<WriteGrant> = agents.iter().map(|a| WriteGrant::new(a.name())).collect();
    for (&field, list) in &writers {
        if list.len() > 1 {
            if let Some(&(k, _)) = list.iter().find(|(_, m)| *m == CommitMode::Exclusive) {
                let other = list.iter().map(|&(j, _)| j).find(|&j| j != k).unwrap_or(k);
                let (first, second) = if k < other { (k, other) } else { (other, k) };
                return Err(ConfigError::ConflictingWriters {
                    field,
                    first_writer: agents[first].name().to_string(),
                    second_writer: agents[second].name().to_string(),
                });
            }
        }
        for (rank, &(i, _)) in list.iter().enumerate() {
            grants[i].ranks[field.index()] = Some(rank as u8);
        }
    }

    let mut observer_grant = WriteGrant::new(observer.name());
    for field in observed.iter().chain(CALENDAR) {
        observer_grant.ranks[field.index()] = Some(0);
    }

    Ok(WritePlan {
        agents: grants,
        observer: observer_grant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::WriteDecls;
    use thicket_core::{CalendarDate, WorldState};

    struct Writer {
        name: String,
        field: Field,
        mode: CommitMode,
    }

    impl Agent for Writer {
        fn name(&self) -> &str {
            &self.name
        }

        fn writes(&self) -> WriteDecls {
            [(self.field, self.mode)].into_iter().collect()
        }

        fn compute(&mut self, _: &WorldState) -> Result<Proposal, AgentError> {
            Ok(Proposal::new())
        }
    }

    struct Weather(FieldSet);

    impl Observer for Weather {
        fn name(&self) -> &str {
            "clock"
        }

        fn writes(&self) -> FieldSet {
            self.0
        }

        fn advance(&mut self, _: &WorldState, _: CalendarDate) -> Result<Proposal, AgentError> {
            Ok(Proposal::new())
        }
    }

    fn exclusive(name: &str, field: Field) -> Box<dyn Agent> {
        Box::new(Writer {
            name: name.to_string(),
            field,
            mode: CommitMode::Exclusive,
        })
    }

    fn ordered(name: &str, field: Field) -> Box<dyn Agent> {
        Box::new(Writer {
            name: name.to_string(),
            field,
            mode: CommitMode::Ordered,
        })
    }

    fn weather_observer() -> Weather {
        Weather([Field::Temperature, Field::Precipitation].into_iter().collect())
    }

    #[test]
    fn empty_team_rejected() {
        let err = plan_writes(&[], &weather_observer()).unwrap_err();
        assert_eq!(err, ConfigError::EmptyTeam);
    }

    #[test]
    fn exclusive_writers_conflict() {
        let agents: Vec<Box<dyn Agent>> = vec![
            exclusive("a", Field::VegetationHeight),
            exclusive("b", Field::VegetationHeight),
        ];
        let err = plan_writes(&agents, &weather_observer()).unwrap_err();
        assert_eq!(
            err,
            ConfigError::ConflictingWriters {
                field: Field::VegetationHeight,
                first_writer: "a".into(),
                second_writer: "b".into(),
            }
        );
    }

    #[test]
    fn one_exclusive_among_ordered_conflicts() {
        let agents: Vec<Box<dyn Agent>> = vec![
            ordered("a", Field::HerbivorePopulation),
            exclusive("b", Field::HerbivorePopulation),
        ];
        assert!(matches!(
            plan_writes(&agents, &weather_observer()),
            Err(ConfigError::ConflictingWriters { .. })
        ));
    }

    #[test]
    fn ordered_writers_ranked_by_registration() {
        let agents: Vec<Box<dyn Agent>> = vec![
            ordered("herbivore", Field::HerbivorePopulation),
            exclusive("vegetation", Field::VegetationHeight),
            ordered("predator", Field::HerbivorePopulation),
        ];
        let plan = plan_writes(&agents, &weather_observer()).unwrap();
        assert_eq!(plan.team_size(), 4);
        assert_eq!(plan.agent(0).unwrap().rank(Field::HerbivorePopulation), Some(0));
        assert_eq!(plan.agent(2).unwrap().rank(Field::HerbivorePopulation), Some(1));
        assert_eq!(plan.agent(1).unwrap().rank(Field::HerbivorePopulation), None);
    }

    #[test]
    fn duplicate_names_rejected() {
        let agents: Vec<Box<dyn Agent>> = vec![
            exclusive("same", Field::VegetationHeight),
            exclusive("same", Field::PredatorPopulation),
        ];
        assert_eq!(
            plan_writes(&agents, &weather_observer()).unwrap_err(),
            ConfigError::DuplicateAgent {
                name: "same".into()
            }
        );
    }

    #[test]
    fn agent_cannot_write_weather() {
        let agents: Vec<Box<dyn Agent>> = vec![exclusive("rain", Field::Precipitation)];
        assert_eq!(
            plan_writes(&agents, &weather_observer()).unwrap_err(),
            ConfigError::ObserverFieldContested {
                field: Field::Precipitation,
                agent: "rain".into(),
            }
        );
    }

    #[test]
    fn calendar_is_reserved() {
        let agents: Vec<Box<dyn Agent>> = vec![exclusive("clockwork", Field::Month)];
        assert!(matches!(
            plan_writes(&agents, &weather_observer()),
            Err(ConfigError::ReservedField {
                field: Field::Month,
                ..
            })
        ));
        let observer = Weather([Field::Year].into_iter().collect());
        let agents: Vec<Box<dyn Agent>> = vec![exclusive("grass", Field::VegetationHeight)];
        assert!(matches!(
            plan_writes(&agents, &observer),
            Err(ConfigError::ReservedField { .. })
        ));
    }

    #[test]
    fn too_many_participants_rejected() {
        let agents: Vec<Box<dyn Agent>> = (0..MAX_PARTICIPANTS)
            .map(|i| ordered(&format!("a{i}"), Field::HerbivorePopulation))
            .collect();
        assert!(matches!(
            plan_writes(&agents, &weather_observer()),
            Err(ConfigError::TeamTooLarge { .. })
        ));
    }

    #[test]
    fn undeclared_write_leaves_world_untouched() {
        let agents: Vec<Box<dyn Agent>> = vec![exclusive("grass", Field::VegetationHeight)];
        let plan = plan_writes(&agents, &weather_observer()).unwrap();
        let world = SharedWorld::new(&WorldState {
            cycle: 0,
            year: 2020,
            month: 0,
            precipitation: 0.0,
            temperature: 0.0,
            vegetation_height: 5.0,
            herbivores: 2,
            predators: 1,
        });
        let proposal = Proposal::new()
            .with(Field::VegetationHeight, 9.0f32)
            .with(Field::PredatorPopulation, 4u32);
        let err = plan.agent(0).unwrap().commit(&world, &proposal).unwrap_err();
        assert_eq!(
            err,
            AgentError::UndeclaredWrite {
                agent: "grass".into(),
                field: Field::PredatorPopulation,
            }
        );
        assert_eq!(world.snapshot().vegetation_height, 5.0);
        assert_eq!(world.snapshot().date(), CalendarDate::new(2020, 0));
    }

    #[test]
    fn non_finite_entry_rejects_whole_proposal() {
        let agents: Vec<Box<dyn Agent>> = vec![exclusive("grass", Field::VegetationHeight)];
        let plan = plan_writes(&agents, &weather_observer()).unwrap();
        let world = SharedWorld::new(&WorldState {
            cycle: 0,
            year: 2020,
            month: 0,
            precipitation: 2.0,
            temperature: 1.0,
            vegetation_height: 5.0,
            herbivores: 2,
            predators: 1,
        });
        let proposal = Proposal::new()
            .with(Field::Temperature, 70.0f32)
            .with(Field::Precipitation, f32::NAN);
        let err = plan.observer().commit(&world, &proposal).unwrap_err();
        assert_eq!(
            err,
            AgentError::NonFinite {
                field: Field::Precipitation
            }
        );
        assert_eq!(world.snapshot().temperature, 1.0);
        assert_eq!(world.snapshot().precipitation, 2.0);
    }

    #[test]
    fn wrong_kind_entry_rejects_whole_proposal() {
        let agents: Vec<Box<dyn Agent>> = vec![exclusive("grass", Field::VegetationHeight)];
        let plan = plan_writes(&agents, &weather_observer()).unwrap();
        let world = SharedWorld::new(&WorldState {
            cycle: 0,
            year: 2020,
            month: 0,
            precipitation: 2.0,
            temperature: 1.0,
            vegetation_height: 5.0,
            herbivores: 2,
            predators: 1,
        });
        let proposal = Proposal::new()
            .with(Field::Temperature, 70.0f32)
            .with(Field::Precipitation, 3u32);
        let err = plan.observer().commit(&world, &proposal).unwrap_err();
        assert!(matches!(
            err,
            AgentError::KindMismatch {
                field: Field::Precipitation,
                ..
            }
        ));
        assert_eq!(world.snapshot().temperature, 1.0);
    }

    #[test]
    fn observer_grant_includes_calendar() {
        let agents: Vec<Box<dyn Agent>> = vec![exclusive("grass", Field::VegetationHeight)];
        let plan = plan_writes(&agents, &weather_observer()).unwrap();
        let fields = plan.observer().fields();
        assert!(fields.contains(Field::Year));
        assert!(fields.contains(Field::Month));
        assert!(fields.contains(Field::Temperature));
        assert!(!fields.contains(Field::VegetationHeight));
    }
}
