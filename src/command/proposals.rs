//! Single-writer-per-tick command resolution
//!
//! Groups, reactive responses and the planner propose commands during a
//! tick. Resolution keeps exactly one proposal per unit (the last one
//! proposed) before anything reaches the controller.

use ahash::AHashMap;

use crate::command::types::{CommandPriority, Order};
use crate::core::types::{GroupId, UnitId};

/// Where a proposal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalSource {
    Group(GroupId),
    /// Idle unit answering a nearby threat
    Reactive,
    /// Planner redirecting idle units toward enemies at the base
    BaseDefense,
    Strategic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub unit: UnitId,
    pub order: Order,
    pub priority: CommandPriority,
    pub source: ProposalSource,
}

#[derive(Debug, Default)]
pub struct ProposalBuffer {
    proposals: Vec<Proposal>,
}

impl ProposalBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn propose(&mut self, unit: UnitId, order: Order, priority: CommandPriority, source: ProposalSource) {
        self.proposals.push(Proposal {
            unit,
            order,
            priority,
            source,
        });
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Has any proposal been made for `unit` this tick?
    pub fn contains(&self, unit: UnitId) -> bool {
        self.proposals.iter().any(|p| p.unit == unit)
    }

    /// Keep the last proposal per unit, in the order the winners were proposed.
    /// Priority is carried but not compared.
    pub fn resolve(&mut self) -> Vec<Proposal> {
        let mut winner: AHashMap<UnitId, usize> = AHashMap::new();
        for (i, p) in self.proposals.iter().enumerate() {
            winner.insert(p.unit, i);
        }

        let mut kept: Vec<usize> = winner.into_values().collect();
        kept.sort_unstable();

        let mut drained: Vec<Option<Proposal>> = self.proposals.drain(..).map(Some).collect();
        kept.into_iter()
            .filter_map(|i| drained.get_mut(i).and_then(Option::take))
            .collect()
    }
}
