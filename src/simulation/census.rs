//! State-wide owner census, taken once per day before any RGO produces.

use std::collections::HashMap;

use bevy_ecs::prelude::Resource;

use crate::simulation::{PopRef, PopSize, PopTypeId, RgoError, StateId};

/// Every pop of one owner type across a state, plus the state's population.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerCensus {
    pub owner_pops: Vec<(PopRef, PopSize)>,
    pub owner_count: PopSize,
    pub state_population: PopSize,
}

pub trait OwnerCensusSource {
    fn owner_census(
        &self,
        state: StateId,
        owner_pop_type: PopTypeId,
    ) -> Result<OwnerCensus, RgoError>;
}

/// Censuses for every (state, owner type) pair some active RGO asks about today.
#[derive(Debug, Clone, Default, Resource)]
pub struct OwnerCensusBook {
    entries: HashMap<(StateId, PopTypeId), Result<OwnerCensus, RgoError>>,
}

impl OwnerCensusBook {
    pub fn contains(&self, state: StateId, owner_pop_type: PopTypeId) -> bool {
        self.entries.contains_key(&(state, owner_pop_type))
    }

    pub fn record(
        &mut self,
        state: StateId,
        owner_pop_type: PopTypeId,
        census: Result<OwnerCensus, RgoError>,
    ) {
        self.entries.insert((state, owner_pop_type), census);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl OwnerCensusSource for OwnerCensusBook {
    fn owner_census(
        &self,
        state: StateId,
        owner_pop_type: PopTypeId,
    ) -> Result<OwnerCensus, RgoError> {
        self.entries
            .get(&(state, owner_pop_type))
            .cloned()
            .unwrap_or(Err(RgoError::MissingCensus {
                state,
                pop_type: owner_pop_type,
            }))
    }
}
