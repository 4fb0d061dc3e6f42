//! Pop types, pops and the references the RGO keeps to them.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::simulation::{FixedPoint, ProvinceId};

pub type PopSize = i32;

/// Stable position of a pop type in the session's [`PopTypeKeys`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PopTypeId(pub u16);

impl PopTypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopType {
    pub identifier: String,
    pub is_slave: bool,
    /// Type a pop converts into when a job asks for it instead of this one.
    pub equivalent: Option<PopTypeId>,
}

/// The one ordered list of pop types shared by every province for a game session.
#[derive(Debug, Clone, Default)]
pub struct PopTypeKeys {
    types: Vec<PopType>,
}

impl PopTypeKeys {
    pub fn new(types: Vec<PopType>) -> Self {
        Self { types }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, id: PopTypeId) -> Option<&PopType> {
        self.types.get(id.index())
    }

    pub fn find(&self, identifier: &str) -> Option<PopTypeId> {
        self.types
            .iter()
            .position(|pop_type| pop_type.identifier == identifier)
            .map(|index| PopTypeId(index as u16))
    }

    pub fn is_slave(&self, id: PopTypeId) -> bool {
        self.get(id).is_some_and(|pop_type| pop_type.is_slave)
    }

    pub fn identifier(&self, id: PopTypeId) -> &str {
        self.get(id)
            .map(|pop_type| pop_type.identifier.as_str())
            .unwrap_or("<unknown>")
    }

    pub fn ids(&self) -> impl Iterator<Item = PopTypeId> + '_ {
        (0..self.types.len()).map(|index| PopTypeId(index as u16))
    }
}

/// Location of a pop: its province and its slot in that province's pop list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PopRef {
    pub province: ProvinceId,
    pub index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pop {
    pop_type: PopTypeId,
    size: PopSize,
    rgo_owner_income: FixedPoint,
    rgo_worker_income: FixedPoint,
}

impl Pop {
    pub fn new(pop_type: PopTypeId, size: PopSize) -> Self {
        Self {
            pop_type,
            size,
            rgo_owner_income: FixedPoint::ZERO,
            rgo_worker_income: FixedPoint::ZERO,
        }
    }

    pub fn pop_type(&self) -> PopTypeId {
        self.pop_type
    }

    pub fn size(&self) -> PopSize {
        self.size
    }

    pub fn rgo_owner_income(&self) -> FixedPoint {
        self.rgo_owner_income
    }

    pub fn rgo_worker_income(&self) -> FixedPoint {
        self.rgo_worker_income
    }

    pub fn add_rgo_owner_income(&mut self, amount: FixedPoint) {
        self.rgo_owner_income += amount;
    }

    pub fn add_rgo_worker_income(&mut self, amount: FixedPoint) {
        self.rgo_worker_income += amount;
    }

    pub fn clear_daily_income(&mut self) {
        self.rgo_owner_income = FixedPoint::ZERO;
        self.rgo_worker_income = FixedPoint::ZERO;
    }

    pub fn convert_to_equivalent(&mut self, keys: &PopTypeKeys) -> bool {
        match keys.get(self.pop_type).and_then(|pop_type| pop_type.equivalent) {
            Some(equivalent) => {
                self.pop_type = equivalent;
                true
            }
            None => {
                error!(
                    "Tried to convert pop of type {} to equivalent, but there is no equivalent.",
                    keys.identifier(self.pop_type)
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> PopTypeKeys {
        PopTypeKeys::new(vec![
            PopType {
                identifier: "farmers".into(),
                is_slave: false,
                equivalent: Some(PopTypeId(1)),
            },
            PopType {
                identifier: "labourers".into(),
                is_slave: false,
                equivalent: Some(PopTypeId(0)),
            },
            PopType {
                identifier: "slaves".into(),
                is_slave: true,
                equivalent: None,
            },
        ])
    }

    #[test]
    fn test_find_and_flags() {
        let keys = keys();
        assert_eq!(keys.find("labourers"), Some(PopTypeId(1)));
        assert_eq!(keys.find("clergymen"), None);
        assert!(keys.is_slave(PopTypeId(2)));
        assert!(!keys.is_slave(PopTypeId(0)));
        assert_eq!(keys.ids().count(), 3);
    }

    #[test]
    fn test_convert_to_equivalent() {
        let keys = keys();
        let mut pop = Pop::new(PopTypeId(0), 500);
        assert!(pop.convert_to_equivalent(&keys));
        assert_eq!(pop.pop_type(), PopTypeId(1));

        let mut slaves = Pop::new(PopTypeId(2), 100);
        assert!(!slaves.convert_to_equivalent(&keys));
        assert_eq!(slaves.pop_type(), PopTypeId(2));
    }

    #[test]
    fn test_income_ledger() {
        let mut pop = Pop::new(PopTypeId(0), 10);
        pop.add_rgo_owner_income(FixedPoint::ONE);
        pop.add_rgo_worker_income(FixedPoint::HALF);
        pop.add_rgo_worker_income(FixedPoint::HALF);
        assert_eq!(pop.rgo_owner_income(), FixedPoint::ONE);
        assert_eq!(pop.rgo_worker_income(), FixedPoint::ONE);
        pop.clear_daily_income();
        assert_eq!(pop.rgo_worker_income(), FixedPoint::ZERO);
    }
}
