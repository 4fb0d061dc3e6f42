//! Terrain and the workforce-size hook it may one day drive.

use serde::{Deserialize, Serialize};

use crate::simulation::{FixedPoint, ProductionType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainType {
    pub identifier: String,
}

/// Supplies the base workforce size an RGO is sized against.
pub trait WorkforceHook {
    fn base_workforce_size(
        &self,
        production_type: &ProductionType,
        terrain: Option<&TerrainType>,
    ) -> FixedPoint;
}

/// Leaves the production type's base workforce size untouched.
///
/// Farm and mine size modifiers from terrain have no agreed values yet, so no
/// terrain changes the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct InertWorkforceHook;

impl WorkforceHook for InertWorkforceHook {
    fn base_workforce_size(
        &self,
        production_type: &ProductionType,
        _terrain: Option<&TerrainType>,
    ) -> FixedPoint {
        production_type.base_workforce_size
    }
}
