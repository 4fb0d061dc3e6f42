//! Read-only production rules: goods, jobs and production types.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::simulation::{FixedPoint, PopTypeId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoodDefinition {
    pub identifier: String,
    pub base_price: FixedPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Output,
    Throughput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub pop_type: Option<PopTypeId>,
    pub effect: EffectKind,
    pub effect_multiplier: FixedPoint,
    /// Upper bound on the workforce share this job counts, applied when the multiplier is not 1.
    pub amount: FixedPoint,
}

impl Job {
    pub fn employs(&self, pop_type: PopTypeId) -> bool {
        self.pop_type == Some(pop_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Rgo,
    Factory,
    Artisan,
}

#[derive(Debug, Clone)]
pub struct ProductionType {
    pub identifier: String,
    pub template: TemplateKind,
    pub owner: Option<Job>,
    pub jobs: Vec<Job>,
    pub base_workforce_size: FixedPoint,
    pub base_output_quantity: FixedPoint,
    pub output_good: Arc<GoodDefinition>,
    pub is_farm: bool,
    pub is_mine: bool,
}

impl ProductionType {
    /// Whether any worker job takes pops of this type.
    pub fn employs(&self, pop_type: PopTypeId) -> bool {
        self.jobs.iter().any(|job| job.employs(pop_type))
    }

    pub fn is_rgo(&self) -> bool {
        self.template == TemplateKind::Rgo
    }
}
