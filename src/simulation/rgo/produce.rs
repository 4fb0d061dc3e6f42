//! Daily output from hired workers and the state's owner presence.

use tracing::error;

use super::{ResourceGatheringOperation, RgoError, RgoLocation};
use crate::simulation::{
    EffectKind, FixedPoint, Job, OwnerCensus, OwnerCensusSource, PopRef, PopSize, ProductionType,
};

/// Owner pops found by production, handed unchanged to revenue distribution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerShares {
    pub owner_pops: Vec<(PopRef, PopSize)>,
    pub total_owner_count_in_state: PopSize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionOutcome {
    pub output: FixedPoint,
    pub owners: OwnerShares,
}

impl ResourceGatheringOperation {
    /// Output for today's workforce. Reads state only, so repeated calls agree.
    pub fn produce(
        &self,
        location: &RgoLocation<'_>,
        census: &dyn OwnerCensusSource,
    ) -> ProductionOutcome {
        let Some(production_type) = self.production.production_type() else {
            return ProductionOutcome::default();
        };

        let mut throughput_multiplier = FixedPoint::ONE;
        let mut output_multiplier = FixedPoint::ONE;
        let mut owners = OwnerShares::default();

        if let Some(owner_job) = &production_type.owner {
            let owner_census =
                match lookup_owner_census(production_type, owner_job, location, census) {
                    Ok(owner_census) => owner_census,
                    Err(err) => {
                        error!("{err}");
                        return ProductionOutcome::default();
                    }
                };

            if owner_census.owner_count > 0 && owner_census.state_population > 0 {
                let owner_bonus = owner_job.effect_multiplier * owner_census.owner_count
                    / owner_census.state_population;
                match owner_job.effect {
                    EffectKind::Output => output_multiplier += owner_bonus,
                    EffectKind::Throughput => throughput_multiplier += owner_bonus,
                }
            }

            owners = OwnerShares {
                owner_pops: owner_census.owner_pops,
                total_owner_count_in_state: owner_census.owner_count,
            };
        }

        let mut throughput_from_workers = FixedPoint::ZERO;
        let mut output_from_workers = FixedPoint::ONE;
        for (pop_type, &employees_of_type) in self.employee_count_per_type.iter() {
            if employees_of_type == 0 {
                continue;
            }

            for job in production_type.jobs.iter().filter(|job| job.employs(pop_type)) {
                let mut relative_to_workforce =
                    FixedPoint::ONE * employees_of_type / self.max_employee_count;
                // Jobs at multiplier exactly 1 are never capped.
                if job.effect_multiplier != FixedPoint::ONE && relative_to_workforce > job.amount {
                    relative_to_workforce = job.amount;
                }
                let contribution = job.effect_multiplier * relative_to_workforce;
                match job.effect {
                    EffectKind::Output => output_from_workers += contribution,
                    EffectKind::Throughput => throughput_from_workers += contribution,
                }
            }
        }

        let output = production_type.base_output_quantity
            * self.size_multiplier
            * throughput_multiplier
            * throughput_from_workers
            * output_multiplier
            * output_from_workers;

        ProductionOutcome { output, owners }
    }
}

fn lookup_owner_census(
    production_type: &ProductionType,
    owner_job: &Job,
    location: &RgoLocation<'_>,
    census: &dyn OwnerCensusSource,
) -> Result<OwnerCensus, RgoError> {
    let owner_pop_type = owner_job
        .pop_type
        .ok_or_else(|| RgoError::MissingOwnerPopType {
            production_type: production_type.identifier.clone(),
        })?;
    let state = location.state.ok_or_else(|| RgoError::MissingState {
        province: location.identifier.to_string(),
    })?;
    census.owner_census(state, owner_pop_type)
}
