//! Workforce sizing and proportional hiring.

use std::sync::Arc;

use tracing::{debug, error};

use super::{Employee, ResourceGatheringOperation, RgoError, RgoLocation};
use crate::simulation::{FixedPoint, PopRef, PopSize, WorkforceHook};

impl ResourceGatheringOperation {
    /// Resizes the operation to the pops that could work it and returns how many there are.
    pub(super) fn update_size_and_return_total_worker_count(
        &mut self,
        location: &RgoLocation<'_>,
        workforce: &dyn WorkforceHook,
    ) -> PopSize {
        let Some(production_type) = self.production.production_type().cloned() else {
            self.size_multiplier = FixedPoint::ZERO;
            self.max_employee_count = 0;
            return 0;
        };

        // Each pop counts once, however many jobs accept its type. Equivalents are not counted.
        let total_worker_count_in_province: PopSize = location
            .pops
            .iter()
            .filter(|pop| production_type.employs(pop.pop_type()))
            .map(|pop| pop.size())
            .sum();

        let base_workforce_size = workforce.base_workforce_size(&production_type, location.terrain);
        if base_workforce_size <= FixedPoint::ZERO {
            let err = RgoError::InvalidWorkforceSize {
                production_type: production_type.identifier.clone(),
                size: base_workforce_size,
            };
            error!("{err}");
            self.size_multiplier = FixedPoint::ZERO;
            self.max_employee_count = 0;
            return total_worker_count_in_province;
        }

        self.size_multiplier = ((FixedPoint::from(total_worker_count_in_province)
            / base_workforce_size)
            .ceil()
            * FixedPoint::ONE_AND_HALF)
            .floor();
        self.max_employee_count =
            (self.size_multiplier * production_type.base_workforce_size).to_pop_size();

        debug!(
            province = location.identifier,
            workers = total_worker_count_in_province,
            size = %self.size_multiplier,
            capacity = self.max_employee_count,
            "rgo sized"
        );
        total_worker_count_in_province
    }

    /// Rebuilds the employee list, per-type counts and totals from scratch.
    pub(super) fn hire(&mut self, location: &RgoLocation<'_>, available_worker_count: PopSize) {
        self.employees.clear();
        self.employee_count_per_type.fill(0);
        self.total_employees_count = 0;
        self.total_paid_employees_count = 0;

        let Some(production_type) = self.production.production_type().cloned() else {
            return;
        };
        if self.max_employee_count <= 0 {
            return;
        }

        let proportion_to_hire = if self.max_employee_count >= available_worker_count {
            FixedPoint::ONE
        } else {
            FixedPoint::from(self.max_employee_count) / FixedPoint::from(available_worker_count)
        };

        let keys = Arc::clone(self.employee_count_per_type.keys());
        for (index, pop) in location.pops.iter().enumerate() {
            let pop_type = pop.pop_type();
            if !production_type.employs(pop_type) {
                continue;
            }

            let pop_size_to_hire = (proportion_to_hire * pop.size()).floor().to_pop_size();
            self.employee_count_per_type[pop_type] += pop_size_to_hire;
            self.employees.push(Employee::new(
                PopRef {
                    province: location.province,
                    index,
                },
                pop_type,
                pop_size_to_hire,
            ));
            self.total_employees_count += pop_size_to_hire;
            if !keys.is_slave(pop_type) {
                self.total_paid_employees_count += pop_size_to_hire;
            }
        }
    }
}
