//! Splitting a day's revenue between state-wide owners and paid workers.

use std::sync::Arc;

use tracing::{error, trace};

use super::{OwnerShares, ResourceGatheringOperation, RgoLocation};
use crate::simulation::{FixedPoint, PopRef, PopSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomeKind {
    RgoOwner,
    RgoWorker,
}

/// Income owed to one pop, posted to its ledger after every province has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncomePosting {
    pub pop: PopRef,
    pub kind: IncomeKind,
    pub amount: FixedPoint,
}

impl ResourceGatheringOperation {
    pub(super) fn pay_employees(
        &mut self,
        location: &RgoLocation<'_>,
        revenue: FixedPoint,
        total_worker_count_in_province: PopSize,
        owners: &OwnerShares,
    ) -> Vec<IncomePosting> {
        self.total_owner_income = FixedPoint::ZERO;
        self.total_employee_income = FixedPoint::ZERO;
        let mut postings = Vec::new();

        if !self.is_valid() || revenue <= FixedPoint::ZERO || total_worker_count_in_province <= 0 {
            if revenue < FixedPoint::ZERO {
                error!("Negative revenue for province {}", location.identifier);
            }
            if total_worker_count_in_province < 0 {
                error!("Negative total worker count for province {}", location.identifier);
            }
            return postings;
        }

        let mut revenue_left = revenue;
        let total_owner_count = owners.total_owner_count_in_state;
        if total_owner_count > 0 {
            let owner_share = (FixedPoint::TWO * total_owner_count
                / total_worker_count_in_province)
                .min(FixedPoint::HALF);

            for &(pop, owner_size) in &owners.owner_pops {
                let income_for_this_pop =
                    revenue_left * owner_share * owner_size / total_owner_count;
                postings.push(IncomePosting {
                    pop,
                    kind: IncomeKind::RgoOwner,
                    amount: income_for_this_pop,
                });
                self.total_owner_income += income_for_this_pop;
            }
            revenue_left *= FixedPoint::ONE - owner_share;
        }

        if self.total_paid_employees_count > 0 {
            let keys = Arc::clone(self.employee_count_per_type.keys());
            for employee in &self.employees {
                if keys.is_slave(employee.pop_type()) {
                    continue;
                }
                let income_for_this_pop =
                    revenue_left * employee.size() / self.total_paid_employees_count;
                postings.push(IncomePosting {
                    pop: employee.pop(),
                    kind: IncomeKind::RgoWorker,
                    amount: income_for_this_pop,
                });
                self.total_employee_income += income_for_this_pop;
            }
        } else {
            // Slave-only workforce: the workers' part leaves the economy.
            trace!(
                province = location.identifier,
                destroyed = %revenue_left,
                "no paid employees"
            );
        }

        postings
    }
}
