//! Resource gathering operations: the raw-good producer every land province owns.
//!
//! A day runs five stages in a fixed order, each reading only what the
//! previous stage left behind:
//! 1. size the operation from the province's matching pops,
//! 2. hire proportionally up to capacity,
//! 3. produce (reading the state-wide owner census),
//! 4. price the output,
//! 5. pay owners and workers.

mod distribute;
mod employee;
mod produce;
mod workforce;

use std::sync::Arc;

use thiserror::Error;

pub use distribute::{IncomeKind, IncomePosting};
pub use employee::Employee;
pub use produce::OwnerShares;

use crate::simulation::{
    FixedPoint, IndexedMap, OwnerCensusSource, Pop, PopSize, PopTypeId, PopTypeKeys, PriceSource,
    ProductionType, ProvinceId, StateId, TerrainType, WorkforceHook,
};

/// Recoverable per-day configuration failures. Logged, never propagated past the operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RgoError {
    #[error("Owner job for {production_type} has no pop type.")]
    MissingOwnerPopType { production_type: String },
    #[error("Province {province} has no state.")]
    MissingState { province: String },
    #[error("State {state} has invalid province reference {province:?}.")]
    InvalidStateProvince { state: String, province: ProvinceId },
    #[error("Unknown state {0:?}.")]
    UnknownState(StateId),
    #[error("No owner census was taken for state {state:?} and pop type {pop_type:?}.")]
    MissingCensus { state: StateId, pop_type: PopTypeId },
    #[error("Production type {production_type} has non-positive base workforce size {size}.")]
    InvalidWorkforceSize {
        production_type: String,
        size: FixedPoint,
    },
}

#[derive(Debug, Clone, Default)]
pub enum RgoProduction {
    #[default]
    Inactive,
    Active(Arc<ProductionType>),
}

impl RgoProduction {
    pub fn production_type(&self) -> Option<&Arc<ProductionType>> {
        match self {
            RgoProduction::Inactive => None,
            RgoProduction::Active(production_type) => Some(production_type),
        }
    }
}

impl From<Option<Arc<ProductionType>>> for RgoProduction {
    fn from(production_type: Option<Arc<ProductionType>>) -> Self {
        production_type.map_or(RgoProduction::Inactive, RgoProduction::Active)
    }
}

/// The province an operation works in, borrowed for one update.
#[derive(Debug, Clone, Copy)]
pub struct RgoLocation<'a> {
    pub province: ProvinceId,
    pub identifier: &'a str,
    pub state: Option<StateId>,
    pub terrain: Option<&'a TerrainType>,
    pub pops: &'a [Pop],
}

/// Collaborators an update reads from: owner census, prices and workforce rules.
#[derive(Clone, Copy)]
pub struct RgoServices<'a> {
    pub census: &'a dyn OwnerCensusSource,
    pub prices: &'a dyn PriceSource,
    pub workforce: &'a dyn WorkforceHook,
}

#[derive(Debug, Clone)]
pub struct ResourceGatheringOperation {
    production: RgoProduction,
    revenue_yesterday: FixedPoint,
    output_quantity_yesterday: FixedPoint,
    unsold_quantity_yesterday: FixedPoint,
    size_multiplier: FixedPoint,
    employees: Vec<Employee>,
    max_employee_count: PopSize,
    total_employees_count: PopSize,
    total_paid_employees_count: PopSize,
    total_owner_income: FixedPoint,
    total_employee_income: FixedPoint,
    employee_count_per_type: IndexedMap<PopSize>,
}

impl ResourceGatheringOperation {
    pub fn new(pop_type_keys: Arc<PopTypeKeys>) -> Self {
        Self {
            production: RgoProduction::Inactive,
            revenue_yesterday: FixedPoint::ZERO,
            output_quantity_yesterday: FixedPoint::ZERO,
            unsold_quantity_yesterday: FixedPoint::ZERO,
            size_multiplier: FixedPoint::ZERO,
            employees: Vec::new(),
            max_employee_count: 0,
            total_employees_count: 0,
            total_paid_employees_count: 0,
            total_owner_income: FixedPoint::ZERO,
            total_employee_income: FixedPoint::ZERO,
            employee_count_per_type: IndexedMap::new(pop_type_keys),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.production, RgoProduction::Active(_))
    }

    pub fn production_type(&self) -> Option<&Arc<ProductionType>> {
        self.production.production_type()
    }

    /// The owning province checks the template before calling this.
    pub fn set_production_type(&mut self, production_type: Option<Arc<ProductionType>>) {
        self.production = production_type.into();
    }

    pub fn revenue_yesterday(&self) -> FixedPoint {
        self.revenue_yesterday
    }

    pub fn output_quantity_yesterday(&self) -> FixedPoint {
        self.output_quantity_yesterday
    }

    pub fn unsold_quantity_yesterday(&self) -> FixedPoint {
        self.unsold_quantity_yesterday
    }

    pub fn size_multiplier(&self) -> FixedPoint {
        self.size_multiplier
    }

    pub fn max_employee_count(&self) -> PopSize {
        self.max_employee_count
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn employee_count_per_type(&self) -> &IndexedMap<PopSize> {
        &self.employee_count_per_type
    }

    pub fn total_employees_count(&self) -> PopSize {
        self.total_employees_count
    }

    pub fn total_paid_employees_count(&self) -> PopSize {
        self.total_paid_employees_count
    }

    pub fn total_owner_income(&self) -> FixedPoint {
        self.total_owner_income
    }

    pub fn total_employee_income(&self) -> FixedPoint {
        self.total_employee_income
    }

    /// Runs one simulated day and returns the income owed to each pop.
    ///
    /// Pop sizes are only read here; the caller posts the returned income once
    /// every operation in the map has run.
    pub fn update_daily(
        &mut self,
        location: &RgoLocation<'_>,
        services: &RgoServices<'_>,
    ) -> Vec<IncomePosting> {
        let total_worker_count_in_province =
            self.update_size_and_return_total_worker_count(location, services.workforce);
        self.hire(location, total_worker_count_in_province);

        let outcome = self.produce(location, services.census);
        self.output_quantity_yesterday = outcome.output;
        self.unsold_quantity_yesterday = FixedPoint::ZERO;
        self.revenue_yesterday = match &self.production {
            RgoProduction::Active(production_type) => {
                outcome.output * services.prices.price(&production_type.output_good)
            }
            RgoProduction::Inactive => FixedPoint::ZERO,
        };

        self.pay_employees(
            location,
            self.revenue_yesterday,
            total_worker_count_in_province,
            &outcome.owners,
        )
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::simulation::EffectKind;

    #[test]
    fn test_inactive_operation_zeroes_everything() {
        let mut rgo = ResourceGatheringOperation::new(keys());
        let pops = vec![Pop::new(FARMERS, 250)];
        let postings = run_day(&mut rgo, &pops, &FixedCensus::default());

        assert!(!rgo.is_valid());
        assert!(postings.is_empty());
        assert_eq!(rgo.size_multiplier(), FixedPoint::ZERO);
        assert_eq!(rgo.max_employee_count(), 0);
        assert!(rgo.employees().is_empty());
        assert_eq!(rgo.output_quantity_yesterday(), FixedPoint::ZERO);
        assert_eq!(rgo.revenue_yesterday(), FixedPoint::ZERO);
    }

    #[test]
    fn test_farmers_only_day() {
        let mut rgo = ResourceGatheringOperation::new(keys());
        rgo.set_production_type(Some(farmers_farm()));
        let pops = vec![Pop::new(FARMERS, 250)];
        let postings = run_day(&mut rgo, &pops, &FixedCensus::default());

        assert_eq!(rgo.max_employee_count(), 400);
        assert_eq!(rgo.output_quantity_yesterday(), FixedPoint::from_f64(2.5));
        assert_eq!(rgo.revenue_yesterday(), FixedPoint::from_int(5));
        assert_eq!(rgo.unsold_quantity_yesterday(), FixedPoint::ZERO);
        assert_eq!(rgo.total_owner_income(), FixedPoint::ZERO);
        assert_eq!(rgo.total_employee_income(), FixedPoint::from_int(5));
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].kind, IncomeKind::RgoWorker);
        assert_eq!(postings[0].amount, FixedPoint::from_int(5));
    }

    #[test]
    fn test_owner_day_matches_fixed_point_reference() {
        let owner = job(ARISTOCRATS, EffectKind::Output, 2.0, 1.0);
        let mut rgo = ResourceGatheringOperation::new(keys());
        rgo.set_production_type(Some(farm(
            vec![job(FARMERS, EffectKind::Throughput, 1.0, 1.0)],
            Some(owner),
        )));
        let pops = vec![Pop::new(FARMERS, 250), Pop::new(ARISTOCRATS, 10)];
        let mut census = FixedCensus::default();
        census.0.insert(
            (StateId(0), ARISTOCRATS),
            Ok(census_of(&[(1, 10), (0, 30)], 390)),
        );

        let postings = run_day(&mut rgo, &pops, &census);

        assert_eq!(rgo.output_quantity_yesterday().raw(), 197_447);
        assert_eq!(rgo.revenue_yesterday().raw(), 394_894);
        assert_eq!(rgo.total_owner_income().raw(), 31_590 + 94_771);
        assert_eq!(rgo.total_employee_income().raw(), 268_531);
        assert_eq!(postings.len(), 3);
        let distributed = rgo.total_owner_income() + rgo.total_employee_income();
        assert!(distributed <= rgo.revenue_yesterday());
    }

    #[test]
    fn test_daily_update_rebuilds_instead_of_accumulating() {
        let mut rgo = ResourceGatheringOperation::new(keys());
        rgo.set_production_type(Some(farmers_farm()));
        let pops = vec![Pop::new(FARMERS, 250), Pop::new(FARMERS, 50)];
        run_day(&mut rgo, &pops, &FixedCensus::default());
        let first_output = rgo.output_quantity_yesterday();
        run_day(&mut rgo, &pops, &FixedCensus::default());

        assert_eq!(rgo.employees().len(), 2);
        assert_eq!(rgo.total_employees_count(), 300);
        assert_eq!(rgo.employee_count_per_type()[FARMERS], 300);
        assert_eq!(rgo.output_quantity_yesterday(), first_output);
    }

    #[test]
    fn test_clearing_production_type_resets_state() {
        let mut rgo = ResourceGatheringOperation::new(keys());
        rgo.set_production_type(Some(farmers_farm()));
        let pops = vec![Pop::new(FARMERS, 250)];
        run_day(&mut rgo, &pops, &FixedCensus::default());
        assert!(rgo.total_employees_count() > 0);

        rgo.set_production_type(None);
        run_day(&mut rgo, &pops, &FixedCensus::default());
        assert_eq!(rgo.total_employees_count(), 0);
        assert_eq!(rgo.employee_count_per_type()[FARMERS], 0);
        assert_eq!(rgo.total_employee_income(), FixedPoint::ZERO);
    }
}
