//! Shared observer snapshot structures exported via the API.

use serde::Serialize;

use crate::simulation::{DailySummary, MapInstance, Province};

/// One land province's RGO as of the last simulated day.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RgoSnapshot {
    pub province_id: u32,
    pub province: String,
    pub state: Option<String>,
    pub production_type: Option<String>,
    pub good: Option<String>,
    pub population: i32,
    pub size_multiplier: f64,
    pub max_employees: i32,
    pub employees: i32,
    pub paid_employees: i32,
    pub output: f64,
    pub unsold: f64,
    pub revenue: f64,
    pub owner_income: f64,
    pub employee_income: f64,
}

impl RgoSnapshot {
    pub fn capture(map: &MapInstance, province: &Province) -> Option<Self> {
        let rgo = province.rgo()?;
        Some(Self {
            province_id: province.id().0,
            province: province.identifier().to_string(),
            state: province
                .state()
                .and_then(|state| map.state(state))
                .map(|state| state.identifier.clone()),
            production_type: rgo
                .production_type()
                .map(|production_type| production_type.identifier.clone()),
            good: province.rgo_good().map(|good| good.identifier.clone()),
            population: province.total_population(),
            size_multiplier: rgo.size_multiplier().to_f64(),
            max_employees: rgo.max_employee_count(),
            employees: rgo.total_employees_count(),
            paid_employees: rgo.total_paid_employees_count(),
            output: rgo.output_quantity_yesterday().to_f64(),
            unsold: rgo.unsold_quantity_yesterday().to_f64(),
            revenue: rgo.revenue_yesterday().to_f64(),
            owner_income: rgo.total_owner_income().to_f64(),
            employee_income: rgo.total_employee_income().to_f64(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ObserverSnapshot {
    pub day: u64,
    pub scenario: String,
    pub total_population: i64,
    pub rgos: Vec<RgoSnapshot>,
    pub totals: DailySummary,
    pub revenue_history: Vec<f64>,
    pub employment_history: Vec<i64>,
}

impl ObserverSnapshot {
    pub fn update(
        &mut self,
        day: u64,
        map: &MapInstance,
        totals: DailySummary,
        revenue_history: Vec<f64>,
        employment_history: Vec<i64>,
    ) {
        self.day = day;
        self.total_population = map
            .provinces()
            .iter()
            .map(|province| province.total_population() as i64)
            .sum();
        self.rgos = map
            .provinces()
            .iter()
            .filter_map(|province| RgoSnapshot::capture(map, province))
            .collect();
        self.totals = totals;
        self.revenue_history = revenue_history;
        self.employment_history = employment_history;
    }

    pub fn rgo(&self, province_id: u32) -> Option<&RgoSnapshot> {
        self.rgos.iter().find(|row| row.province_id == province_id)
    }
}
