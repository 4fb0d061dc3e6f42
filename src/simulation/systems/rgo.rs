//! Daily RGO pass, split so no system borrows a pop mutably while reading another.

use bevy_ecs::prelude::*;
use tracing::{debug, warn};

use crate::simulation::{
    DailySummary, MapInstance, OwnerCensusBook, PendingIncome, Pricing, RgoLedger,
    RgoServices, WorkforceRules, WorldTime,
};

/// Pop income is per day; yesterday's figures go first.
pub fn begin_day_system(mut map: ResMut<MapInstance>) {
    map.clear_daily_income();
}

pub fn owner_census_system(map: Res<MapInstance>, mut book: ResMut<OwnerCensusBook>) {
    *book = map.build_owner_census();
    debug!(entries = book.len(), "owner census taken");
}

pub fn rgo_update_system(
    mut map: ResMut<MapInstance>,
    book: Res<OwnerCensusBook>,
    pricing: Res<Pricing>,
    rules: Res<WorkforceRules>,
    mut pending: ResMut<PendingIncome>,
) {
    let services = RgoServices {
        census: &*book,
        prices: &*pricing.0,
        workforce: &*rules.0,
    };
    pending.0 = map.update_rgos(&services);
}

pub fn income_posting_system(
    mut map: ResMut<MapInstance>,
    pending: Res<PendingIncome>,
) {
    if !map.post_income(&pending.0) {
        warn!(postings = pending.0.len(), "some rgo income could not be posted");
    }
    let (owner, worker) = map.posted_rgo_income();
    debug!(%owner, %worker, "rgo income posted");
}

pub fn ledger_system(
    time: Res<WorldTime>,
    map: Res<MapInstance>,
    pending: Res<PendingIncome>,
    mut ledger: ResMut<RgoLedger>,
) {
    ledger.record(summarize_day(time.day, &map, &pending));
}

pub fn summarize_day(day: u64, map: &MapInstance, pending: &PendingIncome) -> DailySummary {
    let mut summary = DailySummary {
        day,
        postings: pending.0.len(),
        ..Default::default()
    };
    for rgo in map.provinces().iter().filter_map(|province| province.rgo()) {
        if rgo.is_valid() {
            summary.active_rgos += 1;
        }
        summary.employed += rgo.total_employees_count() as i64;
        summary.paid_employed += rgo.total_paid_employees_count() as i64;
        summary.output += rgo.output_quantity_yesterday().to_f64();
        summary.revenue += rgo.revenue_yesterday().to_f64();
        summary.owner_income += rgo.total_owner_income().to_f64();
        summary.worker_income += rgo.total_employee_income().to_f64();
    }
    summary
}
