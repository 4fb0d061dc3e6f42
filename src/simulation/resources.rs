//! Shared resources and world-level data structures.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::simulation::{
    BasePricing, FixedPoint, IncomePosting, InertWorkforceHook, PriceSource, PriceTable,
    WorkforceHook,
};

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "RGO_SIM_CONFIG";

#[derive(Debug, Clone, Resource, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_ms: u64,
    pub seed: u64,
    /// Relative spread applied to scenario pop sizes, 0.1 = up to ±10%.
    pub pop_jitter: f64,
    /// Run this many days without the TUI, then exit.
    pub headless_days: Option<u64>,
    pub api_addr: Option<SocketAddr>,
    pub log_file: PathBuf,
    pub scenario_path: Option<PathBuf>,
    pub price_overrides: BTreeMap<String, FixedPoint>,
    pub history_len: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: 500,
            seed: 1836,
            pop_jitter: 0.1,
            headless_days: None,
            api_addr: None,
            log_file: PathBuf::from("rgo_studio.log"),
            scenario_path: None,
            price_overrides: BTreeMap::new(),
            history_len: 120,
        }
    }
}

impl SimulationConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Config file from `RGO_SIM_CONFIG` if set, defaults otherwise.
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn pricing(&self) -> Pricing {
        if self.price_overrides.is_empty() {
            Pricing(Box::new(BasePricing))
        } else {
            Pricing(Box::new(PriceTable::new(self.price_overrides.clone())))
        }
    }
}

#[derive(Debug, Clone, Default, Resource, Serialize, Deserialize)]
pub struct WorldTime {
    pub day: u64,
}

#[derive(Resource)]
pub struct Pricing(pub Box<dyn PriceSource + Send + Sync>);

#[derive(Resource)]
pub struct WorkforceRules(pub Box<dyn WorkforceHook + Send + Sync>);

impl Default for WorkforceRules {
    fn default() -> Self {
        Self(Box::new(InertWorkforceHook))
    }
}

/// Income computed by today's RGO pass, waiting to be posted to pops.
#[derive(Debug, Clone, Default, Resource)]
pub struct PendingIncome(pub Vec<IncomePosting>);

/// Map-wide RGO figures for one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub day: u64,
    pub active_rgos: usize,
    pub employed: i64,
    pub paid_employed: i64,
    pub output: f64,
    pub revenue: f64,
    pub owner_income: f64,
    pub worker_income: f64,
    pub postings: usize,
}

impl DailySummary {
    /// Revenue neither owners nor workers received.
    pub fn destroyed(&self) -> f64 {
        self.revenue - self.owner_income - self.worker_income
    }
}

#[derive(Debug, Clone, Resource, Serialize, Deserialize)]
pub struct RgoLedger {
    pub latest: DailySummary,
    pub revenue_history: Vec<f64>,
    pub employment_history: Vec<i64>,
    pub history_len: usize,
}

impl Default for RgoLedger {
    fn default() -> Self {
        Self::new(120)
    }
}

impl RgoLedger {
    pub fn new(history_len: usize) -> Self {
        Self {
            latest: DailySummary::default(),
            revenue_history: Vec::new(),
            employment_history: Vec::new(),
            history_len: history_len.max(1),
        }
    }

    pub fn record(&mut self, summary: DailySummary) {
        self.revenue_history.push(summary.revenue);
        self.employment_history.push(summary.employed);
        if self.revenue_history.len() > self.history_len {
            let excess = self.revenue_history.len() - self.history_len;
            self.revenue_history.drain(..excess);
        }
        if self.employment_history.len() > self.history_len {
            let excess = self.employment_history.len() - self.history_len;
            self.employment_history.drain(..excess);
        }
        self.latest = summary;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::GoodDefinition;

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{ "seed": 7, "price_overrides": { "coal": 3.0 } }"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.tick_ms, 500);
        assert_eq!(config.price_overrides["coal"], FixedPoint::from_int(3));

        let coal = GoodDefinition {
            identifier: "coal".into(),
            base_price: FixedPoint::TWO,
        };
        assert_eq!(config.pricing().0.price(&coal), FixedPoint::from_int(3));
        assert_eq!(SimulationConfig::default().pricing().0.price(&coal), FixedPoint::TWO);
    }

    #[test]
    fn test_zero_tick_is_clamped() {
        let config = SimulationConfig {
            tick_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.tick_duration(), Duration::from_millis(1));
    }

    #[test]
    fn test_ledger_keeps_bounded_history() {
        let mut ledger = RgoLedger::new(3);
        for day in 1..=5 {
            ledger.record(DailySummary {
                day,
                revenue: day as f64,
                employed: day as i64 * 10,
                ..Default::default()
            });
        }
        assert_eq!(ledger.revenue_history, vec![3.0, 4.0, 5.0]);
        assert_eq!(ledger.employment_history, vec![30, 40, 50]);
        assert_eq!(ledger.latest.day, 5);
    }

    #[test]
    fn test_destroyed_revenue() {
        let summary = DailySummary {
            revenue: 12.0,
            owner_income: 6.0,
            ..Default::default()
        };
        assert_eq!(summary.destroyed(), 6.0);
    }
}
