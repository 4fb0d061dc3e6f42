use std::sync::{Arc, RwLock};

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::Schedule;
use tracing::{info, warn};

pub mod census;
pub mod fixed;
pub mod indexed;
pub mod map;
pub mod observer;
pub mod pop;
pub mod pricing;
pub mod production;
pub mod resources;
pub mod rgo;
pub mod scenario;
pub mod systems;
pub mod terrain;

pub use census::*;
pub use fixed::*;
pub use indexed::*;
pub use map::*;
pub use observer::*;
pub use pop::*;
pub use pricing::*;
pub use production::*;
pub use resources::*;
pub use rgo::*;
pub use scenario::*;
pub use systems::*;
pub use terrain::*;

pub type SharedObserver = Arc<RwLock<ObserverSnapshot>>;

pub struct SimulationWorld {
    world: World,
    schedule: Schedule,
    observer: SharedObserver,
}

impl SimulationWorld {
    /// Builds the configured scenario, or the built-in one.
    pub fn from_config(config: SimulationConfig, observer: SharedObserver) -> anyhow::Result<Self> {
        let scenario = match &config.scenario_path {
            Some(path) => ScenarioDefinition::load(path)?,
            None => ScenarioDefinition::builtin()?,
        };
        let map = scenario.build(config.seed, config.pop_jitter)?;
        if let Ok(mut snapshot) = observer.write() {
            snapshot.scenario = scenario.name.clone();
        }
        Ok(Self::with_observer(config, map, observer))
    }

    pub fn with_observer(
        config: SimulationConfig,
        mut map: MapInstance,
        observer: SharedObserver,
    ) -> Self {
        let pricing = config.pricing();
        let rules = WorkforceRules::default();
        let mut pending = PendingIncome::default();
        if !map.initialise_for_new_game(&*pricing.0, &*rules.0, &mut pending) {
            warn!("new game rgo initialisation reported problems");
        }

        let mut ledger = RgoLedger::new(config.history_len);
        ledger.record(summarize_day(0, &map, &pending));
        info!(
            active_rgos = ledger.latest.active_rgos,
            revenue = ledger.latest.revenue,
            "rgo simulation initialised"
        );

        let mut world = World::default();
        world.insert_resource(config);
        world.insert_resource(map);
        world.insert_resource(pricing);
        world.insert_resource(rules);
        world.insert_resource(ledger);
        world.insert_resource(OwnerCensusBook::default());
        world.insert_resource(pending);
        world.insert_resource(WorldTime::default());

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                begin_day_system,
                owner_census_system,
                rgo_update_system,
                income_posting_system,
                ledger_system,
                logging_system,
            )
                .chain(),
        );

        let mut simulation = Self {
            world,
            schedule,
            observer,
        };
        simulation.refresh_observer_snapshot();
        simulation
    }

    pub fn tick(&mut self) {
        {
            let mut time = self.world.resource_mut::<WorldTime>();
            time.day += 1;
        }

        self.schedule.run(&mut self.world);
        self.refresh_observer_snapshot();
    }

    pub fn day(&self) -> u64 {
        self.world.resource::<WorldTime>().day
    }

    #[cfg(test)]
    pub fn map(&self) -> &MapInstance {
        self.world.resource::<MapInstance>()
    }

    pub fn ledger(&self) -> &RgoLedger {
        self.world.resource::<RgoLedger>()
    }

    fn refresh_observer_snapshot(&mut self) {
        let day = self.day();
        let map = self.world.resource::<MapInstance>();
        let ledger = self.world.resource::<RgoLedger>();

        if let Ok(mut snapshot) = self.observer.write() {
            snapshot.update(
                day,
                map,
                ledger.latest.clone(),
                ledger.revenue_history.clone(),
                ledger.employment_history.clone(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn builtin_world(config: SimulationConfig) -> (SimulationWorld, SharedObserver) {
        let observer = SharedObserver::default();
        let config = SimulationConfig {
            pop_jitter: 0.0,
            ..config
        };
        let simulation = SimulationWorld::from_config(config, observer.clone()).unwrap();
        (simulation, observer)
    }

    #[test]
    fn test_new_game_has_yesterday_figures() {
        let (simulation, observer) = builtin_world(SimulationConfig::default());
        assert_eq!(simulation.day(), 0);
        assert_eq!(simulation.ledger().latest.active_rgos, 6);
        assert!(simulation.ledger().latest.revenue > 0.0);
        assert!(simulation.ledger().latest.postings > 0);

        let snapshot = observer.read().unwrap();
        assert_eq!(snapshot.scenario, "Two Valleys, 1836");
        assert_eq!(snapshot.rgos.len(), 7);
        assert!(snapshot.rgo(6).is_none());
    }

    #[test]
    fn test_ticks_advance_days_and_history() {
        let (mut simulation, observer) = builtin_world(SimulationConfig::default());
        for _ in 0..3 {
            simulation.tick();
        }
        assert_eq!(simulation.day(), 3);
        let ledger = simulation.ledger();
        assert_eq!(ledger.revenue_history.len(), 4);
        // Pops never change size, so every day repeats the first.
        assert_eq!(ledger.revenue_history[0], ledger.revenue_history[3]);
        assert!(ledger.latest.postings > 0);
        assert_eq!(observer.read().unwrap().day, 3);
    }

    #[test]
    fn test_income_is_posted_and_never_exceeds_revenue() {
        let (mut simulation, _) = builtin_world(SimulationConfig::default());
        simulation.tick();

        let map = simulation.map();
        let aristocrats = map.pop_type_keys().find("aristocrats").unwrap();
        let venice_owners = map.provinces()[2]
            .pops()
            .iter()
            .find(|pop| pop.pop_type() == aristocrats)
            .unwrap();
        // Venice aristocrats take a share of Milan's and Brescia's revenue too.
        let venice_rgo = map.provinces()[2].rgo().unwrap();
        assert!(venice_owners.rgo_owner_income() > venice_rgo.total_owner_income());

        for rgo in map.provinces().iter().filter_map(|province| province.rgo()) {
            assert!(rgo.total_owner_income() + rgo.total_employee_income() <= rgo.revenue_yesterday());
            assert!(rgo.total_employees_count() <= rgo.max_employee_count());
        }
        let latest = &simulation.ledger().latest;
        assert!(latest.destroyed() >= 0.0);
    }

    #[test]
    fn test_price_overrides_change_revenue() {
        let (base, _) = builtin_world(SimulationConfig::default());
        let (doubled, _) = builtin_world(SimulationConfig {
            price_overrides: BTreeMap::from([("grain".to_string(), FixedPoint::from_f64(4.4))]),
            ..Default::default()
        });
        let milan = |simulation: &SimulationWorld| {
            simulation.map().provinces()[0]
                .rgo()
                .unwrap()
                .revenue_yesterday()
        };
        assert!(milan(&doubled) > milan(&base));
        let brescia = |simulation: &SimulationWorld| {
            simulation.map().provinces()[1]
                .rgo()
                .unwrap()
                .revenue_yesterday()
        };
        assert_eq!(brescia(&doubled), brescia(&base));
    }
}
