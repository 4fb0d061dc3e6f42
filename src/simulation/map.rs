//! Provinces, states and the pops living in them.

use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::simulation::{
    FixedPoint, GoodDefinition, IncomeKind, IncomePosting, OwnerCensus, OwnerCensusBook,
    OwnerCensusSource, PendingIncome, Pop, PopRef, PopSize, PopTypeId, PopTypeKeys, PriceSource,
    ProductionType, ResourceGatheringOperation, RgoError, RgoLocation, RgoServices, TerrainType,
    WorkforceHook,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProvinceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateId(pub u32);

impl ProvinceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl StateId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct State {
    pub identifier: String,
    pub provinces: Vec<ProvinceId>,
}

#[derive(Debug, Clone)]
pub struct Province {
    id: ProvinceId,
    identifier: String,
    state: Option<StateId>,
    terrain: Option<TerrainType>,
    pops: Vec<Pop>,
    rgo: Option<ResourceGatheringOperation>,
}

impl Province {
    pub fn id(&self) -> ProvinceId {
        self.id
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Water provinces are the ones built without an RGO.
    #[cfg(test)]
    pub fn is_water(&self) -> bool {
        self.rgo.is_none()
    }

    pub fn state(&self) -> Option<StateId> {
        self.state
    }

    #[cfg(test)]
    pub fn pops(&self) -> &[Pop] {
        &self.pops
    }

    pub fn rgo(&self) -> Option<&ResourceGatheringOperation> {
        self.rgo.as_ref()
    }

    pub fn rgo_good(&self) -> Option<&GoodDefinition> {
        self.rgo
            .as_ref()?
            .production_type()
            .map(|production_type| production_type.output_good.as_ref())
    }

    pub fn total_population(&self) -> PopSize {
        self.pops.iter().map(Pop::size).sum()
    }

    pub fn add_pop(&mut self, pop: Pop) -> PopRef {
        self.pops.push(pop);
        PopRef {
            province: self.id,
            index: self.pops.len() - 1,
        }
    }

    /// Assigns the RGO's production type. RGO templates only; worker pops convert to required equivalents.
    pub fn set_rgo_production_type(
        &mut self,
        production_type: Option<Arc<ProductionType>>,
        keys: &PopTypeKeys,
    ) -> bool {
        let Some(rgo) = self.rgo.as_mut() else {
            error!(
                "Tried setting an rgo on water province {}.",
                self.identifier
            );
            return false;
        };

        let mut is_valid_operation = true;
        if let Some(production_type) = &production_type {
            if !production_type.is_rgo() {
                error!(
                    "Tried setting province {} rgo to {} which is not of template type RGO.",
                    self.identifier, production_type.identifier
                );
                return false;
            }
            is_valid_operation &= convert_rgo_worker_pops_to_equivalent(
                &mut self.pops,
                production_type,
                keys,
            );
        }

        rgo.set_production_type(production_type);
        is_valid_operation
    }

    pub fn update_rgo(&mut self, services: &RgoServices<'_>) -> Vec<IncomePosting> {
        let Some(rgo) = self.rgo.as_mut() else {
            return Vec::new();
        };
        let location = RgoLocation {
            province: self.id,
            identifier: &self.identifier,
            state: self.state,
            terrain: self.terrain.as_ref(),
            pops: &self.pops,
        };
        rgo.update_daily(&location, services)
    }
}

fn convert_rgo_worker_pops_to_equivalent(
    pops: &mut [Pop],
    production_type: &ProductionType,
    keys: &PopTypeKeys,
) -> bool {
    let mut is_valid_operation = true;
    for pop in pops.iter_mut() {
        for job in &production_type.jobs {
            let Some(job_pop_type) = job.pop_type else {
                continue;
            };
            let old_pop_type = pop.pop_type();
            if job_pop_type != old_pop_type
                && keys.get(old_pop_type).and_then(|pop_type| pop_type.equivalent)
                    == Some(job_pop_type)
            {
                is_valid_operation &= pop.convert_to_equivalent(keys);
            }
        }
    }
    is_valid_operation
}

/// Every province and state of a running game.
#[derive(Debug, Clone, Resource)]
pub struct MapInstance {
    pop_type_keys: Arc<PopTypeKeys>,
    provinces: Vec<Province>,
    states: Vec<State>,
}

impl MapInstance {
    pub fn new(pop_type_keys: Arc<PopTypeKeys>) -> Self {
        Self {
            pop_type_keys,
            provinces: Vec::new(),
            states: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn pop_type_keys(&self) -> &Arc<PopTypeKeys> {
        &self.pop_type_keys
    }

    pub fn provinces(&self) -> &[Province] {
        &self.provinces
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn province(&self, id: ProvinceId) -> Option<&Province> {
        self.provinces.get(id.index())
    }

    pub fn province_mut(&mut self, id: ProvinceId) -> Option<&mut Province> {
        self.provinces.get_mut(id.index())
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id.index())
    }

    /// Water provinces never get an RGO.
    pub fn add_province(
        &mut self,
        identifier: impl Into<String>,
        is_water: bool,
        terrain: Option<TerrainType>,
    ) -> ProvinceId {
        let id = ProvinceId(self.provinces.len() as u32);
        let rgo = (!is_water).then(|| ResourceGatheringOperation::new(self.pop_type_keys.clone()));
        self.provinces.push(Province {
            id,
            identifier: identifier.into(),
            state: None,
            terrain,
            pops: Vec::new(),
            rgo,
        });
        id
    }

    pub fn add_state(
        &mut self,
        identifier: impl Into<String>,
        provinces: Vec<ProvinceId>,
    ) -> StateId {
        let id = StateId(self.states.len() as u32);
        for province in &provinces {
            match self.provinces.get_mut(province.index()) {
                Some(province) => province.state = Some(id),
                None => warn!("State {} lists unknown province {:?}.", id.0, province),
            }
        }
        self.states.push(State {
            identifier: identifier.into(),
            provinces,
        });
        id
    }

    pub fn add_pop(&mut self, province: ProvinceId, pop: Pop) -> Option<PopRef> {
        self.province_mut(province).map(|province| province.add_pop(pop))
    }

    #[cfg(test)]
    pub fn pop(&self, pop: PopRef) -> Option<&Pop> {
        self.province(pop.province)?.pops.get(pop.index)
    }

    pub fn set_rgo_production_type(
        &mut self,
        province: ProvinceId,
        production_type: Option<Arc<ProductionType>>,
    ) -> bool {
        let keys = self.pop_type_keys.clone();
        match self.provinces.get_mut(province.index()) {
            Some(province) => province.set_rgo_production_type(production_type, &keys),
            None => {
                error!("Tried setting rgo of unknown province {:?}.", province);
                false
            }
        }
    }

    pub fn total_population(&self) -> PopSize {
        self.provinces.iter().map(Province::total_population).sum()
    }

    pub fn clear_daily_income(&mut self) {
        for pop in self.provinces.iter_mut().flat_map(|province| province.pops.iter_mut()) {
            pop.clear_daily_income();
        }
    }

    /// Read-only pass over the whole map; no pop is touched.
    pub fn build_owner_census(&self) -> OwnerCensusBook {
        let mut book = OwnerCensusBook::default();
        for province in &self.provinces {
            let Some(production_type) = province.rgo().and_then(|rgo| rgo.production_type())
            else {
                continue;
            };
            let (Some(state), Some(owner_pop_type)) = (
                province.state,
                production_type.owner.as_ref().and_then(|owner| owner.pop_type),
            ) else {
                continue;
            };
            if !book.contains(state, owner_pop_type) {
                book.record(state, owner_pop_type, self.owner_census(state, owner_pop_type));
            }
        }
        book
    }

    pub fn update_rgos(&mut self, services: &RgoServices<'_>) -> Vec<IncomePosting> {
        self.provinces
            .iter_mut()
            .flat_map(|province| province.update_rgo(services))
            .collect()
    }

    pub fn post_income(&mut self, postings: &[IncomePosting]) -> bool {
        let mut ret = true;
        for posting in postings {
            let Some(pop) = self
                .provinces
                .get_mut(posting.pop.province.index())
                .and_then(|province| province.pops.get_mut(posting.pop.index))
            else {
                error!("Income posted to unknown pop {:?}.", posting.pop);
                ret = false;
                continue;
            };
            match posting.kind {
                IncomeKind::RgoOwner => pop.add_rgo_owner_income(posting.amount),
                IncomeKind::RgoWorker => pop.add_rgo_worker_income(posting.amount),
            }
        }
        ret
    }

    /// Owner and worker income held by pops since income was last cleared.
    pub fn posted_rgo_income(&self) -> (FixedPoint, FixedPoint) {
        self.provinces
            .iter()
            .flat_map(|province| province.pops.iter())
            .fold((FixedPoint::ZERO, FixedPoint::ZERO), |(owner, worker), pop| {
                (owner + pop.rgo_owner_income(), worker + pop.rgo_worker_income())
            })
    }

    /// Runs one RGO day so yesterday's figures exist before the first tick.
    /// The day's postings are left in `pending` after being posted.
    pub fn initialise_for_new_game(
        &mut self,
        prices: &dyn PriceSource,
        workforce: &dyn WorkforceHook,
        pending: &mut PendingIncome,
    ) -> bool {
        let book = self.build_owner_census();
        let services = RgoServices {
            census: &book,
            prices,
            workforce,
        };
        self.clear_daily_income();
        pending.0 = self.update_rgos(&services);
        self.post_income(&pending.0)
    }
}

impl OwnerCensusSource for MapInstance {
    fn owner_census(
        &self,
        state_id: StateId,
        owner_pop_type: PopTypeId,
    ) -> Result<OwnerCensus, RgoError> {
        let state = self.state(state_id).ok_or(RgoError::UnknownState(state_id))?;
        let mut census = OwnerCensus::default();
        for &province_id in &state.provinces {
            let province =
                self.province(province_id)
                    .ok_or_else(|| RgoError::InvalidStateProvince {
                        state: state.identifier.clone(),
                        province: province_id,
                    })?;
            for (index, pop) in province.pops.iter().enumerate() {
                census.state_population += pop.size();
                if pop.pop_type() == owner_pop_type {
                    census.owner_pops.push((
                        PopRef {
                            province: province_id,
                            index,
                        },
                        pop.size(),
                    ));
                    census.owner_count += pop.size();
                }
            }
        }
        Ok(census)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::rgo::test_support::*;
    use crate::simulation::{BasePricing, EffectKind, InertWorkforceHook, TemplateKind};

    struct TwoProvinceState {
        map: MapInstance,
        home: ProvinceId,
        neighbour: ProvinceId,
        sea: ProvinceId,
    }

    fn two_province_state() -> TwoProvinceState {
        let mut map = MapInstance::new(keys());
        let home = map.add_province("home", false, None);
        let neighbour = map.add_province("neighbour", false, None);
        let sea = map.add_province("sea", true, None);
        map.add_pop(home, Pop::new(FARMERS, 250));
        map.add_pop(home, Pop::new(ARISTOCRATS, 10));
        map.add_pop(neighbour, Pop::new(ARISTOCRATS, 30));
        map.add_pop(neighbour, Pop::new(FARMERS, 100));
        map.add_state("heartland", vec![home, neighbour]);
        TwoProvinceState {
            map,
            home,
            neighbour,
            sea,
        }
    }

    fn aristocrat_farm() -> Arc<ProductionType> {
        farm(
            vec![job(FARMERS, EffectKind::Throughput, 1.0, 1.0)],
            Some(job(ARISTOCRATS, EffectKind::Output, 2.0, 1.0)),
        )
    }

    fn run_day(map: &mut MapInstance) -> Vec<IncomePosting> {
        let book = map.build_owner_census();
        let services = RgoServices {
            census: &book,
            prices: &BasePricing,
            workforce: &InertWorkforceHook,
        };
        map.clear_daily_income();
        let postings = map.update_rgos(&services);
        assert!(map.post_income(&postings));
        postings
    }

    #[test]
    fn test_water_provinces_have_no_rgo() {
        let mut world = two_province_state();
        assert!(world.map.province(world.sea).unwrap().rgo().is_none());
        assert!(!world.map.set_rgo_production_type(world.sea, Some(farmers_farm())));
    }

    #[test]
    fn test_census_spans_the_whole_state() {
        let world = two_province_state();
        let census = world.map.owner_census(StateId(0), ARISTOCRATS).unwrap();
        assert_eq!(census.owner_count, 40);
        assert_eq!(census.state_population, 390);
        assert_eq!(census.owner_pops.len(), 2);
        assert_eq!(census.owner_pops[1].0.province, world.neighbour);
    }

    #[test]
    fn test_census_reports_invalid_state_members() {
        let mut world = two_province_state();
        world.map.add_state("broken", vec![world.home, ProvinceId(42)]);
        assert_eq!(
            world.map.owner_census(StateId(1), ARISTOCRATS),
            Err(RgoError::InvalidStateProvince {
                state: "broken".into(),
                province: ProvinceId(42),
            })
        );
        assert_eq!(
            world.map.owner_census(StateId(9), ARISTOCRATS),
            Err(RgoError::UnknownState(StateId(9)))
        );
    }

    #[test]
    fn test_owner_income_reaches_other_provinces() {
        let mut world = two_province_state();
        assert!(world.map.set_rgo_production_type(world.home, Some(aristocrat_farm())));
        run_day(&mut world.map);

        let rgo = world.map.province(world.home).unwrap().rgo().unwrap();
        assert_eq!(rgo.output_quantity_yesterday().raw(), 197_447);
        let neighbour_owner = world
            .map
            .pop(PopRef {
                province: world.neighbour,
                index: 0,
            })
            .unwrap();
        assert_eq!(neighbour_owner.rgo_owner_income().raw(), 94_771);
        let home_farmers = world
            .map
            .pop(PopRef {
                province: world.home,
                index: 0,
            })
            .unwrap();
        assert_eq!(home_farmers.rgo_worker_income().raw(), 268_531);
        // Pops are read, never resized.
        assert_eq!(world.map.total_population(), 390);
    }

    #[test]
    fn test_daily_income_does_not_accumulate_across_days() {
        let mut world = two_province_state();
        world.map.set_rgo_production_type(world.home, Some(aristocrat_farm()));
        run_day(&mut world.map);
        run_day(&mut world.map);
        let home_farmers = world
            .map
            .pop(PopRef {
                province: world.home,
                index: 0,
            })
            .unwrap();
        assert_eq!(home_farmers.rgo_worker_income().raw(), 268_531);
    }

    #[test]
    fn test_both_provinces_share_the_census() {
        let mut world = two_province_state();
        world.map.set_rgo_production_type(world.home, Some(aristocrat_farm()));
        world.map.set_rgo_production_type(world.neighbour, Some(aristocrat_farm()));
        assert_eq!(world.map.build_owner_census().len(), 1);

        let postings = run_day(&mut world.map);
        let owner_total: FixedPoint = postings
            .iter()
            .filter(|posting| posting.kind == IncomeKind::RgoOwner)
            .map(|posting| posting.amount)
            .sum();
        let owners = world
            .map
            .pop(PopRef {
                province: world.neighbour,
                index: 0,
            })
            .unwrap();
        assert!(owners.rgo_owner_income() > FixedPoint::ZERO);
        assert!(owner_total > owners.rgo_owner_income());
    }

    #[test]
    fn test_rejects_non_rgo_templates() {
        let mut world = two_province_state();
        let factory = Arc::new(ProductionType {
            template: TemplateKind::Factory,
            ..(*farmers_farm()).clone()
        });
        assert!(!world.map.set_rgo_production_type(world.home, Some(factory)));
        assert!(!world.map.province(world.home).unwrap().rgo().unwrap().is_valid());
    }

    #[test]
    fn test_assignment_converts_equivalent_pops() {
        let mut world = two_province_state();
        let labourer_mine = farm(vec![job(LABOURERS, EffectKind::Throughput, 1.0, 1.0)], None);
        assert!(world.map.set_rgo_production_type(world.home, Some(labourer_mine)));
        let converted = world
            .map
            .pop(PopRef {
                province: world.home,
                index: 0,
            })
            .unwrap();
        assert_eq!(converted.pop_type(), LABOURERS);
        assert_eq!(world.map.province(world.home).unwrap().rgo_good().unwrap().identifier, "grain");
    }

    #[test]
    fn test_missing_state_is_a_zero_day() {
        let mut map = MapInstance::new(keys());
        let lonely = map.add_province("lonely", false, None);
        map.add_pop(lonely, Pop::new(FARMERS, 100));
        map.set_rgo_production_type(lonely, Some(aristocrat_farm()));
        let postings = run_day(&mut map);

        assert!(postings.is_empty());
        let rgo = map.province(lonely).unwrap().rgo().unwrap();
        assert_eq!(rgo.output_quantity_yesterday(), FixedPoint::ZERO);
        assert_eq!(rgo.total_employees_count(), 100);
    }

    #[test]
    fn test_initialise_for_new_game_fills_yesterday() {
        let mut world = two_province_state();
        world.map.set_rgo_production_type(world.home, Some(aristocrat_farm()));
        let mut pending = PendingIncome::default();
        assert!(
            world
                .map
                .initialise_for_new_game(&BasePricing, &InertWorkforceHook, &mut pending)
        );
        let rgo = world.map.province(world.home).unwrap().rgo().unwrap();
        assert_eq!(rgo.revenue_yesterday().raw(), 394_894);
        // Farmers plus the owners in both provinces.
        assert_eq!(pending.0.len(), 3);
        let (owner, worker) = world.map.posted_rgo_income();
        assert_eq!(owner, rgo.total_owner_income());
        assert_eq!(worker.raw(), 268_531);
    }
}
