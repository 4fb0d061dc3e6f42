//! Scenario definitions: the pop types, goods, production types and map a game starts from.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::simulation::{
    EffectKind, FixedPoint, GoodDefinition, Job, MapInstance, Pop, PopSize, PopType, PopTypeId,
    PopTypeKeys, ProductionType, ProvinceId, TemplateKind, TerrainType,
};

const BUILTIN_SCENARIO: &str = include_str!("builtin_scenario.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    pub pop_types: Vec<PopTypeDefinition>,
    pub goods: Vec<GoodDefinition>,
    pub production_types: Vec<ProductionTypeDefinition>,
    pub states: Vec<StateDefinition>,
    #[serde(default)]
    pub free_provinces: Vec<ProvinceDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopTypeDefinition {
    pub identifier: String,
    #[serde(default)]
    pub is_slave: bool,
    #[serde(default)]
    pub equivalent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    pub pop_type: Option<String>,
    pub effect: EffectKind,
    pub effect_multiplier: FixedPoint,
    #[serde(default = "full_amount")]
    pub amount: FixedPoint,
}

fn full_amount() -> FixedPoint {
    FixedPoint::ONE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionTypeDefinition {
    pub identifier: String,
    #[serde(default = "rgo_template")]
    pub template: TemplateKind,
    #[serde(default)]
    pub owner: Option<JobDefinition>,
    pub jobs: Vec<JobDefinition>,
    pub base_workforce_size: FixedPoint,
    pub base_output_quantity: FixedPoint,
    pub output_good: String,
    #[serde(default)]
    pub is_farm: bool,
    #[serde(default)]
    pub is_mine: bool,
}

fn rgo_template() -> TemplateKind {
    TemplateKind::Rgo
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDefinition {
    pub identifier: String,
    pub provinces: Vec<ProvinceDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvinceDefinition {
    pub identifier: String,
    #[serde(default)]
    pub is_water: bool,
    #[serde(default)]
    pub terrain: Option<String>,
    #[serde(default)]
    pub rgo: Option<String>,
    #[serde(default)]
    pub pops: Vec<PopDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopDefinition {
    pub pop_type: String,
    pub size: PopSize,
}

/// Resolved rules a map is built against.
struct Rules {
    keys: Arc<PopTypeKeys>,
    production_types: HashMap<String, Arc<ProductionType>>,
}

impl ScenarioDefinition {
    pub fn builtin() -> anyhow::Result<Self> {
        serde_json::from_str(BUILTIN_SCENARIO).context("parsing built-in scenario")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing scenario {}", path.display()))
    }

    /// Builds the map. Pop sizes are scaled by up to ±`jitter`, drawn from `seed`.
    pub fn build(&self, seed: u64, jitter: f64) -> anyhow::Result<MapInstance> {
        let rules = self.resolve_rules()?;
        let mut map = MapInstance::new(rules.keys.clone());
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut assignments = Vec::new();

        for state in &self.states {
            let mut members = Vec::with_capacity(state.provinces.len());
            for province in &state.provinces {
                let id = add_province(&mut map, &rules, province, &mut rng, jitter)?;
                members.push(id);
                assignments.push((id, province));
            }
            map.add_state(state.identifier.clone(), members);
        }
        for province in &self.free_provinces {
            let id = add_province(&mut map, &rules, province, &mut rng, jitter)?;
            assignments.push((id, province));
        }

        for (id, province) in assignments {
            let Some(rgo) = &province.rgo else {
                continue;
            };
            let production_type = rules.production_types.get(rgo).cloned().ok_or_else(|| {
                anyhow!(
                    "province {} uses unknown production type {rgo}",
                    province.identifier
                )
            })?;
            if !map.set_rgo_production_type(id, Some(production_type)) {
                warn!(province = %province.identifier, rgo = %rgo, "rgo assignment reported problems");
            }
        }

        info!(
            scenario = %self.name,
            provinces = map.provinces().len(),
            states = map.states().len(),
            population = map.total_population(),
            "scenario built"
        );
        Ok(map)
    }

    fn resolve_rules(&self) -> anyhow::Result<Rules> {
        let ids: HashMap<&str, PopTypeId> = self
            .pop_types
            .iter()
            .enumerate()
            .map(|(index, pop_type)| (pop_type.identifier.as_str(), PopTypeId(index as u16)))
            .collect();
        let lookup = |identifier: &str| {
            ids.get(identifier)
                .copied()
                .ok_or_else(|| anyhow!("unknown pop type {identifier}"))
        };

        let mut types = Vec::with_capacity(self.pop_types.len());
        for pop_type in &self.pop_types {
            types.push(PopType {
                identifier: pop_type.identifier.clone(),
                is_slave: pop_type.is_slave,
                equivalent: pop_type.equivalent.as_deref().map(lookup).transpose()?,
            });
        }

        let keys = PopTypeKeys::new(types);
        if keys.is_empty() {
            bail!("scenario defines no pop types");
        }

        let goods: HashMap<&str, Arc<GoodDefinition>> = self
            .goods
            .iter()
            .map(|good| (good.identifier.as_str(), Arc::new(good.clone())))
            .collect();

        let resolve_job = |job: &JobDefinition| -> anyhow::Result<Job> {
            Ok(Job {
                pop_type: job.pop_type.as_deref().map(lookup).transpose()?,
                effect: job.effect,
                effect_multiplier: job.effect_multiplier,
                amount: job.amount,
            })
        };

        let mut production_types = HashMap::new();
        for definition in &self.production_types {
            let output_good = goods
                .get(definition.output_good.as_str())
                .cloned()
                .ok_or_else(|| {
                    anyhow!(
                        "production type {} outputs unknown good {}",
                        definition.identifier,
                        definition.output_good
                    )
                })?;
            let jobs = definition
                .jobs
                .iter()
                .map(resolve_job)
                .collect::<anyhow::Result<Vec<_>>>()
                .with_context(|| format!("jobs of {}", definition.identifier))?;
            let owner = definition
                .owner
                .as_ref()
                .map(resolve_job)
                .transpose()
                .with_context(|| format!("owner of {}", definition.identifier))?;
            let production_type = ProductionType {
                identifier: definition.identifier.clone(),
                template: definition.template,
                owner,
                jobs,
                base_workforce_size: definition.base_workforce_size,
                base_output_quantity: definition.base_output_quantity,
                output_good,
                is_farm: definition.is_farm,
                is_mine: definition.is_mine,
            };
            if production_types
                .insert(definition.identifier.clone(), Arc::new(production_type))
                .is_some()
            {
                bail!("duplicate production type {}", definition.identifier);
            }
        }

        Ok(Rules {
            keys: Arc::new(keys),
            production_types,
        })
    }
}

fn add_province(
    map: &mut MapInstance,
    rules: &Rules,
    definition: &ProvinceDefinition,
    rng: &mut SmallRng,
    jitter: f64,
) -> anyhow::Result<ProvinceId> {
    let terrain = definition.terrain.as_ref().map(|identifier| TerrainType {
        identifier: identifier.clone(),
    });
    let id = map.add_province(definition.identifier.clone(), definition.is_water, terrain);
    for pop in &definition.pops {
        let pop_type = rules.keys.find(&pop.pop_type).ok_or_else(|| {
            anyhow!(
                "province {} has pop of unknown type {}",
                definition.identifier,
                pop.pop_type
            )
        })?;
        map.add_pop(id, Pop::new(pop_type, jittered(pop.size, rng, jitter)));
    }
    Ok(id)
}

fn jittered(size: PopSize, rng: &mut SmallRng, jitter: f64) -> PopSize {
    if jitter <= 0.0 || size <= 0 {
        return size.max(0);
    }
    let factor = 1.0 + rng.gen_range(-jitter..=jitter);
    (size as f64 * factor).round().max(0.0) as PopSize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{OwnerCensusSource, StateId};

    #[test]
    fn test_builtin_scenario_builds() {
        let scenario = ScenarioDefinition::builtin().unwrap();
        let map = scenario.build(1836, 0.0).unwrap();

        assert_eq!(map.states().len(), 2);
        assert_eq!(map.provinces().len(), 8);
        let sea = &map.provinces()[6];
        assert!(sea.is_water());
        assert!(sea.rgo().is_none());
        let isles = &map.provinces()[7];
        assert!(isles.state().is_none());
        assert!(!isles.rgo().unwrap().is_valid());
        assert_eq!(
            map.provinces()[0].rgo_good().map(|good| good.identifier.as_str()),
            Some("grain")
        );
    }

    #[test]
    fn test_mine_assignment_converts_farmers() {
        let map = ScenarioDefinition::builtin().unwrap().build(1836, 0.0).unwrap();
        let keys = map.pop_type_keys();
        let labourers = keys.find("labourers").unwrap();
        let brescia = &map.provinces()[1];
        assert!(brescia.pops().iter().all(|pop| keys.identifier(pop.pop_type()) != "farmers"));
        let labourer_count: PopSize = brescia
            .pops()
            .iter()
            .filter(|pop| pop.pop_type() == labourers)
            .map(Pop::size)
            .sum();
        assert_eq!(labourer_count, 38_000);
    }

    #[test]
    fn test_jitter_is_deterministic_per_seed() {
        let scenario = ScenarioDefinition::builtin().unwrap();
        let first = scenario.build(7, 0.2).unwrap();
        let again = scenario.build(7, 0.2).unwrap();
        let other = scenario.build(8, 0.2).unwrap();

        assert_eq!(first.total_population(), again.total_population());
        assert_ne!(first.total_population(), other.total_population());
        let flat = scenario.build(7, 0.0).unwrap();
        let ratio = first.total_population() as f64 / flat.total_population() as f64;
        assert!((0.8..=1.2).contains(&ratio));
    }

    #[test]
    fn test_state_census_covers_members() {
        let map = ScenarioDefinition::builtin().unwrap().build(0, 0.0).unwrap();
        let aristocrats = map.pop_type_keys().find("aristocrats").unwrap();
        let census = map.owner_census(StateId(0), aristocrats).unwrap();
        assert_eq!(census.owner_count, 3000 + 800 + 1500);
        assert_eq!(census.owner_pops.len(), 3);
    }

    #[test]
    fn test_unknown_references_are_errors() {
        let mut scenario = ScenarioDefinition::builtin().unwrap();
        scenario.states[0].provinces[0].rgo = Some("gold_mine".into());
        assert!(scenario.build(0, 0.0).is_err());

        let mut scenario = ScenarioDefinition::builtin().unwrap();
        scenario.pop_types[0].equivalent = Some("serfs".into());
        assert!(scenario.build(0, 0.0).is_err());

        let mut scenario = ScenarioDefinition::builtin().unwrap();
        scenario.production_types[0].output_good = "spice".into();
        assert!(scenario.build(0, 0.0).is_err());
    }

    #[test]
    fn test_scenario_without_pop_types_is_rejected() {
        let mut scenario = ScenarioDefinition::builtin().unwrap();
        scenario.pop_types.clear();
        scenario.production_types.clear();
        let err = scenario.build(0, 0.0).unwrap_err();
        assert!(format!("{err:#}").contains("no pop types"));
    }
}
