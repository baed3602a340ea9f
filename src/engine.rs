use crate::error::{PastureError, Result};
use crate::math::Vec2;
use crate::models::pasture::{DEFAULT_SHEEP, PastureConfig, SHEEP, WOLF, populate};
use crate::sim::World;

pub const SCENARIO_SHEEP_AND_WOLVES: &str = "sheep-and-wolves";
pub const SCENARIO_SHEEP_ONLY: &str = "sheep-only";
pub const SCENARIO_WOLF_PACK: &str = "wolf-pack";

pub const WOLF_PACK_SIZE: usize = 5;

/// Per-agent stride of [`Engine::agents_flat`]: x, y, angle, width, class code.
pub const AGENT_STRIDE: usize = 5;
/// Per-sensor stride of [`Engine::sensors_flat`]: x, y, activated.
pub const SENSOR_STRIDE: usize = 3;

pub const CLASS_CODE_OTHER: f32 = 0.0;
pub const CLASS_CODE_SHEEP: f32 = 1.0;
pub const CLASS_CODE_WOLF: f32 = 2.0;

pub struct ScenarioInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub sheep: usize,
    pub wolves: usize,
}

pub fn scenario_catalog() -> &'static [ScenarioInfo] {
    &[
        ScenarioInfo {
            id: SCENARIO_SHEEP_AND_WOLVES,
            name: "Sheep and wolves",
            description: "A large flock and a single wolf; every catch turns into a new wolf.",
            sheep: DEFAULT_SHEEP,
            wolves: 1,
        },
        ScenarioInfo {
            id: SCENARIO_SHEEP_ONLY,
            name: "Grazing flock",
            description: "Sheep flocking undisturbed.",
            sheep: DEFAULT_SHEEP,
            wolves: 0,
        },
        ScenarioInfo {
            id: SCENARIO_WOLF_PACK,
            name: "Wolf pack",
            description: "Several founder wolves scattered across the field.",
            sheep: DEFAULT_SHEEP,
            wolves: WOLF_PACK_SIZE,
        },
    ]
}

pub fn find_scenario(id: &str) -> Option<&'static ScenarioInfo> {
    scenario_catalog().iter().find(|s| s.id == id)
}

/// Front end for drivers (browser, CLI): owns the world and flattens its state.
pub struct Engine {
    scenario_id: String,
    world: World,
}

impl Engine {
    pub fn new_builtin(scenario_id: &str, seed: u64) -> Result<Self> {
        let info = find_scenario(scenario_id)
            .ok_or_else(|| PastureError::UnknownScenario(scenario_id.to_string()))?;
        let config = PastureConfig {
            sheep: info.sheep,
            wolves: info.wolves,
            seed,
            ..PastureConfig::default()
        };
        Self::build(info.id.to_string(), &config)
    }

    pub fn from_config(config: &PastureConfig) -> Result<Self> {
        Self::build("custom".to_string(), config)
    }

    fn build(scenario_id: String, config: &PastureConfig) -> Result<Self> {
        config.validate()?;
        let mut world = World::new(config.bounds());
        populate(&mut world, config)?;
        log::info!("engine ready with scenario '{}'", scenario_id);
        Ok(Self { scenario_id, world })
    }

    pub fn scenario_id(&self) -> &str { &self.scenario_id }
    pub fn world(&self) -> &World { &self.world }
    pub fn world_mut(&mut self) -> &mut World { &mut self.world }
    pub fn len(&self) -> usize { self.world.len() }
    pub fn is_empty(&self) -> bool { self.world.is_empty() }
    pub fn tick_count(&self) -> u64 { self.world.ticks() }

    pub fn tick(&mut self) {
        self.world.tick();
    }

    pub fn set_pointer(&mut self, x: f64, y: f64) {
        self.world.set_pointer(Some(Vec2::new(x, y)));
    }

    pub fn clear_pointer(&mut self) {
        self.world.set_pointer(None);
    }

    /// Live agents per class tag, sorted by tag.
    pub fn census(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for agent in self.world.agents() {
            match counts.iter_mut().find(|(class, _)| class == agent.class()) {
                Some((_, n)) => *n += 1,
                None => counts.push((agent.class().to_string(), 1)),
            }
        }
        counts.sort();
        counts
    }

    pub fn agents_flat(&self) -> Vec<f32> {
        let agents = self.world.agents();
        let mut out = Vec::with_capacity(agents.len() * AGENT_STRIDE);
        for a in agents {
            let p = a.location();
            out.push(p.x as f32);
            out.push(p.y as f32);
            out.push(a.angle() as f32);
            out.push(a.width() as f32);
            out.push(class_code(a.class()));
        }
        out
    }

    pub fn sensors_flat(&self) -> Vec<f32> {
        let mut out = Vec::new();
        for sensor in self.world.agents().iter().flat_map(|a| a.sensors()) {
            let p = sensor.location();
            out.push(p.x as f32);
            out.push(p.y as f32);
            out.push(if sensor.activated() { 1.0 } else { 0.0 });
        }
        out
    }
}

fn class_code(class: &str) -> f32 {
    match class {
        SHEEP => CLASS_CODE_SHEEP,
        WOLF => CLASS_CODE_WOLF,
        _ => CLASS_CODE_OTHER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SCENARIO_SHEEP_AND_WOLVES, DEFAULT_SHEEP, 1)]
    #[case(SCENARIO_SHEEP_ONLY, DEFAULT_SHEEP, 0)]
    #[case(SCENARIO_WOLF_PACK, DEFAULT_SHEEP, WOLF_PACK_SIZE)]
    fn builtin_scenarios_populate(#[case] id: &str, #[case] sheep: usize, #[case] wolves: usize) {
        let engine = Engine::new_builtin(id, 1).expect("known scenario");
        assert_eq!(engine.scenario_id(), id);
        assert_eq!(engine.world().count_of(SHEEP), sheep);
        assert_eq!(engine.world().count_of(WOLF), wolves);
    }

    #[test]
    fn unknown_scenario_is_an_error() {
        let err = Engine::new_builtin("goats", 1).err();
        assert!(matches!(err, Some(PastureError::UnknownScenario(id)) if id == "goats"));
    }

    #[test]
    fn flat_exports_have_fixed_strides() {
        let config = PastureConfig { sheep: 4, wolves: 2, ..PastureConfig::default() };
        let mut engine = Engine::from_config(&config).expect("valid config");
        engine.tick();
        let agents = engine.agents_flat();
        let sensors = engine.sensors_flat();
        assert_eq!(agents.len(), engine.len() * AGENT_STRIDE);
        assert_eq!(sensors.len(), engine.len() * SENSOR_STRIDE);
        let codes: Vec<f32> = agents.chunks(AGENT_STRIDE).map(|c| c[4]).collect();
        assert!(codes.contains(&CLASS_CODE_SHEEP));
        assert!(codes.contains(&CLASS_CODE_WOLF));
    }

    #[test]
    fn census_counts_each_class() {
        let config = PastureConfig { sheep: 3, wolves: 1, ..PastureConfig::default() };
        let engine = Engine::from_config(&config).expect("valid config");
        assert_eq!(
            engine.census(),
            vec![(SHEEP.to_string(), 3), (WOLF.to_string(), 1)]
        );
    }
}
