use crate::error::Result;
use crate::math::Vec2;
use crate::models::animal::{AgentConfig, AgentHook};
use crate::models::sensor::{Behavior, Sensor, SensorConfig, SensorKind, is_inside};
use crate::sim::{World, WorldBounds};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const SHEEP: &str = "Sheep";
pub const WOLF: &str = "Wolf";

pub const DEFAULT_SHEEP: usize = 150;
pub const DEFAULT_WOLVES: usize = 1;
pub const DEFAULT_SEED: u64 = 0x5eed;

pub const SHEEP_SENSOR_SENSITIVITY: f64 = 10.0;
pub const SHEEP_SENSOR_OFFSET: f64 = -20.0;

pub const WOLF_COLOR: [u8; 3] = [89, 207, 78];
pub const WOLF_MAX_SPEED: f64 = 7.0;
pub const WOLF_MAX_STEERING_FORCE: f64 = 7.0;
pub const WOLF_DESIRED_SEPARATION: f64 = 50.0;
pub const WOLF_SEPARATE_STRENGTH: f64 = 2.0;
pub const WOLF_ALIGN_STRENGTH: f64 = 0.01;
pub const WOLF_COHESION_STRENGTH: f64 = 0.01;
pub const FOUNDER_SENSOR_SENSITIVITY: f64 = 10.0;
pub const FOUNDER_SENSOR_OFFSET: f64 = -10.0;
pub const SPAWNED_SENSOR_SENSITIVITY: f64 = 7.0;
pub const SPAWNED_SENSOR_OFFSET: f64 = -20.0;

/// Population and field settings for a sheep-vs-wolves run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PastureConfig {
    pub sheep: usize,
    pub wolves: usize,
    pub width: f64,
    pub height: f64,
    pub seed: u64,
}

impl Default for PastureConfig {
    fn default() -> Self {
        let bounds = WorldBounds::default();
        Self {
            sheep: DEFAULT_SHEEP,
            wolves: DEFAULT_WOLVES,
            width: bounds.width,
            height: bounds.height,
            seed: DEFAULT_SEED,
        }
    }
}

impl PastureConfig {
    pub fn bounds(&self) -> WorldBounds {
        WorldBounds::new(self.width, self.height)
    }

    pub fn validate(&self) -> Result<()> {
        self.bounds().validate()
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
}

/// Flocking sheep that flee any wolf their rear sensor picks up.
pub fn sheep_config(location: Vec2) -> AgentConfig {
    AgentConfig {
        name: SHEEP.to_string(),
        flocking: true,
        wrap_world_edges: true,
        sensors: vec![
            SensorConfig::new(SensorKind::Wolf, Behavior::Coward)
                .with_sensitivity(SHEEP_SENSOR_SENSITIVITY)
                .with_offset(SHEEP_SENSOR_OFFSET, 0.0),
        ],
        ..AgentConfig::default()
    }
    .at(location)
}

pub fn founder_wolf_sensor() -> SensorConfig {
    SensorConfig::new(SensorKind::Sheep, Behavior::Aggressive)
        .with_sensitivity(FOUNDER_SENSOR_SENSITIVITY)
        .with_offset(FOUNDER_SENSOR_OFFSET, 0.0)
}

pub fn spawned_wolf_sensor() -> SensorConfig {
    SensorConfig::new(SensorKind::Sheep, Behavior::Aggressive)
        .with_sensitivity(SPAWNED_SENSOR_SENSITIVITY)
        .with_offset(SPAWNED_SENSOR_OFFSET, 0.0)
}

/// Loosely flocking wolf that chases sheep and converts the ones it catches.
pub fn wolf_config(location: Option<Vec2>, sensor: SensorConfig) -> AgentConfig {
    AgentConfig {
        name: WOLF.to_string(),
        location: location.map(|l| [l.x, l.y]),
        color: WOLF_COLOR,
        max_speed: WOLF_MAX_SPEED,
        max_steering_force: WOLF_MAX_STEERING_FORCE,
        flocking: true,
        desired_separation: Some(WOLF_DESIRED_SEPARATION),
        separate_strength: WOLF_SEPARATE_STRENGTH,
        align_strength: WOLF_ALIGN_STRENGTH,
        cohesion_strength: WOLF_COHESION_STRENGTH,
        wrap_world_edges: true,
        sensors: vec![sensor],
        before_step: Some(hunt()),
        ..AgentConfig::default()
    }
}

/// Predation rule, run before each wolf step.
///
/// With one of its sensors locked on, a wolf whose body overlaps a sheep eats it,
/// and a new wolf appears where the sheep stood.
pub fn hunt() -> AgentHook {
    AgentHook::new(|wolf, snapshot, commands| {
        if !wolf.sensors().iter().any(Sensor::activated) {
            return;
        }
        let body = wolf.bounds();
        for sheep in snapshot.agents_by_class(SHEEP) {
            if is_inside(&body, &sheep.bounds(), 0.0) {
                log::info!(
                    "{} caught {} at ({:.1}, {:.1})",
                    wolf.id(),
                    sheep.id,
                    sheep.location.x,
                    sheep.location.y
                );
                let offspring = wolf_config(Some(sheep.location), spawned_wolf_sensor());
                commands.consume(sheep.id, offspring);
            }
        }
    })
}

/// Seed `world` with the configured flock and founder wolves.
///
/// Sheep are scattered uniformly; the first wolf starts at the center, the rest are scattered too.
pub fn populate(world: &mut World, config: &PastureConfig) -> Result<()> {
    config.validate()?;
    let bounds = *world.bounds();
    bounds.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut scatter = move || {
        Vec2::new(
            rng.gen_range(0.0..bounds.width),
            rng.gen_range(0.0..bounds.height),
        )
    };

    for _ in 0..config.sheep {
        world.spawn(sheep_config(scatter()))?;
    }
    for i in 0..config.wolves {
        let location = if i == 0 { bounds.center() } else { scatter() };
        world.spawn(wolf_config(Some(location), founder_wolf_sensor()))?;
    }
    log::info!(
        "pasture ready: {} sheep, {} wolves on {}x{} (seed {})",
        config.sheep,
        config.wolves,
        bounds.width,
        bounds.height,
        config.seed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PastureError;

    #[test]
    fn populate_spawns_requested_counts() {
        let config = PastureConfig { sheep: 12, wolves: 3, ..PastureConfig::default() };
        let mut world = World::new(config.bounds());
        populate(&mut world, &config).expect("populate");
        assert_eq!(world.count_of(SHEEP), 12);
        assert_eq!(world.count_of(WOLF), 3);
        for sheep in world.agents_by_class(SHEEP) {
            let p = sheep.location();
            assert!((0.0..config.width).contains(&p.x));
            assert!((0.0..config.height).contains(&p.y));
            assert_eq!(sheep.sensors().len(), 1);
        }
    }

    #[test]
    fn populate_rejects_a_degenerate_world() {
        let mut world = World::new(WorldBounds::new(0.0, 0.0));
        let err = populate(&mut world, &PastureConfig::default());
        assert!(matches!(err, Err(PastureError::InvalidConfig(_))));
        assert!(world.is_empty());

        let mut world = World::new(WorldBounds::new(f64::NAN, 100.0));
        assert!(populate(&mut world, &PastureConfig::default()).is_err());
    }

    #[test]
    fn populate_is_reproducible() {
        let config = PastureConfig { sheep: 5, wolves: 0, seed: 42, ..PastureConfig::default() };
        let run = || {
            let mut world = World::new(config.bounds());
            populate(&mut world, &config).expect("populate");
            world.agents().iter().map(|a| a.location()).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn wolf_catches_sheep_once_its_sensor_is_locked() {
        let mut world = World::default();
        world.spawn(sheep_config(Vec2::new(100.0, 100.0))).expect("spawn");
        world
            .spawn(wolf_config(Some(Vec2::new(100.0, 100.0)), founder_wolf_sensor()))
            .expect("spawn");

        // First tick only locks the wolf's sensor.
        world.tick();
        assert_eq!(world.count_of(SHEEP), 1);
        assert!(world.agents_by_class(WOLF).all(|w| w.sensors()[0].activated()));

        world.tick();
        assert_eq!(world.count_of(SHEEP), 0);
        assert_eq!(world.count_of(WOLF), 2);
    }

    #[test]
    fn spawned_wolves_use_the_tighter_sensor() {
        let config = wolf_config(None, spawned_wolf_sensor());
        assert_eq!(config.sensors[0].sensitivity, SPAWNED_SENSOR_SENSITIVITY);
        assert_eq!(config.sensors[0].offset_distance, SPAWNED_SENSOR_OFFSET);
        assert!(config.before_step.is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_reads_partial_json() {
        let config = PastureConfig::from_json(r#"{ "sheep": 20, "seed": 9 }"#).expect("valid");
        assert_eq!(config.sheep, 20);
        assert_eq!(config.wolves, DEFAULT_WOLVES);
        assert!(PastureConfig::from_json(r#"{ "width": 0 }"#).is_err());
        assert!(matches!(PastureConfig::from_json("{"), Err(PastureError::Json(_))));
    }
}
