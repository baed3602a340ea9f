use crate::algorithms::flocking::{DEFAULT_SEPARATION_WIDTHS, FlockParams, flock};
use crate::algorithms::seek::seek;
use crate::error::{PastureError, Result};
use crate::math::{Bounds, Vec2, limit, radians_to_degrees, zero};
use crate::models::sensor::{BorderStyle, Sensor, SensorConfig};
use crate::sim::{AgentId, AgentView, Commands, IdAllocator, Snapshot, WorldBounds};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_CLASS: &str = "Animal";
pub const DEFAULT_AGENT_SIZE: f64 = 10.0;
pub const DEFAULT_MAX_SPEED: f64 = 10.0;
pub const DEFAULT_MAX_STEERING_FORCE: f64 = 10.0;
pub const DEFAULT_AGENT_COLOR: [u8; 3] = [197, 177, 115];
pub const DEFAULT_BOUNCINESS: f64 = 0.75;
/// Below this speed the heading is left unchanged.
pub const HEADING_MIN_SPEED: f64 = 0.1;
const SENSOR_CARRIER_BORDER_RADIUS: f64 = 100.0;

/// Motion state of an agent. Unit mass: forces add straight into `acceleration`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Kinematics {
    pub location: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    /// Heading in degrees.
    pub angle: f64,
    pub max_speed: f64,
    pub max_steering_force: f64,
}

type AgentHookFn = dyn Fn(&Agent, &Snapshot, &mut Commands) + Send + Sync;

/// Per-tick callback. It sees the frozen snapshot and may only queue commands.
#[derive(Clone)]
pub struct AgentHook(Arc<AgentHookFn>);

impl AgentHook {
    pub fn new(f: impl Fn(&Agent, &Snapshot, &mut Commands) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    fn call(&self, agent: &Agent, snapshot: &Snapshot, commands: &mut Commands) {
        (self.0)(agent, snapshot, commands)
    }
}

impl fmt::Debug for AgentHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AgentHook(..)")
    }
}

/// Options bundle for a new agent. Every field is optional in JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentConfig {
    /// Class tag; agents flock with others of the same name.
    pub name: String,
    /// Defaults to the world center.
    pub location: Option<[f64; 2]>,
    pub velocity: [f64; 2],
    pub width: f64,
    pub height: f64,
    pub max_speed: f64,
    pub max_steering_force: f64,
    pub follow_mouse: bool,
    pub seek_target: Option<[f64; 2]>,
    pub flocking: bool,
    /// Defaults to twice the width.
    pub desired_separation: Option<f64>,
    pub separate_strength: f64,
    pub align_strength: f64,
    pub cohesion_strength: f64,
    pub wrap_world_edges: bool,
    pub bounciness: f64,
    pub color: [u8; 3],
    pub sensors: Vec<SensorConfig>,
    #[serde(skip)]
    pub before_step: Option<AgentHook>,
    #[serde(skip)]
    pub after_step: Option<AgentHook>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let flock = FlockParams::for_width(DEFAULT_AGENT_SIZE);
        Self {
            name: DEFAULT_CLASS.to_string(),
            location: None,
            velocity: [0.0, 0.0],
            width: DEFAULT_AGENT_SIZE,
            height: DEFAULT_AGENT_SIZE,
            max_speed: DEFAULT_MAX_SPEED,
            max_steering_force: DEFAULT_MAX_STEERING_FORCE,
            follow_mouse: false,
            seek_target: None,
            flocking: false,
            desired_separation: None,
            separate_strength: flock.separate_strength,
            align_strength: flock.align_strength,
            cohesion_strength: flock.cohesion_strength,
            wrap_world_edges: false,
            bounciness: DEFAULT_BOUNCINESS,
            color: DEFAULT_AGENT_COLOR,
            sensors: Vec::new(),
            before_step: None,
            after_step: None,
        }
    }
}

impl AgentConfig {
    /// Reject sizes and limits the steering math cannot work with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |what: &str| {
            Err(PastureError::InvalidConfig(format!("{} for '{}'", what, self.name)))
        };
        if self.name.is_empty() {
            return Err(PastureError::InvalidConfig("agent name must not be empty".to_string()));
        }
        let positive = |side: f64| side.is_finite() && side > 0.0;
        if !(positive(self.width) && positive(self.height)) {
            return invalid("width and height must be positive");
        }
        if !(self.max_speed.is_finite() && self.max_speed >= 0.0) {
            return invalid("maxSpeed must be non-negative");
        }
        if !(self.max_steering_force.is_finite() && self.max_steering_force >= 0.0) {
            return invalid("maxSteeringForce must be non-negative");
        }
        if let Some(d) = self.desired_separation {
            if !(d.is_finite() && d > 0.0) {
                return invalid("desiredSeparation must be positive");
            }
        }
        if self.sensors.iter().any(|s| !(s.sensitivity.is_finite() && s.sensitivity >= 0.0)) {
            return invalid("sensor sensitivity must be non-negative");
        }
        Ok(())
    }

    pub fn at(mut self, location: Vec2) -> Self {
        self.location = Some([location.x, location.y]);
        self
    }
}

/// A steering agent: kinematics, flocking parameters and owned sensors.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    class: String,
    kinematics: Kinematics,
    width: f64,
    height: f64,
    follow_mouse: bool,
    seek_target: Option<Vec2>,
    flocking: bool,
    flock: FlockParams,
    wrap_world_edges: bool,
    bounciness: f64,
    color: [u8; 3],
    border_radius: f64,
    sensors: Vec<Sensor>,
    before_step: Option<AgentHook>,
    after_step: Option<AgentHook>,
}

impl Agent {
    pub fn new(config: AgentConfig, ids: &mut IdAllocator, default_location: Vec2) -> Self {
        let location = config
            .location
            .map(|[x, y]| Vec2::new(x, y))
            .unwrap_or(default_location);
        let sensors: Vec<Sensor> = config
            .sensors
            .into_iter()
            .map(|s| {
                let mut sensor = Sensor::new(ids.sensor(), s);
                sensor.place(location, 0.0);
                sensor
            })
            .collect();
        let border_radius = if sensors.is_empty() { 0.0 } else { SENSOR_CARRIER_BORDER_RADIUS };

        Self {
            id: ids.agent(),
            class: config.name,
            kinematics: Kinematics {
                location,
                velocity: Vec2::new(config.velocity[0], config.velocity[1]),
                acceleration: zero(),
                angle: 0.0,
                max_speed: config.max_speed,
                max_steering_force: config.max_steering_force,
            },
            width: config.width,
            height: config.height,
            follow_mouse: config.follow_mouse,
            seek_target: config.seek_target.map(|[x, y]| Vec2::new(x, y)),
            flocking: config.flocking,
            flock: FlockParams {
                desired_separation: config
                    .desired_separation
                    .unwrap_or(config.width * DEFAULT_SEPARATION_WIDTHS),
                separate_strength: config.separate_strength,
                align_strength: config.align_strength,
                cohesion_strength: config.cohesion_strength,
            },
            wrap_world_edges: config.wrap_world_edges,
            bounciness: config.bounciness,
            color: config.color,
            border_radius,
            sensors,
            before_step: config.before_step,
            after_step: config.after_step,
        }
    }

    pub fn id(&self) -> AgentId { self.id }
    pub fn class(&self) -> &str { &self.class }
    pub fn kinematics(&self) -> &Kinematics { &self.kinematics }
    pub fn location(&self) -> Vec2 { self.kinematics.location }
    pub fn velocity(&self) -> Vec2 { self.kinematics.velocity }
    pub fn acceleration(&self) -> Vec2 { self.kinematics.acceleration }
    pub fn angle(&self) -> f64 { self.kinematics.angle }
    pub fn width(&self) -> f64 { self.width }
    pub fn height(&self) -> f64 { self.height }
    pub fn flocking(&self) -> bool { self.flocking }
    pub fn flock_params(&self) -> &FlockParams { &self.flock }
    pub fn follow_mouse(&self) -> bool { self.follow_mouse }
    pub fn seek_target(&self) -> Option<Vec2> { self.seek_target }
    pub fn wraps_world_edges(&self) -> bool { self.wrap_world_edges }
    pub fn color(&self) -> [u8; 3] { self.color }
    pub fn border_radius(&self) -> f64 { self.border_radius }
    pub fn sensors(&self) -> &[Sensor] { &self.sensors }

    pub fn set_angle(&mut self, angle: f64) { self.kinematics.angle = angle; }
    pub fn set_seek_target(&mut self, target: Option<Vec2>) { self.seek_target = target; }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.kinematics.location, self.width, self.height)
    }

    /// What other agents see of this one for the current tick.
    pub fn view(&self) -> AgentView {
        AgentView {
            id: self.id,
            class: self.class.clone(),
            location: self.kinematics.location,
            velocity: self.kinematics.velocity,
            width: self.width,
            height: self.height,
        }
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.kinematics.acceleration += force;
    }

    /// Run every sensor against the pool it scans.
    pub fn perceive(&mut self, snapshot: &Snapshot) {
        for sensor in &mut self.sensors {
            let pool = sensor
                .pool_class()
                .map(|class| snapshot.agents_by_class(class))
                .unwrap_or(&[]);
            sensor.step(pool);
        }
    }

    /// Accumulate this tick's steering forces and return the acceleration.
    pub fn apply_forces(&mut self, snapshot: &Snapshot) -> Vec2 {
        let location = self.kinematics.location;
        let angle = self.kinematics.angle;
        let mut sensed = zero();
        for (i, sensor) in self.sensors.iter_mut().enumerate() {
            sensor.place(location, angle);
            if i > 0 {
                sensor.set_border_style(BorderStyle::None);
            }
            if let Some(activation) = sensor.activation() {
                sensed += activation.force(&self.kinematics);
            }
        }
        self.apply_force(sensed);

        if let Some(target) = self.seek_target {
            let force = seek(&self.kinematics, target);
            self.apply_force(force);
        }

        if self.follow_mouse {
            if let Some(pointer) = snapshot.pointer() {
                let force = seek(&self.kinematics, pointer);
                self.apply_force(force);
            }
        }

        if self.flocking {
            let force = flock(self, snapshot.agents_by_class(&self.class));
            self.apply_force(force);
        }

        self.kinematics.acceleration
    }

    /// First half of a tick: before-step hook, perception, force accumulation.
    pub fn step(&mut self, snapshot: &Snapshot, commands: &mut Commands) -> Vec2 {
        if let Some(hook) = self.before_step.clone() {
            hook.call(self, snapshot, commands);
        }
        self.perceive(snapshot);
        self.apply_forces(snapshot)
    }

    /// Second half of a tick: Euler integration, edge handling, after-step hook.
    pub fn finish_step(
        &mut self,
        bounds: &WorldBounds,
        snapshot: &Snapshot,
        commands: &mut Commands,
    ) {
        self.integrate(bounds);
        if let Some(hook) = self.after_step.clone() {
            hook.call(self, snapshot, commands);
        }
    }

    pub fn integrate(&mut self, bounds: &WorldBounds) {
        let k = &mut self.kinematics;
        k.velocity = limit(k.velocity + k.acceleration, k.max_speed);
        k.location += k.velocity;
        if k.velocity.norm() > HEADING_MIN_SPEED {
            k.angle = radians_to_degrees(k.velocity.y.atan2(k.velocity.x));
        }
        if self.wrap_world_edges {
            bounds.wrap(&mut k.location);
        } else {
            bounds.bounce(k, self.width, self.height, self.bounciness);
        }
        k.acceleration = zero();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sensor::{Behavior, SensorKind};
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn build(config: AgentConfig) -> Agent {
        Agent::new(config, &mut IdAllocator::default(), Vec2::new(400.0, 300.0))
    }

    fn wolf_at(id_source: &mut IdAllocator, x: f64, y: f64) -> AgentView {
        Agent::new(
            AgentConfig { name: "Wolf".to_string(), ..AgentConfig::default() }.at(Vec2::new(x, y)),
            id_source,
            zero(),
        )
        .view()
    }

    #[test]
    fn defaults_follow_the_options_bundle() {
        let a = build(AgentConfig::default());
        assert_eq!(a.location(), Vec2::new(400.0, 300.0));
        assert_eq!(a.class(), DEFAULT_CLASS);
        assert_eq!(a.kinematics().max_steering_force, DEFAULT_MAX_STEERING_FORCE);
        assert_eq!(a.flock_params().desired_separation, 20.0);
        assert_eq!(a.border_radius(), 0.0);
        assert!(a.sensors().is_empty());
    }

    #[test]
    fn sensors_get_their_own_ids() {
        let mut ids = IdAllocator::default();
        let a = Agent::new(
            AgentConfig {
                sensors: vec![SensorConfig::default(), SensorConfig::default()],
                ..AgentConfig::default()
            },
            &mut ids,
            zero(),
        );
        let sensor_ids: Vec<_> = a.sensors().iter().map(|s| s.id().0).collect();
        assert_eq!(sensor_ids.len(), 2);
        assert_ne!(sensor_ids[0], sensor_ids[1]);
        assert!(!sensor_ids.contains(&a.id().0));
        assert_eq!(a.border_radius(), 100.0);
    }

    #[test]
    fn sensors_are_placed_from_heading() {
        let mut a = build(AgentConfig {
            location: Some([10.0, 10.0]),
            sensors: vec![
                SensorConfig::default().with_offset(20.0, 0.0),
                SensorConfig::default().with_offset(20.0, 90.0),
            ],
            ..AgentConfig::default()
        });
        a.set_angle(90.0);
        a.apply_forces(&Snapshot::default());
        let first = a.sensors()[0].location();
        let second = a.sensors()[1].location();
        assert_relative_eq!(first, Vec2::new(10.0, 30.0), epsilon = 1e-9);
        assert_relative_eq!(second, Vec2::new(-10.0, 10.0), epsilon = 1e-9);
        assert_eq!(a.sensors()[0].border_style(), BorderStyle::Solid);
        assert_eq!(a.sensors()[1].border_style(), BorderStyle::None);
    }

    #[test]
    fn activated_sensor_force_reaches_acceleration() {
        let mut ids = IdAllocator::default();
        let mut sheep = Agent::new(
            AgentConfig {
                name: "Sheep".to_string(),
                location: Some([0.0, 0.0]),
                max_speed: 5.0,
                max_steering_force: 7.0,
                sensors: vec![
                    SensorConfig::new(SensorKind::Wolf, Behavior::Coward)
                        .with_sensitivity(10.0)
                        .with_offset(0.0, 0.0),
                ],
                ..AgentConfig::default()
            },
            &mut ids,
            zero(),
        );
        let snapshot = Snapshot::from_views([wolf_at(&mut ids, 50.0, 0.0)], None);
        sheep.perceive(&snapshot);
        assert!(sheep.sensors()[0].activated());
        let acc = sheep.apply_forces(&snapshot);
        assert!(acc.x < 0.0);
        assert!(acc.norm() <= 7.0 + 1e-9);
    }

    #[test]
    fn seek_target_is_followed() {
        let mut a = build(AgentConfig {
            location: Some([0.0, 0.0]),
            seek_target: Some([0.0, -50.0]),
            max_steering_force: 1.0,
            ..AgentConfig::default()
        });
        let acc = a.apply_forces(&Snapshot::default());
        assert_relative_eq!(acc, Vec2::new(0.0, -1.0), epsilon = 1e-12);
    }

    #[test]
    fn pointer_is_only_followed_when_asked() {
        let snapshot = Snapshot::from_views(std::iter::empty(), Some(Vec2::new(100.0, 0.0)));
        let mut idle = build(AgentConfig { location: Some([0.0, 0.0]), ..AgentConfig::default() });
        assert_eq!(idle.apply_forces(&snapshot), zero());
        let mut follower = build(AgentConfig {
            location: Some([0.0, 0.0]),
            follow_mouse: true,
            ..AgentConfig::default()
        });
        assert!(follower.apply_forces(&snapshot).x > 0.0);
    }

    #[test]
    fn integrate_moves_and_resets_acceleration() {
        let mut a = build(AgentConfig {
            location: Some([100.0, 100.0]),
            max_speed: 3.0,
            ..AgentConfig::default()
        });
        a.apply_force(Vec2::new(0.0, 10.0));
        a.integrate(&WorldBounds::default());
        assert_relative_eq!(a.velocity(), Vec2::new(0.0, 3.0), epsilon = 1e-12);
        assert_relative_eq!(a.location(), Vec2::new(100.0, 103.0), epsilon = 1e-12);
        assert_relative_eq!(a.angle(), 90.0, epsilon = 1e-9);
        assert_eq!(a.acceleration(), zero());
    }

    #[test]
    fn hooks_run_once_each() {
        let before = Arc::new(AtomicUsize::new(0));
        let after = Arc::new(AtomicUsize::new(0));
        let (b, f) = (before.clone(), after.clone());
        let mut a = build(AgentConfig {
            before_step: Some(AgentHook::new(move |_, _, _| {
                b.fetch_add(1, Ordering::SeqCst);
            })),
            after_step: Some(AgentHook::new(move |_, _, _| {
                f.fetch_add(1, Ordering::SeqCst);
            })),
            ..AgentConfig::default()
        });
        let snapshot = Snapshot::default();
        let mut commands = Commands::default();
        a.step(&snapshot, &mut commands);
        assert_eq!((before.load(Ordering::SeqCst), after.load(Ordering::SeqCst)), (1, 0));
        a.finish_step(&WorldBounds::default(), &snapshot, &mut commands);
        assert_eq!((before.load(Ordering::SeqCst), after.load(Ordering::SeqCst)), (1, 1));
    }

    #[test]
    fn validate_rejects_bad_limits() {
        assert!(AgentConfig::default().validate().is_ok());
        let bad = AgentConfig { desired_separation: Some(0.0), ..AgentConfig::default() };
        assert!(matches!(bad.validate(), Err(PastureError::InvalidConfig(_))));
        let bad = AgentConfig { width: -1.0, ..AgentConfig::default() };
        assert!(bad.validate().is_err());
        let bad = AgentConfig { name: String::new(), ..AgentConfig::default() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn config_parses_camel_case_options() {
        let config: AgentConfig = serde_json::from_str(
            r#"{
                "name": "Wolf",
                "maxSpeed": 7,
                "maxSteeringForce": 7,
                "flocking": true,
                "desiredSeparation": 50,
                "separateStrength": 2,
                "wrapWorldEdges": true,
                "sensors": [{ "type": "sheep", "behavior": "AGGRESSIVE" }]
            }"#,
        )
        .expect("valid agent config");
        assert_eq!(config.name, "Wolf");
        assert_eq!(config.desired_separation, Some(50.0));
        assert_eq!(config.align_strength, 0.2);
        assert_eq!(config.sensors.len(), 1);
        assert!(config.wrap_world_edges);
    }
}
