use crate::math::{Bounds, Vec2, normalize_or_zero, polar, steer, zero};
use crate::models::animal::Kinematics;
use crate::sim::{AgentId, AgentView, SensorId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_SENSITIVITY: f64 = 2.0;
pub const DEFAULT_SENSOR_SIZE: f64 = 7.0;
pub const DEFAULT_OFFSET_DISTANCE: f64 = 30.0;
pub const DEFAULT_SENSOR_OPACITY: f64 = 0.75;
pub const DEFAULT_ACTIVATED_COLOR: [u8; 3] = [255, 255, 255];
pub const DEFAULT_SENSOR_BORDER_WIDTH: f64 = 2.0;
pub const DEFAULT_SENSOR_BORDER_RADIUS: f64 = 100.0;

/// How an activated sensor steers its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Behavior {
    /// Arrive at the target, slowing as it gets closer.
    Aggressive,
    /// Flee from the target.
    Coward,
    #[default]
    Love,
}

/// Candidate pool a sensor scans, and the behavior it acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Sheep,
    Wolf,
}

impl SensorKind {
    /// Class tag of the agents this kind of sensor perceives.
    pub fn pool_class(self) -> &'static str {
        match self {
            SensorKind::Sheep => "Sheep",
            SensorKind::Wolf => "Wolf",
        }
    }

    /// Only one behavior produces a force for each kind; the rest act like LOVE.
    pub fn honors(self, behavior: Behavior) -> bool {
        matches!(
            (self, behavior),
            (SensorKind::Sheep, Behavior::Aggressive) | (SensorKind::Wolf, Behavior::Coward)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    None,
}

/// Callback run after every perception step, with the sensor as its only argument.
#[derive(Clone)]
pub struct SensorHook(Arc<dyn Fn(&Sensor) + Send + Sync>);

impl SensorHook {
    pub fn new(f: impl Fn(&Sensor) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    fn call(&self, sensor: &Sensor) {
        (self.0)(sensor)
    }
}

impl fmt::Debug for SensorHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SensorHook(..)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SensorConfig {
    /// Which pool to scan. `None` scans nothing.
    #[serde(rename = "type")]
    pub kind: Option<SensorKind>,
    pub behavior: Behavior,
    /// Detection margin, in multiples of the candidate's size.
    pub sensitivity: f64,
    pub width: f64,
    pub height: f64,
    /// Distance from the owner's center; negative places the sensor behind it.
    pub offset_distance: f64,
    /// Degrees relative to the owner's heading.
    pub offset_angle: f64,
    pub opacity: f64,
    pub activated_color: [u8; 3],
    pub border_style: BorderStyle,
    pub border_width: f64,
    pub border_radius: f64,
    #[serde(skip)]
    pub after_step: Option<SensorHook>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            kind: None,
            behavior: Behavior::default(),
            sensitivity: DEFAULT_SENSITIVITY,
            width: DEFAULT_SENSOR_SIZE,
            height: DEFAULT_SENSOR_SIZE,
            offset_distance: DEFAULT_OFFSET_DISTANCE,
            offset_angle: 0.0,
            opacity: DEFAULT_SENSOR_OPACITY,
            activated_color: DEFAULT_ACTIVATED_COLOR,
            border_style: BorderStyle::default(),
            border_width: DEFAULT_SENSOR_BORDER_WIDTH,
            border_radius: DEFAULT_SENSOR_BORDER_RADIUS,
            after_step: None,
        }
    }
}

impl SensorConfig {
    pub fn new(kind: SensorKind, behavior: Behavior) -> Self {
        Self {
            kind: Some(kind),
            behavior,
            ..Self::default()
        }
    }

    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn with_offset(mut self, distance: f64, angle: f64) -> Self {
        self.offset_distance = distance;
        self.offset_angle = angle;
        self
    }

    pub fn with_after_step(mut self, hook: SensorHook) -> Self {
        self.after_step = Some(hook);
        self
    }
}

/// The candidate a sensor is locked on, as seen in the tick's snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub id: AgentId,
    pub location: Vec2,
}

/// Perception unit carried by an agent.
#[derive(Debug, Clone)]
pub struct Sensor {
    id: SensorId,
    kind: Option<SensorKind>,
    behavior: Behavior,
    sensitivity: f64,
    width: f64,
    height: f64,
    offset_distance: f64,
    offset_angle: f64,
    location: Vec2,
    target: Option<Target>,
    color: Option<[u8; 3]>,
    activated_color: [u8; 3],
    opacity: f64,
    border_style: BorderStyle,
    border_width: f64,
    border_radius: f64,
    after_step: Option<SensorHook>,
}

impl Sensor {
    pub fn new(id: SensorId, config: SensorConfig) -> Self {
        Self {
            id,
            kind: config.kind,
            behavior: config.behavior,
            sensitivity: config.sensitivity,
            width: config.width,
            height: config.height,
            offset_distance: config.offset_distance,
            offset_angle: config.offset_angle,
            location: zero(),
            target: None,
            color: None,
            activated_color: config.activated_color,
            opacity: config.opacity,
            border_style: config.border_style,
            border_width: config.border_width,
            border_radius: config.border_radius,
            after_step: config.after_step,
        }
    }

    pub fn id(&self) -> SensorId { self.id }
    pub fn kind(&self) -> Option<SensorKind> { self.kind }
    pub fn behavior(&self) -> Behavior { self.behavior }
    pub fn sensitivity(&self) -> f64 { self.sensitivity }
    pub fn location(&self) -> Vec2 { self.location }
    pub fn offset_distance(&self) -> f64 { self.offset_distance }
    pub fn offset_angle(&self) -> f64 { self.offset_angle }
    pub fn target(&self) -> Option<&Target> { self.target.as_ref() }
    pub fn activated(&self) -> bool { self.target.is_some() }
    /// `None` means transparent.
    pub fn color(&self) -> Option<[u8; 3]> { self.color }
    pub fn opacity(&self) -> f64 { self.opacity }
    pub fn border_style(&self) -> BorderStyle { self.border_style }
    pub fn border_width(&self) -> f64 { self.border_width }
    pub fn border_radius(&self) -> f64 { self.border_radius }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.location, self.width, self.height)
    }

    /// Class tag of the pool this sensor scans, if any.
    pub fn pool_class(&self) -> Option<&'static str> {
        self.kind.map(SensorKind::pool_class)
    }

    /// Move the sensor to its offset around an owner at `owner_location`,
    /// heading `owner_angle` degrees.
    pub fn place(&mut self, owner_location: Vec2, owner_angle: f64) {
        self.location =
            owner_location + polar(self.offset_distance, owner_angle + self.offset_angle);
    }

    pub(crate) fn set_border_style(&mut self, style: BorderStyle) {
        self.border_style = style;
    }

    /// Scan `candidates` and lock on the last one inside the detection box.
    ///
    /// A sensor without a kind never locks on, whatever it is handed.
    pub fn step(&mut self, candidates: &[AgentView]) {
        let me = self.bounds();
        let found = match self.kind {
            Some(_) => candidates
                .iter()
                .filter(|c| is_inside(&me, &c.bounds(), self.sensitivity))
                .last()
                .map(|c| Target { id: c.id, location: c.location }),
            None => None,
        };

        if found.is_some() != self.target.is_some() {
            log::trace!(
                "sensor {} {}",
                self.id,
                if found.is_some() { "activated" } else { "released" }
            );
        }

        self.target = found;
        self.color = if self.target.is_some() {
            Some(self.activated_color)
        } else {
            None
        };

        if let Some(hook) = &self.after_step {
            hook.call(self);
        }
    }

    /// The current activation, if the sensor has a target.
    pub fn activation(&self) -> Option<Activation<'_>> {
        self.target.as_ref().map(|target| Activation { sensor: self, target })
    }

    /// +1 to arrive at the target, -1 to flee, `None` when the behavior produces no force.
    fn direction(&self) -> Option<f64> {
        let kind = self.kind?;
        if !kind.honors(self.behavior) {
            return None;
        }
        match self.behavior {
            Behavior::Aggressive => Some(1.0),
            Behavior::Coward => Some(-1.0),
            Behavior::Love => None,
        }
    }
}

/// An activated sensor together with its target.
#[derive(Debug, Clone, Copy)]
pub struct Activation<'a> {
    sensor: &'a Sensor,
    target: &'a Target,
}

impl<'a> Activation<'a> {
    pub fn sensor(&self) -> &'a Sensor { self.sensor }
    pub fn target(&self) -> &'a Target { self.target }

    /// Desired velocity before the owner's velocity is subtracted.
    ///
    /// Points at the target with magnitude `distance / max_speed`; negated for COWARD.
    pub fn desired_velocity(&self, mover: &Kinematics) -> Vec2 {
        let Some(sign) = self.sensor.direction() else {
            return zero();
        };
        if mover.max_speed <= 0.0 {
            return zero();
        }
        let offset = self.target.location - self.sensor.location;
        let distance = offset.norm();
        normalize_or_zero(offset) * (sign * distance / mover.max_speed)
    }

    /// Steering force for the owner described by `mover`.
    pub fn force(&self, mover: &Kinematics) -> Vec2 {
        if self.sensor.direction().is_none() {
            return zero();
        }
        steer(self.desired_velocity(mover), mover.velocity, mover.max_steering_force)
    }
}

/// Box overlap test where only `container` is inflated by `sensitivity` times its own size.
///
/// All comparisons are strict, so touching edges do not count.
pub fn is_inside(item: &Bounds, container: &Bounds, sensitivity: f64) -> bool {
    let margin_x = container.width / 2.0 + sensitivity * container.width;
    let margin_y = container.height / 2.0 + sensitivity * container.height;
    item.center.x + item.width / 2.0 > container.center.x - margin_x
        && item.center.x - item.width / 2.0 < container.center.x + margin_x
        && item.center.y + item.height / 2.0 > container.center.y - margin_y
        && item.center.y - item.height / 2.0 < container.center.y + margin_y
}
