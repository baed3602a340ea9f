use crate::error::{PastureError, Result};
use crate::math::{Bounds, Vec2};
use crate::models::animal::{Agent, AgentConfig, Kinematics};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SensorId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sensor#{}", self.0)
    }
}

/// Hands out ids from one sequence shared by agents and sensors.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn agent(&mut self) -> AgentId {
        AgentId(self.bump())
    }

    pub fn sensor(&mut self) -> SensorId {
        SensorId(self.bump())
    }

    fn bump(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

/// Read-only copy of an agent as it stood at the start of the tick.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentView {
    pub id: AgentId,
    pub class: String,
    pub location: Vec2,
    pub velocity: Vec2,
    pub width: f64,
    pub height: f64,
}

impl AgentView {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.location, self.width, self.height)
    }
}

/// Frozen per-tick view of every live agent, grouped by class tag.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    by_class: HashMap<String, Vec<AgentView>>,
    pointer: Option<Vec2>,
}

impl Snapshot {
    pub fn from_views(views: impl IntoIterator<Item = AgentView>, pointer: Option<Vec2>) -> Self {
        let mut by_class: HashMap<String, Vec<AgentView>> = HashMap::new();
        for view in views {
            by_class.entry(view.class.clone()).or_default().push(view);
        }
        Self { by_class, pointer }
    }

    /// Agents tagged `class`, in spawn order. Unknown classes give an empty slice.
    pub fn agents_by_class(&self, class: &str) -> &[AgentView] {
        self.by_class.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, id: AgentId) -> Option<&AgentView> {
        self.by_class.values().flatten().find(|v| v.id == id)
    }

    /// Pointer location for agents that follow the mouse.
    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    pub fn len(&self) -> usize {
        self.by_class.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// World mutation requested from a hook, applied once the tick has integrated.
#[derive(Debug, Clone)]
pub enum Command {
    Destroy(AgentId),
    Spawn(Box<AgentConfig>),
    /// Destroy `prey` and spawn `spawn`, only if `prey` is still alive.
    Consume { prey: AgentId, spawn: Box<AgentConfig> },
}

#[derive(Debug, Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    pub fn destroy(&mut self, id: AgentId) {
        self.queue.push(Command::Destroy(id));
    }

    pub fn spawn(&mut self, config: AgentConfig) {
        self.queue.push(Command::Spawn(Box::new(config)));
    }

    pub fn consume(&mut self, prey: AgentId, spawn: AgentConfig) {
        self.queue.push(Command::Consume { prey, spawn: Box::new(spawn) });
    }

    pub fn extend(&mut self, other: Commands) {
        self.queue.extend(other.queue);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.queue.iter()
    }
}

impl IntoIterator for Commands {
    type Item = Command;
    type IntoIter = std::vec::IntoIter<Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.queue.into_iter()
    }
}

pub const DEFAULT_WORLD_WIDTH: f64 = 800.0;
pub const DEFAULT_WORLD_HEIGHT: f64 = 600.0;

/// World rectangle from (0, 0) to (width, height).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub width: f64,
    pub height: f64,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            width: DEFAULT_WORLD_WIDTH,
            height: DEFAULT_WORLD_HEIGHT,
        }
    }
}

impl WorldBounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both sides must be positive and finite.
    pub fn validate(&self) -> Result<()> {
        let ok = |side: f64| side.is_finite() && side > 0.0;
        if ok(self.width) && ok(self.height) {
            Ok(())
        } else {
            Err(PastureError::InvalidConfig(format!(
                "field must have a positive size, got {}x{}",
                self.width, self.height
            )))
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Leaving one side re-enters from the opposite one.
    pub fn wrap(&self, location: &mut Vec2) {
        if location.x > self.width {
            location.x = 0.0;
        } else if location.x < 0.0 {
            location.x = self.width;
        }
        if location.y > self.height {
            location.y = 0.0;
        } else if location.y < 0.0 {
            location.y = self.height;
        }
    }

    /// Keep a `width` x `height` body inside, reflecting velocity scaled by `bounciness`.
    pub fn bounce(&self, k: &mut Kinematics, width: f64, height: f64, bounciness: f64) {
        let (hw, hh) = (width / 2.0, height / 2.0);
        if k.location.x + hw > self.width {
            k.location.x = self.width - hw;
            k.velocity.x *= -bounciness;
        } else if k.location.x - hw < 0.0 {
            k.location.x = hw;
            k.velocity.x *= -bounciness;
        }
        if k.location.y + hh > self.height {
            k.location.y = self.height - hh;
            k.velocity.y *= -bounciness;
        } else if k.location.y - hh < 0.0 {
            k.location.y = hh;
            k.velocity.y *= -bounciness;
        }
    }
}

/// Registry of live agents plus the tick driver.
///
/// A tick freezes a snapshot, lets every agent perceive and accumulate forces against it,
/// integrates everyone, then applies the commands hooks queued.
#[derive(Debug)]
pub struct World {
    agents: Vec<Agent>,
    bounds: WorldBounds,
    ids: IdAllocator,
    pointer: Option<Vec2>,
    ticks: u64,
}

impl World {
    pub fn new(bounds: WorldBounds) -> Self {
        Self {
            agents: Vec::new(),
            bounds,
            ids: IdAllocator::default(),
            pointer: None,
            ticks: 0,
        }
    }

    pub fn len(&self) -> usize { self.agents.len() }
    pub fn is_empty(&self) -> bool { self.agents.is_empty() }
    pub fn bounds(&self) -> &WorldBounds { &self.bounds }
    pub fn ticks(&self) -> u64 { self.ticks }
    pub fn agents(&self) -> &[Agent] { &self.agents }
    pub fn pointer(&self) -> Option<Vec2> { self.pointer }
    pub fn set_pointer(&mut self, pointer: Option<Vec2>) { self.pointer = pointer; }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id() == id)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id() == id)
    }

    pub fn agents_by_class<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a Agent> + 'a {
        self.agents.iter().filter(move |a| a.class() == class)
    }

    pub fn count_of(&self, class: &str) -> usize {
        self.agents_by_class(class).count()
    }

    /// Validate `config` and add the agent with its sensors.
    pub fn spawn(&mut self, config: AgentConfig) -> Result<AgentId> {
        config.validate()?;
        let agent = Agent::new(config, &mut self.ids, self.bounds.center());
        let id = agent.id();
        log::debug!(
            "spawned {} '{}' at ({:.1}, {:.1}) with {} sensor(s)",
            id,
            agent.class(),
            agent.location().x,
            agent.location().y,
            agent.sensors().len()
        );
        self.agents.push(agent);
        Ok(id)
    }

    /// Remove an agent; its sensors go with it.
    pub fn destroy(&mut self, id: AgentId) -> Option<Agent> {
        let index = self.agents.iter().position(|a| a.id() == id)?;
        let agent = self.agents.remove(index);
        log::debug!("destroyed {} '{}' and {} sensor(s)", id, agent.class(), agent.sensors().len());
        Some(agent)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_views(self.agents.iter().map(Agent::view), self.pointer)
    }

    pub fn tick(&mut self) {
        let snapshot = self.snapshot();
        let mut commands = self.steer_all(&snapshot);
        for agent in &mut self.agents {
            agent.finish_step(&self.bounds, &snapshot, &mut commands);
        }
        self.apply(commands);
        self.ticks += 1;
    }

    #[cfg(not(feature = "parallel"))]
    fn steer_all(&mut self, snapshot: &Snapshot) -> Commands {
        let mut commands = Commands::default();
        for agent in &mut self.agents {
            agent.step(snapshot, &mut commands);
        }
        commands
    }

    #[cfg(feature = "parallel")]
    fn steer_all(&mut self, snapshot: &Snapshot) -> Commands {
        use rayon::prelude::*;
        let queued: Vec<Commands> = self
            .agents
            .par_iter_mut()
            .map(|agent| {
                let mut local = Commands::default();
                agent.step(snapshot, &mut local);
                local
            })
            .collect();
        let mut commands = Commands::default();
        for local in queued {
            commands.extend(local);
        }
        commands
    }

    fn apply(&mut self, commands: Commands) {
        for command in commands {
            match command {
                Command::Destroy(id) => {
                    self.destroy(id);
                }
                Command::Spawn(config) => self.spawn_queued(*config),
                Command::Consume { prey, spawn } => {
                    if self.destroy(prey).is_some() {
                        log::info!("{} consumed; spawning '{}'", prey, spawn.name);
                        self.spawn_queued(*spawn);
                    } else {
                        log::debug!("{} already gone, nothing to consume", prey);
                    }
                }
            }
        }
    }

    fn spawn_queued(&mut self, config: AgentConfig) {
        if let Err(e) = self.spawn(config) {
            log::warn!("dropped queued spawn: {}", e);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldBounds::default())
    }
}
