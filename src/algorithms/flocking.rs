use crate::math::{Vec2, normalize_or_zero, steer, zero};
use crate::models::animal::Agent;
use crate::sim::AgentView;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SEPARATE_STRENGTH: f64 = 0.3;
pub const DEFAULT_ALIGN_STRENGTH: f64 = 0.2;
pub const DEFAULT_COHESION_STRENGTH: f64 = 0.1;
/// Default desired separation, in agent widths.
pub const DEFAULT_SEPARATION_WIDTHS: f64 = 2.0;
/// Alignment radius, in agent widths. Not configurable.
pub const ALIGN_RADIUS_WIDTHS: f64 = 2.0;
pub const COHESION_RADIUS: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlockParams {
    /// Neighbors closer than this push the agent away.
    pub desired_separation: f64,
    pub separate_strength: f64,
    pub align_strength: f64,
    pub cohesion_strength: f64,
}

impl FlockParams {
    /// Defaults for an agent `width` wide.
    pub fn for_width(width: f64) -> Self {
        Self {
            desired_separation: width * DEFAULT_SEPARATION_WIDTHS,
            separate_strength: DEFAULT_SEPARATE_STRENGTH,
            align_strength: DEFAULT_ALIGN_STRENGTH,
            cohesion_strength: DEFAULT_COHESION_STRENGTH,
        }
    }
}

/// A same-class agent other than the one being steered, with its distance.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor<'a> {
    pub view: &'a AgentView,
    pub distance: f64,
}

/// Same class tag and a different id; everything else in `pool` is ignored.
pub fn neighbors<'a>(
    agent: &'a Agent,
    pool: &'a [AgentView],
) -> impl Iterator<Item = Neighbor<'a>> + 'a {
    let here = agent.location();
    pool.iter()
        .filter(move |v| v.class == agent.class() && v.id != agent.id())
        .map(move |v| Neighbor {
            view: v,
            distance: (here - v.location).norm(),
        })
}

pub fn separate(agent: &Agent, pool: &[AgentView]) -> Vec2 {
    let near: Vec<_> = neighbors(agent, pool).collect();
    separate_from(agent, &near)
}

pub fn align(agent: &Agent, pool: &[AgentView]) -> Vec2 {
    let near: Vec<_> = neighbors(agent, pool).collect();
    align_with(agent, &near)
}

pub fn cohesion(agent: &Agent, pool: &[AgentView]) -> Vec2 {
    let near: Vec<_> = neighbors(agent, pool).collect();
    cohere_with(agent, &near)
}

/// Weighted sum of separation, alignment and cohesion.
///
/// Distances are computed once; each rule then applies its own radius.
pub fn flock(agent: &Agent, pool: &[AgentView]) -> Vec2 {
    let near: Vec<_> = neighbors(agent, pool).collect();
    let params = agent.flock_params();
    separate_from(agent, &near) * params.separate_strength
        + align_with(agent, &near) * params.align_strength
        + cohere_with(agent, &near) * params.cohesion_strength
}

fn separate_from(agent: &Agent, near: &[Neighbor<'_>]) -> Vec2 {
    let radius = agent.flock_params().desired_separation;
    let here = agent.location();
    let mut sum = zero();
    let mut count = 0usize;
    for n in near.iter().filter(|n| n.distance > 0.0 && n.distance < radius) {
        sum += normalize_or_zero(here - n.view.location) / n.distance;
        count += 1;
    }
    if count == 0 {
        return zero();
    }
    toward(agent, sum / count as f64)
}

fn align_with(agent: &Agent, near: &[Neighbor<'_>]) -> Vec2 {
    let radius = agent.width() * ALIGN_RADIUS_WIDTHS;
    let mut sum = zero();
    let mut count = 0usize;
    for n in near.iter().filter(|n| n.distance > 0.0 && n.distance < radius) {
        sum += n.view.velocity;
        count += 1;
    }
    if count == 0 {
        return zero();
    }
    toward(agent, sum / count as f64)
}

fn cohere_with(agent: &Agent, near: &[Neighbor<'_>]) -> Vec2 {
    let mut sum = zero();
    let mut count = 0usize;
    for n in near.iter().filter(|n| n.distance > 0.0 && n.distance < COHESION_RADIUS) {
        sum += n.view.location;
        count += 1;
    }
    if count == 0 {
        return zero();
    }
    toward(agent, sum / count as f64 - agent.location())
}

/// Steer at full speed along `direction`.
fn toward(agent: &Agent, direction: Vec2) -> Vec2 {
    let k = agent.kinematics();
    steer(normalize_or_zero(direction) * k.max_speed, k.velocity, k.max_steering_force)
}
