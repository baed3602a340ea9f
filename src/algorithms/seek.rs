use crate::math::{Vec2, normalize_or_zero, steer};
use crate::models::animal::Kinematics;

/// Full-speed seek toward `target`, clamped to the mover's steering force.
pub fn seek(mover: &Kinematics, target: Vec2) -> Vec2 {
    let desired = normalize_or_zero(target - mover.location) * mover.max_speed;
    steer(desired, mover.velocity, mover.max_steering_force)
}
