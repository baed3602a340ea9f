use nalgebra::Vector2;

/// 2D vector used for every location, velocity and force in the simulation.
pub type Vec2 = Vector2<f64>;

const ZERO_EPS: f64 = 1.0e-12;

#[inline]
pub fn zero() -> Vec2 {
    Vec2::new(0.0, 0.0)
}

/// Unit vector in the direction of `v`, or the zero vector when `v` has no direction.
pub fn normalize_or_zero(v: Vec2) -> Vec2 {
    v.try_normalize(ZERO_EPS).unwrap_or_else(zero)
}

/// Clamp the magnitude of `v` to `max`.
pub fn limit(v: Vec2, max: f64) -> Vec2 {
    let mag = v.norm();
    if mag > max && mag > 0.0 {
        v / mag * max.max(0.0)
    } else {
        v
    }
}

/// Reynolds steering: desired velocity minus current velocity, clamped to `max_force`.
pub fn steer(desired: Vec2, velocity: Vec2, max_force: f64) -> Vec2 {
    limit(desired - velocity, max_force)
}

pub fn degrees_to_radians(deg: f64) -> f64 {
    deg.to_radians()
}

pub fn radians_to_degrees(rad: f64) -> f64 {
    rad.to_degrees()
}

/// Offset of length `r` at `angle_deg` degrees from the +x axis.
pub fn polar(r: f64, angle_deg: f64) -> Vec2 {
    let theta = degrees_to_radians(angle_deg);
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Axis-aligned box centered on `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub center: Vec2,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(center: Vec2, width: f64, height: f64) -> Self {
        Self { center, width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normalize_of_zero_is_zero() {
        assert_eq!(normalize_or_zero(zero()), zero());
    }

    #[test]
    fn limit_keeps_short_vectors() {
        let v = Vec2::new(1.0, 1.0);
        assert_eq!(limit(v, 5.0), v);
    }

    #[test]
    fn limit_clamps_long_vectors() {
        let v = limit(Vec2::new(30.0, 40.0), 5.0);
        assert_relative_eq!(v.norm(), 5.0, epsilon = 1e-12);
        assert_relative_eq!(v.x, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn polar_follows_degrees() {
        let p = polar(2.0, 90.0);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-12);
        let back = polar(-20.0, 0.0);
        assert_relative_eq!(back.x, -20.0, epsilon = 1e-12);
    }
}
