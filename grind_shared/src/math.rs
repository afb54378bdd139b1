//! Math types.
//!
//! The scene is 2D; everything here works in screen units.

use serde::{Deserialize, Serialize};

/// 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, to: Self) -> f32 {
        let dx = to.x - self.x;
        let dy = to.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Moves `t` of the way toward `to`, per axis.
    pub fn lerp(self, to: Self, t: f32) -> Self {
        Self::new(linear(self.x, to.x, t), linear(self.y, to.y, t))
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// `from + (to - from) * t`.
pub fn linear(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_closes_fraction_of_gap() {
        assert_eq!(linear(0.0, 100.0, 0.2), 20.0);
        assert_eq!(linear(50.0, 50.0, 0.2), 50.0);
    }

    #[test]
    fn vec2_lerp_midpoint() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(2.0, 4.0);
        assert_eq!(a.lerp(b, 0.5), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn distance_is_euclidean() {
        assert_eq!(Vec2::ZERO.distance(Vec2::new(3.0, 4.0)), 5.0);
    }
}
