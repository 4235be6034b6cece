use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// Axis-aligned rectangle on the XY plane.
///
/// Used for cell bounds and for the camera-relative view footprint. Edges are
/// inclusive, so two rectangles that share an edge intersect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb2 {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Square of side `width` centered on the planar part of `center`.
    pub fn from_center(center: Vec3, width: f32) -> Self {
        let half = Vec2::splat(width * 0.5);
        let c = center.truncate();
        Self::new(c - half, c + half)
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn length(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Offset by the planar part of `position`.
    pub fn translate(&self, position: Vec3) -> Self {
        let offset = position.truncate();
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Grow every edge outward by `distance`.
    pub fn expand(&self, distance: f32) -> Self {
        let d = Vec2::splat(distance);
        Self::new(self.min - d, self.max + d)
    }

    /// Bounding rectangle of this rectangle rotated by `angle` radians about
    /// the world Z axis through the origin.
    pub fn rotated_z(&self, angle: f32) -> Self {
        let rotation = Vec2::from_angle(angle);
        let corners = [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ];
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for corner in corners {
            let p = rotation.rotate(corner);
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }

    pub fn intersects(&self, other: &Aabb2) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

/// Wrap an angle in radians into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-2
    }

    #[test]
    fn from_center_spans_width() {
        let r = Aabb2::from_center(Vec3::new(600.0, 600.0, 0.0), 4000.0);
        assert_eq!(r.min, Vec2::new(-1400.0, -1400.0));
        assert_eq!(r.max, Vec2::new(2600.0, 2600.0));
        assert_eq!(r.width(), 4000.0);
        assert_eq!(r.length(), 4000.0);
    }

    #[test]
    fn translate_then_expand() {
        let r = Aabb2::from_center(Vec3::ZERO, 10.0)
            .translate(Vec3::new(100.0, -50.0, 9.0))
            .expand(5.0);
        assert_eq!(r.min, Vec2::new(90.0, -60.0));
        assert_eq!(r.max, Vec2::new(110.0, -40.0));
    }

    #[test]
    fn quarter_turn_keeps_centered_square() {
        let r = Aabb2::from_center(Vec3::ZERO, 10.0);
        let turned = r.rotated_z(PI / 2.0);
        assert!(approx(turned.min.x, -5.0) && approx(turned.max.y, 5.0));
    }

    #[test]
    fn eighth_turn_grows_bounds() {
        let r = Aabb2::from_center(Vec3::ZERO, 10.0);
        let turned = r.rotated_z(PI / 4.0);
        let half_diagonal = 5.0 * 2.0_f32.sqrt();
        assert!(approx(turned.max.x, half_diagonal));
        assert!(approx(turned.min.y, -half_diagonal));
    }

    #[test]
    fn rotation_moves_offset_center() {
        let r = Aabb2::from_center(Vec3::new(10.0, 0.0, 0.0), 2.0);
        let turned = r.rotated_z(PI);
        assert!(approx(turned.center().x, -10.0));
        assert!(approx(turned.center().y, 0.0));
    }

    #[test]
    fn shared_edge_intersects() {
        let a = Aabb2::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let b = Aabb2::new(Vec2::new(10.0, 0.0), Vec2::new(20.0, 10.0));
        let c = Aabb2::new(Vec2::new(10.5, 0.0), Vec2::new(20.0, 10.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn contains_point_ignores_height() {
        let a = Aabb2::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        assert!(a.contains_point(Vec3::new(5.0, 5.0, -300.0)));
        assert!(!a.contains_point(Vec3::new(11.0, 5.0, 0.0)));
    }

    #[test]
    fn wrap_angle_range() {
        assert!(approx(wrap_angle(3.0 * PI), PI));
        assert!(approx(wrap_angle(-PI), PI));
        assert!(approx(wrap_angle(PI / 2.0 + TAU), PI / 2.0));
        assert!(approx(wrap_angle(0.0), 0.0));
    }
}
