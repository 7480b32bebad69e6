use glam::Vec2;

/// Bounding box of the tracked container, in client-space pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    /// Map absolute client coordinates into [-1, 1] on both axes,
    /// centered on the box. Coordinates outside the box clamp.
    pub fn normalized(&self, x: f32, y: f32) -> Vec2 {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Vec2::ZERO;
        }
        let nx = ((x - self.left) / self.width - 0.5) * 2.0;
        let ny = ((y - self.top) / self.height - 0.5) * 2.0;
        Vec2::new(nx, ny).clamp(Vec2::splat(-1.0), Vec2::splat(1.0))
    }
}

/// Visual transform pushed to the container every frame.
/// Rotation in small-angle degrees, translation in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub rotate_x_deg: f32,
    pub rotate_y_deg: f32,
    pub scale: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        rotate_x_deg: 0.0,
        rotate_y_deg: 0.0,
        scale: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
    };
}

impl Default for Transform {
    fn default() -> Self {
        Transform::IDENTITY
    }
}

/// Outbound surface of the tracked container: the frame loop reads its
/// bounds for pointer normalization and writes a transform to it.
pub trait Stage {
    fn bounds(&self) -> Rect;
    fn apply_transform(&mut self, transform: &Transform);
}

/// In-memory stage for the preview binary and tests — remembers the
/// last transform written and how many writes happened.
#[derive(Debug)]
pub struct RecordingStage {
    bounds: Rect,
    pub last: Transform,
    pub writes: usize,
}

impl RecordingStage {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            last: Transform::IDENTITY,
            writes: 0,
        }
    }
}

impl Stage for RecordingStage {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn apply_transform(&mut self, transform: &Transform) {
        self.last = *transform;
        self.writes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_center_is_zero() {
        let r = Rect::new(0.0, 0.0, 200.0, 100.0);
        let p = r.normalized(100.0, 50.0);
        assert!(p.x.abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
    }

    #[test]
    fn normalized_corners_hit_unit_range() {
        let r = Rect::new(10.0, 20.0, 200.0, 100.0);
        let tl = r.normalized(10.0, 20.0);
        let br = r.normalized(210.0, 120.0);
        assert_eq!(tl, Vec2::new(-1.0, -1.0));
        assert_eq!(br, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn normalized_clamps_outside_box() {
        let r = Rect::new(0.0, 0.0, 100.0, 100.0);
        let p = r.normalized(-500.0, 900.0);
        assert_eq!(p, Vec2::new(-1.0, 1.0));
    }

    #[test]
    fn degenerate_rect_yields_zero() {
        let r = Rect::new(0.0, 0.0, 0.0, 100.0);
        assert_eq!(r.normalized(50.0, 50.0), Vec2::ZERO);
    }

    #[test]
    fn recording_stage_remembers_last_write() {
        let mut stage = RecordingStage::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let t = Transform {
            rotate_x_deg: 1.0,
            ..Transform::IDENTITY
        };
        stage.apply_transform(&t);
        stage.apply_transform(&Transform::IDENTITY);
        assert_eq!(stage.writes, 2);
        assert_eq!(stage.last, Transform::IDENTITY);
    }
}
