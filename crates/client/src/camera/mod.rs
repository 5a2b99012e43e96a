// Camera system - zoom easing, pointer parallax, bob and shake
//
// Zoom eases toward its target by a fixed fraction of the remaining distance
// each frame (critically damped, not linear):
//   zoom += (target - zoom) * 0.1
// Wheel input moves the target in discrete ±15 % steps, clamped to
// [MIN_ZOOM, MAX_ZOOM]. Shake decays per tick, not per unit time - the loop
// runs at a near-constant display rate.

use glam::Vec2;

use crate::utils;

/// Pixel size of one world cell at zoom 1.
pub const CELL_SIZE: f32 = 24.0;

pub const MIN_ZOOM: f32 = 0.4;
pub const MAX_ZOOM: f32 = 3.0;
pub const ZOOM_STEP: f32 = 1.15;
const ZOOM_EASE: f32 = 0.1;
const MOUSE_PAN_FACTOR: f32 = 0.04;
const BOB_AMPLITUDE: f32 = 4.0;
const SHAKE_DECAY_PER_TICK: f32 = 0.35;

pub struct Camera {
    pub zoom: f32,
    pub target_zoom: f32,
    /// Screen-space offset applied to every world-derived draw this frame.
    pub offset: Vec2,
    pub shake_magnitude: f32,
    /// Pointer position in screen px, fed by the mousemove handler.
    pub pointer: Vec2,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            zoom: 1.0,
            target_zoom: 1.0,
            offset: Vec2::ZERO,
            shake_magnitude: 0.0,
            pointer: Vec2::ZERO,
        }
    }

    /// One discrete zoom-in step (wheel up).
    pub fn zoom_in(&mut self) {
        self.target_zoom = (self.target_zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    /// One discrete zoom-out step (wheel down).
    pub fn zoom_out(&mut self) {
        self.target_zoom = (self.target_zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    /// Kick the shake up to at least `magnitude` (px at zoom 1).
    pub fn add_shake(&mut self, magnitude: f32) {
        self.shake_magnitude = self.shake_magnitude.max(magnitude);
    }

    /// Called once per animation frame before any drawing. `focus_world` is
    /// the local entity's cell position; without one (pre-welcome, entity
    /// missing from the snapshot) the previous offset is kept so the view
    /// does not snap.
    pub fn update(&mut self, focus_world: Option<Vec2>, screen: Vec2, time_seconds: f64) {
        self.zoom = utils::lerp(self.zoom, self.target_zoom, ZOOM_EASE);

        let Some(focus) = focus_world else {
            return;
        };
        let focus_px = (focus * CELL_SIZE + Vec2::splat(CELL_SIZE / 2.0)) * self.zoom;

        let pan = (self.pointer - screen / 2.0) * MOUSE_PAN_FACTOR;
        let t = time_seconds as f32;
        let bob = Vec2::new((t * 0.7).sin(), (t * 0.8).cos()) * BOB_AMPLITUDE;

        let mut offset = screen / 2.0 - focus_px - pan + bob;
        if self.shake_magnitude > 0.0 {
            offset.x += utils::random_signed() * self.shake_magnitude * self.zoom;
            offset.y += utils::random_signed() * self.shake_magnitude * self.zoom;
            self.shake_magnitude = (self.shake_magnitude - SHAKE_DECAY_PER_TICK).max(0.0);
        }
        self.offset = offset;
    }

    /// World cell coordinates → screen px (cell centre).
    #[inline]
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world * CELL_SIZE + Vec2::splat(CELL_SIZE / 2.0)) * self.zoom + self.offset
    }

    /// Screen px → world cell coordinates.
    #[inline]
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        ((screen - self.offset) / self.zoom - Vec2::splat(CELL_SIZE / 2.0)) / CELL_SIZE
    }

    /// Pixel size of one cell at the current zoom.
    #[inline]
    pub fn scaled_cell(&self) -> f32 {
        CELL_SIZE * self.zoom
    }

    /// True when a screen point lies outside the viewport by more than
    /// `margin` px - the shared culling check for expensive draws.
    #[inline]
    pub fn is_offscreen(&self, screen_pos: Vec2, screen: Vec2, margin: f32) -> bool {
        screen_pos.x < -margin
            || screen_pos.x > screen.x + margin
            || screen_pos.y < -margin
            || screen_pos.y > screen.y + margin
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_never_leaves_bounds() {
        let mut camera = Camera::new();
        for _ in 0..100 {
            camera.zoom_in();
        }
        assert!(camera.target_zoom <= MAX_ZOOM);
        for _ in 0..200 {
            camera.zoom_out();
        }
        assert!(camera.target_zoom >= MIN_ZOOM);
        // Interleaved input stays clamped too.
        for i in 0..500 {
            if i % 3 == 0 {
                camera.zoom_out();
            } else {
                camera.zoom_in();
            }
            assert!((MIN_ZOOM..=MAX_ZOOM).contains(&camera.target_zoom));
        }
    }

    #[test]
    fn zoom_eases_toward_target() {
        let mut camera = Camera::new();
        camera.target_zoom = 2.0;
        let mut previous_gap = (camera.target_zoom - camera.zoom).abs();
        for _ in 0..200 {
            camera.update(None, Vec2::new(800.0, 600.0), 0.0);
            let gap = (camera.target_zoom - camera.zoom).abs();
            assert!(gap <= previous_gap);
            previous_gap = gap;
        }
        assert!(previous_gap < 0.001);
    }

    #[test]
    fn screen_world_roundtrip() {
        let mut camera = Camera::new();
        camera.zoom = 1.7;
        camera.offset = Vec2::new(123.0, -45.0);
        let world = Vec2::new(250.0, 130.5);
        let roundtrip = camera.screen_to_world(camera.world_to_screen(world));
        assert!((roundtrip - world).length() < 1e-3);
    }

    #[test]
    fn shake_decays_to_zero() {
        let mut camera = Camera::new();
        camera.add_shake(3.0);
        for _ in 0..20 {
            camera.update(Some(Vec2::ZERO), Vec2::new(800.0, 600.0), 0.0);
        }
        assert_eq!(camera.shake_magnitude, 0.0);
    }

    #[test]
    fn add_shake_keeps_the_larger_magnitude() {
        let mut camera = Camera::new();
        camera.add_shake(5.0);
        camera.add_shake(2.0);
        assert_eq!(camera.shake_magnitude, 5.0);
    }
}
