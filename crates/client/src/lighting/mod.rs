// Fog-of-war lighting compositor
//
// Builds an occlusion mask once per frame at half resolution: start from an
// opaque background-colored surface, then carve visibility out of it with
// destination-out radial gradients - faint star ambience, the player's own
// vision radius, and per-type emissive light from other entities. The mask
// is drawn back over the scene scaled up, with a plain source-over blend.
// Only composed while the local entity is alive; death reveals the world to
// the death overlay instead.

use glam::Vec2;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use crate::camera::Camera;
use crate::render::Star;
use crate::theme::Theme;
use crate::world::{EntityClass, World};

/// Internal mask resolution relative to the screen.
pub const LIGHT_SCALE: f64 = 0.5;
/// Radius of the player's own vision disc, px at zoom 1.
pub const PLAYER_VIEW_RADIUS: f32 = 150.0;
const STAR_GLOW_ALPHA: f64 = 0.6;
const ENTITY_LIGHT_CULL_MARGIN: f32 = 150.0;

/// Emissive light of one entity class: (radius px at zoom 1, intensity).
/// Inert rock barely glows; the boss lights up a quarter of the screen.
pub fn light_profile(class: EntityClass) -> (f32, f32) {
    match class {
        EntityClass::Boss => (250.0, 0.9),
        EntityClass::Projectile => (70.0, 0.8),
        EntityClass::Vessel => (120.0, 0.7),
        EntityClass::Ore => (60.0, 0.4),
        EntityClass::DataNode => (100.0, 0.75),
        EntityClass::Wormhole => (140.0, 0.6),
        EntityClass::Station => (160.0, 0.65),
        EntityClass::Meteorite => (20.0, 0.05),
        EntityClass::Unknown => (0.0, 0.0),
    }
}

pub struct LightMask {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl LightMask {
    pub fn new(document: &Document) -> Result<Self, JsValue> {
        let canvas = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()?;
        let ctx = canvas
            .get_context("2d")?
            .ok_or("Failed to get light mask 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }

    /// Match the mask buffer to the current screen size.
    pub fn resize(&self, width: u32, height: u32) {
        self.canvas.set_width((width as f64 * LIGHT_SCALE) as u32);
        self.canvas.set_height((height as f64 * LIGHT_SCALE) as u32);
    }

    /// Build this frame's mask and paint it over the scene.
    pub fn compose(
        &self,
        main_ctx: &CanvasRenderingContext2d,
        world: &World,
        camera: &Camera,
        stars: &[Star],
        theme: &Theme,
        screen: Vec2,
    ) -> Result<(), JsValue> {
        let ctx = &self.ctx;
        ctx.save();
        ctx.scale(LIGHT_SCALE, LIGHT_SCALE)?;

        ctx.clear_rect(0.0, 0.0, screen.x as f64, screen.y as f64);
        ctx.set_fill_style_str(theme.bg);
        ctx.fill_rect(0.0, 0.0, screen.x as f64, screen.y as f64);

        ctx.set_global_composite_operation("destination-out")?;

        // Faint ambience around each decorative star.
        for star in stars {
            let pos = Vec2::new(star.x, star.y) * camera.scaled_cell() + camera.offset;
            let radius = star.glow * 2.5 * camera.zoom;
            if camera.is_offscreen(pos, screen, radius) {
                continue;
            }
            erase_disc(ctx, pos, 0.0, radius, &[(0.0, STAR_GLOW_ALPHA), (1.0, 0.0)])?;
        }

        // The player's own vision reveals the surroundings fully.
        if let Some(me) = world.local() {
            let pos = camera.world_to_screen(me.position.to_vec2());
            let radius = PLAYER_VIEW_RADIUS * camera.zoom;
            erase_disc(
                ctx,
                pos,
                (10.0 * camera.zoom) as f64,
                radius,
                &[(0.0, 1.0), (0.5, 0.5), (1.0, 0.0)],
            )?;
        }

        // Per-entity emissive light.
        for entity in world.iter() {
            let (radius, intensity) = light_profile(EntityClass::of(entity));
            if radius <= 0.0 {
                continue;
            }
            let pos = camera.world_to_screen(entity.position.to_vec2());
            if camera.is_offscreen(pos, screen, ENTITY_LIGHT_CULL_MARGIN * camera.zoom) {
                continue;
            }
            let scaled = radius * camera.zoom;
            erase_disc(ctx, pos, 0.0, scaled, &[(0.0, intensity as f64), (1.0, 0.0)])?;
        }

        ctx.restore();

        main_ctx.set_global_composite_operation("source-over")?;
        main_ctx.draw_image_with_html_canvas_element_and_dw_and_dh(
            &self.canvas,
            0.0,
            0.0,
            screen.x as f64,
            screen.y as f64,
        )?;
        Ok(())
    }
}

/// Punch one radial-falloff hole into the mask.
fn erase_disc(
    ctx: &CanvasRenderingContext2d,
    center: Vec2,
    inner_radius: f64,
    radius: f32,
    stops: &[(f64, f64)],
) -> Result<(), JsValue> {
    let (cx, cy, r) = (center.x as f64, center.y as f64, radius as f64);
    let gradient = ctx.create_radial_gradient(cx, cy, inner_radius, cx, cy, r)?;
    for (offset, alpha) in stops {
        gradient.add_color_stop(*offset as f32, &format!("rgba(0,0,0,{alpha})"))?;
    }
    ctx.set_fill_style_canvas_gradient(&gradient);
    ctx.begin_path();
    ctx.arc(cx, cy, r, 0.0, std::f64::consts::TAU)?;
    ctx.fill();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::Entity;

    fn class_of(name: &str, hp: Option<f64>) -> EntityClass {
        EntityClass::of(&Entity {
            name: name.into(),
            hp,
            ..Entity::default()
        })
    }

    #[test]
    fn inert_rock_emits_negligible_light() {
        let (radius, intensity) = light_profile(class_of("METEORITE", None));
        assert!(radius <= 20.0);
        assert!(intensity <= 0.05);
    }

    #[test]
    fn boss_outshines_everything() {
        let (boss_r, boss_i) = light_profile(class_of("NULL", None));
        for name in ["PROJECTILE", "METEORITE", "DATA_NODE", "COPPER_ORE", "WORMHOLE", "OUTPOST"] {
            let (r, i) = light_profile(class_of(name, None));
            assert!(boss_r > r, "{name}");
            assert!(boss_i >= i, "{name}");
        }
        let (vessel_r, _) = light_profile(class_of("Rook", Some(5.0)));
        assert!(boss_r > vessel_r);
    }

    #[test]
    fn unclassified_entities_emit_nothing() {
        let (radius, intensity) = light_profile(class_of("MYSTERY", None));
        assert_eq!((radius, intensity), (0.0, 0.0));
    }
}
