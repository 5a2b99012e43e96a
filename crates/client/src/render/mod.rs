// Canvas rendering - grid, starfield, entities, overlays, minimap
//
// The compositing order is fixed; every layer assumes the previous one is
// already painted. Each draw goes through the shared culling check so
// per-frame cost tracks what is actually visible.

use std::cell::RefCell;
use std::collections::HashMap;

use glam::Vec2;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use protocol::Entity;

use crate::camera::{CELL_SIZE, Camera};
use crate::effects::{Beam, Flashes, Particle, ScanRing};
use crate::scanner::Scanner;
use crate::theme::Theme;
use crate::utils;
use crate::world::{EntityClass, World, WORLD_HEIGHT, WORLD_WIDTH};

const STAR_COUNT: usize = 8000;
const STAR_COLORS: &[&str] = &["#58a6ff", "#ffd700", "#bc8cff"];
const STAR_SYMBOLS: &[char] = &['*', '.', '·', '✧'];
const MONO_FONT: &str = "\"Cascadia Code\", \"Courier New\", Courier, monospace";
/// Bounded attempts when nudging scan labels out of each other's way.
const LABEL_NUDGE_ATTEMPTS: usize = 4;

/// Parse a `#rrggbb` color into its channels; white when malformed.
pub fn hex_to_rgb(hex: &str) -> (u8, u8, u8) {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return (255, 255, 255);
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(255);
    (channel(0), channel(2), channel(4))
}

// ---------------------------------------------------------------------------
// Starfield
// ---------------------------------------------------------------------------

/// One decorative background star. Coordinates are world cells; `phase`
/// advances independently for the twinkle animation.
pub struct Star {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: String,
    pub symbol: char,
    pub glow: f32,
    pub phase: f32,
    pub speed: f32,
}

pub struct Starfield {
    stars: Vec<Star>,
}

impl Starfield {
    pub fn new() -> Self {
        Self::with_count(STAR_COUNT)
    }

    pub fn with_count(count: usize) -> Self {
        let mut stars = Vec::with_capacity(count);
        for _ in 0..count {
            let is_white = utils::random() < 0.9;
            let color = if is_white {
                "#ffffff".to_string()
            } else {
                STAR_COLORS[(utils::random() * STAR_COLORS.len() as f32) as usize
                    % STAR_COLORS.len()]
                    .to_string()
            };
            stars.push(Star {
                x: utils::random() * WORLD_WIDTH,
                y: utils::random() * WORLD_HEIGHT,
                size: utils::random() * 2.0 + 1.5,
                color,
                symbol: STAR_SYMBOLS
                    [(utils::random() * STAR_SYMBOLS.len() as f32) as usize % STAR_SYMBOLS.len()],
                glow: utils::random() * 30.0 + 20.0,
                phase: utils::random() * std::f32::consts::TAU,
                speed: utils::random() * 0.15 + 0.05,
            });
        }
        Self { stars }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }
}

// ---------------------------------------------------------------------------
// Sprite cache
// ---------------------------------------------------------------------------

/// Structured sprite cache key. Glow is already quantized (the per-class
/// table only produces a handful of values).
#[derive(Clone, PartialEq, Eq, Hash)]
struct SpriteKey {
    symbol: String,
    color: String,
    glow: u8,
}

/// Glyph glow radius for an entity class; the local vessel burns brighter.
fn glow_for(class: EntityClass, is_self: bool) -> u8 {
    if is_self {
        return 12;
    }
    match class {
        EntityClass::Boss => 25,
        EntityClass::Meteorite => 0,
        EntityClass::Ore => 2,
        EntityClass::Projectile | EntityClass::DataNode => 8,
        _ => 5,
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

pub struct Renderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    sprites: RefCell<HashMap<SpriteKey, HtmlCanvasElement>>,
}

impl Renderer {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or("Failed to get 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            canvas,
            ctx,
            sprites: RefCell::new(HashMap::new()),
        })
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.canvas.width() as f32
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.canvas.height() as f32
    }

    #[inline]
    pub fn screen(&self) -> Vec2 {
        Vec2::new(self.width(), self.height())
    }

    pub fn ctx(&self) -> &CanvasRenderingContext2d {
        &self.ctx
    }

    /// Drop every cached sprite (theme change).
    pub fn invalidate_sprites(&self) {
        self.sprites.borrow_mut().clear();
    }

    #[inline]
    pub fn clear(&self, background: &str) {
        self.ctx.set_fill_style_str(background);
        self.ctx
            .fill_rect(0.0, 0.0, self.width() as f64, self.height() as f64);
    }

    /// Faint background tint under resource-bearing terrain cells.
    pub fn draw_resource_cells(&self, world: &World, camera: &Camera) {
        let cell = camera.scaled_cell();
        let screen = self.screen();
        self.ctx.set_global_alpha(0.15);
        for entity in world.iter() {
            if !EntityClass::of(entity).is_resource_terrain() {
                continue;
            }
            let pos = entity.position.to_vec2() * cell + camera.offset;
            if pos.x < -cell || pos.x > screen.x || pos.y < -cell || pos.y > screen.y {
                continue;
            }
            self.ctx.set_fill_style_str(&entity.color);
            self.ctx
                .fill_rect(pos.x as f64, pos.y as f64, cell as f64, cell as f64);
        }
        self.ctx.set_global_alpha(1.0);
    }

    /// World grid plus the dashed world boundary.
    pub fn draw_grid(&self, camera: &Camera, theme: &Theme) -> Result<(), JsValue> {
        let cell = camera.scaled_cell();
        let screen = self.screen();

        self.ctx.set_stroke_style_str(theme.grid);
        self.ctx.set_line_width(1.0);
        self.ctx.begin_path();

        let start_x = ((-camera.offset.x / cell).floor().max(0.0)) as i32;
        let end_x = (((screen.x - camera.offset.x) / cell).ceil()).min(WORLD_WIDTH) as i32;
        let start_y = ((-camera.offset.y / cell).floor().max(0.0)) as i32;
        let end_y = (((screen.y - camera.offset.y) / cell).ceil()).min(WORLD_HEIGHT) as i32;

        for x in start_x..=end_x {
            let px = (x as f32 * cell + camera.offset.x) as f64;
            self.ctx.move_to(px, (start_y as f32 * cell + camera.offset.y).max(0.0) as f64);
            self.ctx.line_to(px, (end_y as f32 * cell + camera.offset.y).min(screen.y) as f64);
        }
        for y in start_y..=end_y {
            let py = (y as f32 * cell + camera.offset.y) as f64;
            self.ctx.move_to((start_x as f32 * cell + camera.offset.x).max(0.0) as f64, py);
            self.ctx.line_to((end_x as f32 * cell + camera.offset.x).min(screen.x) as f64, py);
        }
        self.ctx.stroke();

        // World boundary, dashed in the accent color.
        self.ctx.set_stroke_style_str(theme.accent);
        self.ctx.set_line_width(2.0);
        let dash = js_sys::Array::of2(
            &JsValue::from_f64((10.0 * camera.zoom) as f64),
            &JsValue::from_f64((5.0 * camera.zoom) as f64),
        );
        self.ctx.set_line_dash(&dash)?;
        self.ctx.stroke_rect(
            camera.offset.x as f64,
            camera.offset.y as f64,
            (WORLD_WIDTH * cell) as f64,
            (WORLD_HEIGHT * cell) as f64,
        );
        self.ctx.set_line_dash(&js_sys::Array::new())?;
        Ok(())
    }

    /// Twinkling background stars. Phases advance here, one step per frame.
    pub fn draw_stars(&self, starfield: &mut Starfield, camera: &Camera) {
        let screen = self.screen();
        let cell = camera.scaled_cell();
        let margin = 20.0 * camera.zoom;

        self.ctx.set_text_align("center");
        self.ctx.set_text_baseline("middle");
        for star in &mut starfield.stars {
            let pos = Vec2::new(star.x, star.y) * cell + camera.offset;
            if pos.x < -margin || pos.x > screen.x + margin || pos.y < -margin || pos.y > screen.y + margin {
                continue;
            }
            star.phase += star.speed;
            let twinkle = star.phase.sin() * 0.2 + 0.8;

            self.ctx.set_global_alpha(twinkle as f64);
            self.ctx.set_fill_style_str(&star.color);
            self.ctx
                .set_font(&format!("{}px {}", (star.size + 3.0) * camera.zoom, MONO_FONT));
            let _ = self.ctx.fill_text(
                &star.symbol.to_string(),
                pos.x as f64,
                pos.y as f64,
            );
        }
        self.ctx.set_global_alpha(1.0);
    }

    /// Faint conduit lines between paired wormhole endpoints. The pairing is
    /// re-resolved through the store every frame; a dangling end just means
    /// no line this frame.
    pub fn draw_wormhole_links(&self, world: &World, camera: &Camera, theme: &Theme) {
        for entity in world.iter() {
            if EntityClass::of(entity) != EntityClass::Wormhole {
                continue;
            }
            let Some(exit) = world.linked(entity) else {
                continue;
            };
            // Each pair carries two linked entities; draw once per pair.
            if exit.id < entity.id {
                continue;
            }
            let from = camera.world_to_screen(entity.position.to_vec2());
            let to = camera.world_to_screen(exit.position.to_vec2());
            self.ctx.set_global_alpha(0.12);
            self.ctx.set_stroke_style_str(theme.success);
            self.ctx.set_line_width(camera.zoom as f64);
            self.ctx.begin_path();
            self.ctx.move_to(from.x as f64, from.y as f64);
            self.ctx.line_to(to.x as f64, to.y as f64);
            self.ctx.stroke();
        }
        self.ctx.set_global_alpha(1.0);
    }

    fn sprite(&self, symbol: &str, color: &str, glow: u8) -> Option<HtmlCanvasElement> {
        let key = SpriteKey {
            symbol: symbol.to_string(),
            color: color.to_string(),
            glow,
        };
        if let Some(sprite) = self.sprites.borrow().get(&key) {
            return Some(sprite.clone());
        }

        let document = web_sys::window()?.document()?;
        let canvas = document
            .create_element("canvas")
            .ok()?
            .dyn_into::<HtmlCanvasElement>()
            .ok()?;
        let size = (CELL_SIZE * 2.0) as u32;
        canvas.set_width(size);
        canvas.set_height(size);
        let ctx = canvas
            .get_context("2d")
            .ok()??
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;

        ctx.set_shadow_blur(glow as f64);
        ctx.set_shadow_color(color);
        ctx.set_fill_style_str(color);
        ctx.set_font(&format!("bold {}px {}", CELL_SIZE - 6.0, MONO_FONT));
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        ctx.fill_text(symbol, size as f64 / 2.0, size as f64 / 2.0).ok()?;

        self.sprites.borrow_mut().insert(key, canvas.clone());
        Some(canvas)
    }

    /// Entities: cached glyph sprite, name/score label, shield and HP bars.
    /// Continuous particle emission (thruster exhaust, projectile trails)
    /// happens here as entities are visited, duty-cycled by frame count.
    pub fn draw_entities(
        &self,
        world: &World,
        camera: &Camera,
        particles: &mut crate::effects::ParticleSystem,
        frame: u64,
        theme: &Theme,
    ) {
        let screen = self.screen();
        let cell = camera.scaled_cell();

        self.ctx.set_text_align("center");
        self.ctx.set_text_baseline("middle");

        for entity in world.iter() {
            // Rebooting entities keep their slot but are not drawn.
            if entity.is_inert() {
                continue;
            }
            let pos = camera.world_to_screen(entity.position.to_vec2());
            if camera.is_offscreen(pos, screen, cell) {
                continue;
            }

            let class = EntityClass::of(entity);
            let is_self = world.local_id() == Some(entity.id.as_str());

            let glow = glow_for(class, is_self);
            if let Some(sprite) = self.sprite(&entity.symbol, &entity.color, glow) {
                let mut size = (CELL_SIZE * 2.0 * camera.zoom) as f64;
                if class == EntityClass::Boss {
                    size *= 1.6;
                }
                let _ = self.ctx.draw_image_with_html_canvas_element_and_dw_and_dh(
                    &sprite,
                    pos.x as f64 - size / 2.0,
                    pos.y as f64 - size / 2.0,
                    size,
                    size,
                );
            }

            // Thruster exhaust for anything combat-capable that is moving.
            if entity.is_combat() {
                if let Some(vel) = entity.velocity() {
                    if vel.length_squared() > 1e-4 && frame % 2 == 0 {
                        particles.spawn_exhaust(entity.position.to_vec2(), &entity.color, vel, 4.0);
                    }
                }
            }
            // Trails behind projectiles, denser duty cycle.
            if class == EntityClass::Projectile {
                if let Some(vel) = entity.velocity() {
                    particles.spawn_trail(entity.position.to_vec2(), &entity.color, vel * 0.1, 3.0);
                }
            }

            if entity.is_combat() {
                self.draw_combat_decorations(entity, pos, camera, theme, is_self);
            }
        }
    }

    fn draw_combat_decorations(
        &self,
        entity: &Entity,
        pos: Vec2,
        camera: &Camera,
        theme: &Theme,
        is_self: bool,
    ) {
        let zoom = camera.zoom;
        let cell = camera.scaled_cell();

        // Name + score above the glyph.
        self.ctx
            .set_font(&format!("{}px {}", 11.0 * zoom.max(0.8), MONO_FONT));
        self.ctx.set_fill_style_str(&entity.color);
        let score = entity.score.unwrap_or(0);
        let label = if is_self {
            format!("YOU ({score})")
        } else {
            format!("{} ({score})", entity.name)
        };
        let _ = self
            .ctx
            .fill_text(&label, pos.x as f64, (pos.y - cell / 2.0 - 8.0 * zoom) as f64);

        let bar_width = 24.0 * zoom;
        let bar_height = 2.0 * zoom.max(0.5);
        let gap = 2.0 * zoom;
        let mut bar_y = pos.y + cell / 2.0 + 4.0 * zoom;

        // Shield bar.
        self.ctx.set_fill_style_str(theme.grid);
        self.ctx.fill_rect(
            (pos.x - bar_width / 2.0) as f64,
            bar_y as f64,
            bar_width as f64,
            bar_height as f64,
        );
        if let Some(shield) = entity.shield.filter(|s| *s > 0.0) {
            let fraction = (shield / entity.max_shield_or_default()).clamp(0.0, 1.0) as f32;
            self.ctx.set_fill_style_str("#bc8cff");
            self.ctx.fill_rect(
                (pos.x - bar_width / 2.0) as f64,
                bar_y as f64,
                (fraction * bar_width) as f64,
                bar_height as f64,
            );
        }
        bar_y += bar_height + gap;

        // HP bar.
        self.ctx.set_fill_style_str(theme.grid);
        self.ctx.fill_rect(
            (pos.x - bar_width / 2.0) as f64,
            bar_y as f64,
            bar_width as f64,
            bar_height as f64,
        );
        let hp = entity.hp.unwrap_or(0.0);
        let fraction = (hp / entity.max_hp_or_default()).clamp(0.0, 1.0) as f32;
        self.ctx
            .set_fill_style_str(if is_self { theme.success } else { theme.danger });
        self.ctx.fill_rect(
            (pos.x - bar_width / 2.0) as f64,
            bar_y as f64,
            (fraction * bar_width) as f64,
            bar_height as f64,
        );
    }

    /// Mining beams, drawn under the fog so the dark swallows distant ones.
    pub fn draw_beams(&self, beams: &[Beam], camera: &Camera) {
        for beam in beams {
            let from = beam.from * camera.zoom + camera.offset;
            let to = beam.to * camera.zoom + camera.offset;
            self.ctx.set_global_alpha((beam.life * 0.8) as f64);
            self.ctx.set_stroke_style_str(&beam.color);
            self.ctx.set_line_width((2.0 * camera.zoom) as f64);
            self.ctx.begin_path();
            self.ctx.move_to(from.x as f64, from.y as f64);
            self.ctx.line_to(to.x as f64, to.y as f64);
            self.ctx.stroke();
        }
        self.ctx.set_global_alpha(1.0);
    }

    /// Scanner rings: the expanding main ring plus a thinner sweep echo.
    pub fn draw_rings(&self, rings: &[ScanRing], camera: &Camera) {
        for ring in rings {
            let pos = ring.pos * camera.zoom + camera.offset;
            let radius = (ring.radius * camera.zoom) as f64;

            self.ctx.set_stroke_style_str(&ring.color);
            self.ctx.set_global_alpha((ring.life * 0.8) as f64);
            self.ctx.set_line_width((3.0 * camera.zoom) as f64);
            self.ctx.begin_path();
            let _ = self
                .ctx
                .arc(pos.x as f64, pos.y as f64, radius, 0.0, std::f64::consts::TAU);
            self.ctx.stroke();

            if ring.radius > 50.0 {
                self.ctx.set_global_alpha((ring.life * 0.4) as f64);
                self.ctx.set_line_width(camera.zoom as f64);
                self.ctx.begin_path();
                let _ = self.ctx.arc(
                    pos.x as f64,
                    pos.y as f64,
                    radius - (20.0 * camera.zoom) as f64,
                    0.0,
                    std::f64::consts::TAU,
                );
                self.ctx.stroke();
            }
        }
        self.ctx.set_global_alpha(1.0);
    }

    /// Particle glyphs. Drawn after the fog so they stay bright in the dark.
    pub fn draw_particles(&self, particles: &[Particle], camera: &Camera) {
        let screen = self.screen();
        for particle in particles {
            let pos = particle.pos * camera.zoom + camera.offset;
            if camera.is_offscreen(pos, screen, 30.0) {
                continue;
            }
            self.ctx.set_global_alpha(particle.life.clamp(0.0, 1.0) as f64);
            self.ctx.set_fill_style_str(&particle.color);
            self.ctx.set_font(&format!(
                "{}px {}",
                (particle.size + 4.0) * camera.zoom,
                MONO_FONT
            ));
            let _ = self
                .ctx
                .fill_text(&particle.symbol.to_string(), pos.x as f64, pos.y as f64);
        }
        self.ctx.set_global_alpha(1.0);
    }

    /// Scanner overlay: per-record outline circle and label, fading in from
    /// `first_seen` and gated by the scanner's own opacity. Labels avoid
    /// each other with bounded vertical nudging.
    pub fn draw_scan_overlay(
        &self,
        scanner: &Scanner,
        world: &World,
        camera: &Camera,
        theme: &Theme,
        now: f64,
    ) -> Result<(), JsValue> {
        let overlay_alpha = scanner.overlay_alpha(now);
        if overlay_alpha <= 0.0 {
            return Ok(());
        }
        let cell = camera.scaled_cell();
        let zoom = camera.zoom;
        let mut placed: Vec<(f32, f32, f32)> = Vec::new(); // (x, y, width)

        for record in scanner.records() {
            // Stale ids (entity despawned since the scan) are skipped.
            let Some(entity) = world.entity(&record.id) else {
                continue;
            };
            if entity.is_inert() {
                continue;
            }
            let pos = camera.world_to_screen(entity.position.to_vec2());
            let elapsed = now - record.first_seen;
            let color = if record.class.is_enemy() {
                theme.danger
            } else {
                theme.accent
            };

            // Outline circle.
            self.ctx.save();
            self.ctx.begin_path();
            let outline = (cell * 1.2 / 2.0) as f64;
            self.ctx
                .arc(pos.x as f64, pos.y as f64, outline, 0.0, std::f64::consts::TAU)?;
            self.ctx.set_stroke_style_str(color);
            self.ctx.set_line_width(2.0);
            let ring_alpha = ((elapsed / 500.0).min(0.8) as f32) * overlay_alpha;
            self.ctx.set_global_alpha(ring_alpha as f64);
            self.ctx.stroke();

            // Label, nudged upward while it overlaps one already placed.
            let text_alpha = ((elapsed / 800.0).min(1.0) as f32) * overlay_alpha;
            self.ctx.set_global_alpha(text_alpha as f64);
            self.ctx
                .set_font(&format!("bold {}px {}", 10.0 * zoom.max(0.8), MONO_FONT));
            self.ctx.set_fill_style_str(color);
            self.ctx.set_text_align("center");

            let label = format!("{} [{:.2} AU]", record.label, record.distance_au);
            let width = self
                .ctx
                .measure_text(&label)
                .map(|m| m.width() as f32)
                .unwrap_or(80.0);
            let mut label_y = pos.y - cell - 15.0 * zoom;
            let line_height = 12.0 * zoom.max(0.8);
            for _ in 0..LABEL_NUDGE_ATTEMPTS {
                let collides = placed.iter().any(|(px, py, pw)| {
                    (label_y - py).abs() < line_height && (pos.x - px).abs() < (width + pw) / 2.0
                });
                if !collides {
                    break;
                }
                label_y -= line_height;
            }
            placed.push((pos.x, label_y, width));
            self.ctx.fill_text(&label, pos.x as f64, label_y as f64)?;
            self.ctx.restore();
        }
        Ok(())
    }

    /// Death overlay: full-screen blackout with a blinking reboot prompt.
    pub fn draw_death_overlay(&self, theme: &Theme, now: f64) {
        let (w, h) = (self.width() as f64, self.height() as f64);
        self.ctx.set_fill_style_str("rgba(0, 0, 0, 0.85)");
        self.ctx.fill_rect(0.0, 0.0, w, h);

        self.ctx.set_text_align("center");
        self.ctx.set_fill_style_str(theme.danger);
        self.ctx.set_font(&format!("bold 30px {MONO_FONT}"));
        let _ = self
            .ctx
            .fill_text("CRITICAL_FAILURE: CONNECTION_LOST", w / 2.0, h / 2.0 - 30.0);

        self.ctx.set_fill_style_str(theme.accent);
        self.ctx.set_font(&format!("14px {MONO_FONT}"));
        let _ = self
            .ctx
            .fill_text("> ATTEMPTING_SECURE_REBOOT...", w / 2.0, h / 2.0 + 20.0);
        if now % 1000.0 < 500.0 {
            self.ctx.set_fill_style_str(theme.fg);
            let _ = self.ctx.fill_text("_", w / 2.0 + 110.0, h / 2.0 + 20.0);
        }
    }

    /// Transient full-screen flashes, each its own tinted overlay.
    pub fn draw_flashes(&self, flashes: &Flashes, theme: &Theme) {
        let (w, h) = (self.width() as f64, self.height() as f64);
        let tint = |alpha: f32, color: &str| {
            if alpha <= 0.0 {
                return;
            }
            let (r, g, b) = hex_to_rgb(color);
            self.ctx
                .set_fill_style_str(&format!("rgba({r},{g},{b},{:.3})", alpha * 0.4));
            self.ctx.fill_rect(0.0, 0.0, w, h);
        };
        tint(flashes.damage, theme.danger);
        tint(flashes.teleport, theme.accent);
        tint(flashes.explosion, theme.warning);
    }

    /// Horizontal slice displacement when a flash spikes hard enough.
    pub fn draw_glitch(&self, level: f32) {
        if level <= 0.0 {
            return;
        }
        let (w, h) = (self.width() as f64, self.height() as f64);
        let slices = (level * 12.0) as usize + 2;
        for _ in 0..slices {
            let y = (utils::random() as f64) * h;
            let slice_h = (utils::random() as f64) * 26.0 + 4.0;
            let dx = (utils::random_signed() * level * 40.0) as f64;
            let _ = self
                .ctx
                .draw_image_with_html_canvas_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                    &self.canvas,
                    0.0,
                    y,
                    w,
                    slice_h,
                    dx,
                    y,
                    w,
                    slice_h,
                );
        }
    }
}

// ---------------------------------------------------------------------------
// Minimap - rendered on its own <canvas>, overlaid in a HUD corner.
// ---------------------------------------------------------------------------

pub struct Minimap {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl Minimap {
    pub fn new() -> Result<Self, JsValue> {
        let document = web_sys::window()
            .ok_or("No window")?
            .document()
            .ok_or("No document")?;
        let canvas = document
            .get_element_by_id("minimapCanvas")
            .ok_or("minimapCanvas not found")?
            .dyn_into::<HtmlCanvasElement>()?;
        let ctx = canvas
            .get_context("2d")?
            .ok_or("Failed to get minimap 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }

    /// Project world positions onto the fixed-scale panel. Only drawn once
    /// the local entity exists.
    pub fn draw(&self, world: &World, theme: &Theme, now: f64) {
        let Some(me) = world.local() else {
            return;
        };

        // Track the CSS size of the panel.
        let css_w = self.canvas.client_width();
        let css_h = self.canvas.client_height();
        if css_w > 0 && css_h > 0 {
            self.canvas.set_width(css_w as u32);
            self.canvas.set_height(css_h as u32);
        }
        let w = self.canvas.width() as f64;
        let h = self.canvas.height() as f64;

        self.ctx.clear_rect(0.0, 0.0, w, h);
        self.ctx.set_stroke_style_str(theme.border);
        self.ctx.set_line_width(1.0);
        self.ctx.stroke_rect(0.0, 0.0, w, h);

        let scale_x = w / WORLD_WIDTH as f64;
        let scale_y = h / WORLD_HEIGHT as f64;
        let local_id = world.local_id();

        for entity in world.iter() {
            let mx = entity.position.x * scale_x;
            let my = entity.position.y * scale_y;
            match EntityClass::of(entity) {
                EntityClass::Boss => {
                    self.ctx.set_fill_style_str("#ff4500");
                    self.ctx.begin_path();
                    let _ = self.ctx.arc(mx, my, 4.0, 0.0, std::f64::consts::TAU);
                    self.ctx.fill();
                }
                EntityClass::Vessel if local_id != Some(entity.id.as_str()) => {
                    self.ctx.set_fill_style_str(&entity.color);
                    self.ctx.fill_rect(mx - 1.5, my - 1.5, 3.0, 3.0);
                }
                EntityClass::DataNode => {
                    self.ctx.set_fill_style_str(theme.accent);
                    self.ctx.set_global_alpha(0.3);
                    self.ctx.fill_rect(mx - 0.5, my - 0.5, 1.0, 1.0);
                    self.ctx.set_global_alpha(1.0);
                }
                EntityClass::Wormhole => {
                    self.ctx.set_fill_style_str(theme.success);
                    self.ctx.fill_rect(mx - 1.0, my - 1.0, 2.0, 2.0);
                }
                _ => {}
            }
        }

        // Own marker blinks; crosshair lines give a bearing at a glance.
        let my_x = me.position.x * scale_x;
        let my_y = me.position.y * scale_y;
        if now % 1000.0 < 500.0 {
            self.ctx.set_fill_style_str(theme.accent);
            self.ctx.begin_path();
            let _ = self.ctx.arc(my_x, my_y, 3.0, 0.0, std::f64::consts::TAU);
            self.ctx.fill();
        }

        let (r, g, b) = hex_to_rgb(theme.accent);
        self.ctx
            .set_stroke_style_str(&format!("rgba({r},{g},{b},0.2)"));
        self.ctx.begin_path();
        self.ctx.move_to(my_x, 0.0);
        self.ctx.line_to(my_x, h);
        self.ctx.move_to(0.0, my_y);
        self.ctx.line_to(w, my_y);
        self.ctx.stroke();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        assert_eq!(hex_to_rgb("#f85149"), (248, 81, 73));
        assert_eq!(hex_to_rgb("58a6ff"), (88, 166, 255));
        assert_eq!(hex_to_rgb("nope"), (255, 255, 255));
    }

    #[test]
    fn starfield_spawns_inside_world_bounds() {
        let field = Starfield::with_count(200);
        assert_eq!(field.stars().len(), 200);
        for star in field.stars() {
            assert!((0.0..WORLD_WIDTH).contains(&star.x));
            assert!((0.0..WORLD_HEIGHT).contains(&star.y));
            assert!(star.speed > 0.0);
        }
    }

    #[test]
    fn glow_table_prefers_self_and_boss() {
        assert_eq!(glow_for(EntityClass::Vessel, true), 12);
        assert_eq!(glow_for(EntityClass::Boss, false), 25);
        assert_eq!(glow_for(EntityClass::Meteorite, false), 0);
        assert!(glow_for(EntityClass::Vessel, false) < glow_for(EntityClass::Boss, false));
    }
}
