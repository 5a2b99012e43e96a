// Particle and effect simulation - bursts, exhaust, seeking matter, beams,
// scan rings and full-screen flashes
//
// All positions in this module are world pixels (cell coordinates times
// CELL_SIZE), the same pre-camera space the renderer works in. Particles are
// client-only: spawned from one-shot server effects or continuous per-entity
// emission, advanced once per animation tick, and dropped when spent. They
// are never referenced by id.

use glam::Vec2;
use protocol::{EffectKind, VisualEffect};

use crate::camera::CELL_SIZE;
use crate::utils;

const FRICTION: f32 = 0.95;
const SEEK_ACCEL: f32 = 0.8;
const SEEK_CAPTURE_PX: f32 = 12.0;
/// Seeking particles never fade out on their own; they are held at this
/// floor until they reach their target.
const SEEK_LIFE_FLOOR: f32 = 0.05;

const BEAM_LIFE_DECAY: f32 = 0.06;
/// Two beam endpoints closer than this are the same beam (refresh, don't
/// stack).
const BEAM_MERGE_PX: f32 = 4.0;

const RING_INITIAL_SPEED: f32 = 40.0;
const RING_SPEED_DAMPING: f32 = 0.97;
const RING_LIFE_DECAY: f32 = 0.025;

/// Convert a world cell coordinate to the cell-centre pixel position.
#[inline]
pub fn cell_to_px(cell: Vec2) -> Vec2 {
    cell * CELL_SIZE + Vec2::splat(CELL_SIZE / 2.0)
}

fn pick(symbols: &[char]) -> char {
    symbols[(utils::random() * symbols.len() as f32) as usize % symbols.len()]
}

/// One ephemeral glyph. Owned solely by the particle system.
#[derive(Clone, Debug)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Remaining life in [0, 1]; the particle is removed once it hits 0.
    pub life: f32,
    pub decay: f32,
    pub symbol: char,
    pub color: String,
    pub size: f32,
    seek: Option<Vec2>,
}

impl Particle {
    /// Advance one tick. Returns false once the particle is spent (or, for
    /// seeking particles, once it reaches its target).
    pub fn tick(&mut self) -> bool {
        if let Some(target) = self.seek {
            let to_target = target - self.pos;
            let dist = to_target.length();
            if dist <= SEEK_CAPTURE_PX.max(self.vel.length()) {
                self.life = 0.0;
                return false;
            }
            self.vel += to_target / dist * SEEK_ACCEL;
            self.life = (self.life - self.decay).max(SEEK_LIFE_FLOOR);
        } else {
            self.life -= self.decay;
        }
        self.pos += self.vel;
        self.vel *= FRICTION;
        self.life > 0.0
    }

    pub fn is_seeking(&self) -> bool {
        self.seek.is_some()
    }
}

/// A persistent directional beam (mining laser). Refreshed while the server
/// keeps reporting the effect, fades once it stops.
#[derive(Clone, Debug)]
pub struct Beam {
    pub from: Vec2,
    pub to: Vec2,
    pub color: String,
    pub life: f32,
}

/// The expanding ring spawned at scanner activation. Emits data glyphs along
/// its rim while fresh.
#[derive(Clone, Debug)]
pub struct ScanRing {
    pub pos: Vec2,
    pub radius: f32,
    pub life: f32,
    pub color: String,
    speed: f32,
}

/// Screen-level feedback an effect produces besides particles; applied by
/// the caller to camera shake and flash overlays.
#[derive(Clone, Copy, Debug, Default)]
pub struct Impulse {
    pub shake: f32,
    pub explosion_flash: f32,
    pub teleport_flash: f32,
}

enum BurstStyle {
    /// Explosion/debris scatter: faster, slow decay.
    Big,
    /// Hits, pickups, projectile deaths: tighter and short-lived.
    Small,
}

/// Particle count and lifetime multiplier for an explosion of the given
/// effect size. Both grow strictly with size.
pub fn explosion_profile(size: f64) -> (usize, f32) {
    let size = size.max(1.0) as f32;
    let count = ((60.0 * size) as usize).min(240);
    let life_factor = 3.0 + size;
    (count, life_factor)
}

pub struct ParticleSystem {
    particles: Vec<Particle>,
    beams: Vec<Beam>,
    rings: Vec<ScanRing>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            beams: Vec::new(),
            rings: Vec::new(),
        }
    }

    /// Map one server-reported effect to its spawn profile. Returns the
    /// screen feedback (shake, flashes) the effect carries.
    pub fn apply_effect(&mut self, effect: &VisualEffect) -> Impulse {
        let origin = effect.origin().to_vec2();
        let size = effect.size.unwrap_or(1.0);

        match effect.kind {
            EffectKind::Explosion => {
                let (count, life_factor) = explosion_profile(size);
                self.burst(origin, &effect.color, BurstStyle::Big, '•', count, life_factor);
                Impulse {
                    shake: 2.0 + 2.0 * size as f32,
                    explosion_flash: (0.15 * size as f32).min(0.5),
                    ..Impulse::default()
                }
            }
            EffectKind::Debris => {
                let count = ((40.0 * size.max(1.0)) as usize).min(200);
                self.burst(origin, &effect.color, BurstStyle::Big, '#', count, 3.0);
                Impulse::default()
            }
            EffectKind::Hit => {
                self.burst(origin, &effect.color, BurstStyle::Small, '×', 8, 2.0);
                Impulse::default()
            }
            EffectKind::Collect => {
                self.burst(origin, &effect.color, BurstStyle::Small, '✧', 12, 1.0);
                Impulse::default()
            }
            EffectKind::ProjectileDeath => {
                self.burst(origin, &effect.color, BurstStyle::Small, '•', 12, 1.0);
                Impulse::default()
            }
            EffectKind::Teleport => {
                self.burst(origin, &effect.color, BurstStyle::Small, '✦', 24, 2.0);
                if let Some(target) = effect.target() {
                    self.burst(target.to_vec2(), &effect.color, BurstStyle::Small, '✦', 24, 2.0);
                }
                Impulse {
                    teleport_flash: 0.35,
                    ..Impulse::default()
                }
            }
            EffectKind::MiningLaser => {
                if let Some(target) = effect.target() {
                    let target = target.to_vec2();
                    self.refresh_beam(origin, target, &effect.color);
                    self.spawn_seeking(origin, target, &effect.color, 4);
                }
                Impulse::default()
            }
            EffectKind::Unknown => {
                self.burst(origin, &effect.color, BurstStyle::Small, '•', 12, 1.0);
                Impulse::default()
            }
        }
    }

    fn burst(
        &mut self,
        origin_cells: Vec2,
        color: &str,
        style: BurstStyle,
        symbol: char,
        count: usize,
        life_factor: f32,
    ) {
        let pos = cell_to_px(origin_cells);
        for _ in 0..count {
            let angle = utils::random() * std::f32::consts::TAU;
            let (speed, decay) = match style {
                BurstStyle::Big => (
                    utils::random() * 8.0 + 2.0,
                    (utils::random() * 0.03 + 0.01) / life_factor,
                ),
                BurstStyle::Small => (
                    utils::random() * 4.0 + 1.0,
                    (utils::random() * 0.05 + 0.02) / life_factor,
                ),
            };
            self.particles.push(Particle {
                pos,
                vel: Vec2::from_angle(angle) * speed,
                life: 1.0,
                decay,
                symbol,
                color: color.to_string(),
                size: utils::random() * 3.0 + 2.0,
                seek: None,
            });
        }
    }

    /// Thruster exhaust behind a moving entity: binary glyphs streaming
    /// opposite its velocity, decaying fast.
    pub fn spawn_exhaust(&mut self, origin_cells: Vec2, color: &str, parent_vel: Vec2, life_factor: f32) {
        let scatter = Vec2::new(utils::random_signed(), utils::random_signed());
        self.particles.push(Particle {
            pos: cell_to_px(origin_cells),
            vel: -parent_vel * 30.0 + scatter,
            life: 1.0,
            decay: (utils::random() * 0.12 + 0.06) / life_factor,
            symbol: pick(&['1', '0']),
            color: color.to_string(),
            size: utils::random() * 2.0 + 1.0,
            seek: None,
        });
    }

    /// Faint trail behind a projectile.
    pub fn spawn_trail(&mut self, origin_cells: Vec2, color: &str, parent_vel: Vec2, life_factor: f32) {
        let scatter = Vec2::new(utils::random_signed(), utils::random_signed()) * 0.25;
        self.particles.push(Particle {
            pos: cell_to_px(origin_cells),
            vel: -parent_vel * 10.0 + scatter,
            life: 1.0,
            decay: (utils::random() * 0.08 + 0.04) / life_factor,
            symbol: pick(&['·', '•']),
            color: color.to_string(),
            size: utils::random() * 1.5 + 0.5,
            seek: None,
        });
    }

    /// Resource matter pulled toward a collector. Held alive until each
    /// particle reaches the target point.
    pub fn spawn_seeking(&mut self, origin_cells: Vec2, target_cells: Vec2, color: &str, count: usize) {
        let pos = cell_to_px(origin_cells);
        let target = cell_to_px(target_cells);
        for _ in 0..count {
            let jitter = Vec2::new(utils::random_signed(), utils::random_signed()) * 2.0;
            self.particles.push(Particle {
                pos: pos + jitter * 2.0,
                vel: jitter,
                life: 1.0,
                decay: utils::random() * 0.02 + 0.01,
                symbol: pick(&['✧', '·']),
                color: color.to_string(),
                size: utils::random() * 2.0 + 1.0,
                seek: Some(target),
            });
        }
    }

    /// Start a new beam, or refresh the life of one with the same endpoints.
    pub fn refresh_beam(&mut self, origin_cells: Vec2, target_cells: Vec2, color: &str) {
        let from = cell_to_px(origin_cells);
        let to = cell_to_px(target_cells);
        if let Some(beam) = self
            .beams
            .iter_mut()
            .find(|b| b.from.distance(from) < BEAM_MERGE_PX && b.to.distance(to) < BEAM_MERGE_PX)
        {
            beam.life = 1.0;
            beam.color = color.to_string();
        } else {
            self.beams.push(Beam {
                from,
                to,
                color: color.to_string(),
                life: 1.0,
            });
        }
    }

    /// Ring-expansion visual spawned at scanner activation.
    pub fn spawn_ring(&mut self, origin_cells: Vec2, color: &str) {
        self.rings.push(ScanRing {
            pos: cell_to_px(origin_cells),
            radius: 0.0,
            life: 1.0,
            color: color.to_string(),
            speed: RING_INITIAL_SPEED,
        });
    }

    /// Radial pulse of exhaust glyphs around a point (scanner power-on).
    pub fn spawn_pulse(&mut self, origin_cells: Vec2, color: &str, count: usize) {
        for _ in 0..count {
            let angle = utils::random() * std::f32::consts::TAU;
            self.spawn_exhaust(origin_cells, color, Vec2::from_angle(angle) * -0.1, 1.0);
        }
    }

    /// Advance every live effect by one tick.
    pub fn tick(&mut self) {
        // Rings first so their rim emission joins this tick's particle pass.
        let mut rim: Vec<Particle> = Vec::new();
        for ring in &mut self.rings {
            ring.radius += ring.speed;
            ring.speed *= RING_SPEED_DAMPING;
            ring.life -= RING_LIFE_DECAY;
            if ring.life > 0.2 {
                let count = (ring.radius / 25.0) as usize + 6;
                for _ in 0..count {
                    let dir = Vec2::from_angle(utils::random() * std::f32::consts::TAU);
                    rim.push(Particle {
                        pos: ring.pos + dir * ring.radius,
                        vel: dir * 4.5,
                        life: 1.0,
                        decay: utils::random() * 0.12 + 0.06,
                        symbol: pick(&['1', '0']),
                        color: ring.color.clone(),
                        size: utils::random() * 2.0 + 1.0,
                        seek: None,
                    });
                }
            }
        }
        self.rings.retain(|r| r.life > 0.0);
        self.particles.append(&mut rim);

        for beam in &mut self.beams {
            beam.life -= BEAM_LIFE_DECAY;
        }
        self.beams.retain(|b| b.life > 0.0);

        self.particles.retain_mut(Particle::tick);
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn beams(&self) -> &[Beam] {
        &self.beams
    }

    pub fn rings(&self) -> &[ScanRing] {
        &self.rings
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Full-screen flashes
// ---------------------------------------------------------------------------

const DAMAGE_FLASH_DECAY: f32 = 0.04;
const TELEPORT_FLASH_DECAY: f32 = 0.06;
const EXPLOSION_FLASH_DECAY: f32 = 0.03;
/// Above this alpha the renderer adds glitch slice distortion.
pub const GLITCH_THRESHOLD: f32 = 0.55;

/// Transient full-screen overlays. Each decays independently per tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct Flashes {
    pub damage: f32,
    pub teleport: f32,
    pub explosion: f32,
}

impl Flashes {
    pub fn tick(&mut self) {
        self.damage = (self.damage - DAMAGE_FLASH_DECAY).max(0.0);
        self.teleport = (self.teleport - TELEPORT_FLASH_DECAY).max(0.0);
        self.explosion = (self.explosion - EXPLOSION_FLASH_DECAY).max(0.0);
    }

    /// Raise the damage flash in proportion to hit points lost this update.
    pub fn trigger_damage(&mut self, hp_lost: f64) {
        self.damage = (self.damage + 0.3 * hp_lost as f32).min(0.9);
    }

    pub fn apply_impulse(&mut self, impulse: &Impulse) {
        self.explosion = (self.explosion + impulse.explosion_flash).min(0.9);
        self.teleport = (self.teleport + impulse.teleport_flash).min(0.9);
    }

    pub fn strongest(&self) -> f32 {
        self.damage.max(self.teleport).max(self.explosion)
    }

    /// Glitch distortion strength in [0, 1]; zero below the threshold.
    pub fn glitch_level(&self) -> f32 {
        ((self.strongest() - GLITCH_THRESHOLD) / (1.0 - GLITCH_THRESHOLD)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn effect(kind: EffectKind, size: Option<f64>) -> VisualEffect {
        VisualEffect {
            kind,
            x: 5.0,
            y: 5.0,
            color: "#f85149".into(),
            size,
            ..VisualEffect::default()
        }
    }

    #[test]
    fn ballistic_life_strictly_decreases_until_removal() {
        let mut system = ParticleSystem::new();
        system.apply_effect(&effect(EffectKind::Hit, None));
        let mut particle = system.particles()[0].clone();

        let mut previous = particle.life;
        loop {
            let alive = particle.tick();
            assert!(particle.life < previous, "life must strictly decrease");
            previous = particle.life;
            if !alive {
                break;
            }
        }
        assert!(particle.life <= 0.0);
    }

    #[test]
    fn spent_particles_are_removed_by_the_system_tick() {
        let mut system = ParticleSystem::new();
        system.apply_effect(&effect(EffectKind::Hit, None));
        assert!(!system.is_empty());
        for _ in 0..10_000 {
            system.tick();
            if system.is_empty() {
                return;
            }
        }
        panic!("particles never drained");
    }

    #[test]
    fn explosion_scales_count_and_lifetime_with_size() {
        let (count_1, life_1) = explosion_profile(1.0);
        let (count_2, life_2) = explosion_profile(2.0);
        assert!(count_2 > count_1);
        assert!(life_2 > life_1);

        let mut small = ParticleSystem::new();
        small.apply_effect(&effect(EffectKind::Explosion, Some(1.0)));
        let mut big = ParticleSystem::new();
        big.apply_effect(&effect(EffectKind::Explosion, Some(2.0)));
        assert!(big.len() > small.len());
    }

    #[test]
    fn explosion_impulse_shakes_and_flashes() {
        let mut system = ParticleSystem::new();
        let impulse = system.apply_effect(&effect(EffectKind::Explosion, Some(2.0)));
        assert!(impulse.shake > 0.0);
        assert!(impulse.explosion_flash > 0.0);
        assert_eq!(impulse.teleport_flash, 0.0);
    }

    #[test]
    fn seeking_particle_survives_until_capture() {
        let mut system = ParticleSystem::new();
        system.spawn_seeking(Vec2::new(0.0, 0.0), Vec2::new(20.0, 0.0), "#d29922", 1);
        let mut particle = system.particles()[0].clone();
        assert!(particle.is_seeking());

        let mut ticks = 0u32;
        while particle.tick() {
            ticks += 1;
            // Held at the floor, never expires mid-flight.
            assert!(particle.life >= SEEK_LIFE_FLOOR);
            assert!(ticks < 10_000, "seeking particle never arrived");
        }
        // Removal happens through capture, not decay, and takes real travel
        // time across 20 cells.
        assert!(ticks > 3);
    }

    #[test]
    fn mining_laser_refreshes_a_single_beam() {
        let mut system = ParticleSystem::new();
        let laser = VisualEffect {
            kind: EffectKind::MiningLaser,
            x: 1.0,
            y: 1.0,
            target_x: Some(4.0),
            target_y: Some(5.0),
            color: "#d29922".into(),
            size: None,
        };
        system.apply_effect(&laser);
        assert_eq!(system.beams().len(), 1);
        for _ in 0..5 {
            system.tick();
        }
        let faded = system.beams()[0].life;
        assert!(faded < 1.0);

        system.apply_effect(&laser);
        assert_eq!(system.beams().len(), 1, "same endpoints must not stack");
        assert_eq!(system.beams()[0].life, 1.0);
    }

    #[test]
    fn beams_fade_out_once_refreshes_stop() {
        let mut system = ParticleSystem::new();
        system.refresh_beam(Vec2::ZERO, Vec2::new(3.0, 0.0), "#d29922");
        for _ in 0..50 {
            system.tick();
        }
        assert!(system.beams().is_empty());
    }

    #[test]
    fn rings_expand_and_expire() {
        let mut system = ParticleSystem::new();
        system.spawn_ring(Vec2::new(10.0, 10.0), "#58a6ff");
        system.tick();
        let radius = system.rings()[0].radius;
        assert!(radius > 0.0);
        // Rim emission produced data glyphs.
        assert!(!system.is_empty());
        for _ in 0..60 {
            system.tick();
        }
        assert!(system.rings().is_empty());
    }

    #[test]
    fn flashes_decay_independently_to_zero() {
        let mut flashes = Flashes::default();
        flashes.trigger_damage(2.0);
        flashes.apply_impulse(&Impulse {
            explosion_flash: 0.3,
            teleport_flash: 0.2,
            ..Impulse::default()
        });
        assert!(flashes.damage > 0.0 && flashes.explosion > 0.0 && flashes.teleport > 0.0);
        for _ in 0..100 {
            flashes.tick();
        }
        assert_eq!(flashes.strongest(), 0.0);
        assert_eq!(flashes.glitch_level(), 0.0);
    }

    #[test]
    fn glitch_only_above_threshold() {
        let mut flashes = Flashes::default();
        flashes.damage = GLITCH_THRESHOLD - 0.1;
        assert_eq!(flashes.glitch_level(), 0.0);
        flashes.damage = 0.9;
        assert!(flashes.glitch_level() > 0.0);
    }
}
