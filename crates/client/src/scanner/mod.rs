// Scanner subsystem - toggled reveal mode with cooldown, boot and fade
//
// Phase machine: Off → Booting → Active → FadingOut → Off. Toggles are
// client-initiated (subject to a cooldown) and mirrored to the server with
// SCANNER_STATE commands; the scanned-entity set itself is recomputed
// locally every frame while the overlay is visible.

use std::collections::HashMap;

use protocol::Entity;

use crate::utils;
use crate::world::{EntityClass, World};

/// Entities strictly closer than this many cells are scannable.
pub const SCAN_RANGE_CELLS: f64 = 30.0;
/// Conversion factor from cells to the AU readout.
pub const AU_IN_CELLS: f64 = 10.0;
pub const TOGGLE_COOLDOWN_MS: f64 = 1000.0;
pub const BOOT_DURATION_MS: f64 = 1500.0;
pub const FADE_DURATION_MS: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerPhase {
    Off,
    /// Just powered on: overlay ramps up with flicker noise.
    Booting,
    Active,
    /// Powered off, overlay decaying linearly to zero.
    FadingOut,
}

/// Classification shown on the overlay and used for outline color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanClass {
    Enemy,
    Neutral,
    Wormhole,
    Station,
}

impl ScanClass {
    pub fn is_enemy(self) -> bool {
        matches!(self, ScanClass::Enemy)
    }
}

/// Per-entity scan result. `first_seen` survives across frames while the
/// entity stays in range, driving the outline/label fade-in.
#[derive(Debug, Clone)]
pub struct ScanRecord {
    pub id: String,
    pub label: String,
    pub distance_au: f64,
    pub class: ScanClass,
    pub first_seen: f64,
}

pub struct Scanner {
    active: bool,
    last_toggle: f64,
    activated_at: f64,
    deactivated_at: f64,
    records: Vec<ScanRecord>,
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            active: false,
            last_toggle: f64::NEG_INFINITY,
            activated_at: f64::NEG_INFINITY,
            deactivated_at: f64::NEG_INFINITY,
            records: Vec::new(),
        }
    }

    /// Attempt a toggle. Returns the new on/off state, or None when the
    /// cooldown swallowed the input.
    pub fn toggle(&mut self, now: f64) -> Option<bool> {
        if now - self.last_toggle < TOGGLE_COOLDOWN_MS {
            return None;
        }
        self.last_toggle = now;
        self.active = !self.active;
        if self.active {
            self.activated_at = now;
        } else {
            self.deactivated_at = now;
        }
        Some(self.active)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase(&self, now: f64) -> ScannerPhase {
        if self.active {
            if now - self.activated_at < BOOT_DURATION_MS {
                ScannerPhase::Booting
            } else {
                ScannerPhase::Active
            }
        } else if now - self.deactivated_at < FADE_DURATION_MS {
            ScannerPhase::FadingOut
        } else {
            ScannerPhase::Off
        }
    }

    /// Overlay opacity for the current phase. Boot ramps with flicker noise,
    /// steady state flickers mildly, fade-out decays linearly.
    pub fn overlay_alpha(&self, now: f64) -> f32 {
        match self.phase(now) {
            ScannerPhase::Off => 0.0,
            ScannerPhase::Booting => {
                let elapsed = now - self.activated_at;
                let progress = (elapsed / BOOT_DURATION_MS) as f32;
                let flicker = ((elapsed * 0.05).sin() * 0.2 + 0.8) as f32;
                let noise = utils::random() * 0.15;
                ((flicker - noise) * progress).clamp(0.0, 1.0)
            }
            ScannerPhase::Active => {
                let flicker = ((now * 0.015).sin() * 0.12 + 0.88) as f32;
                (flicker - utils::random() * 0.06).clamp(0.0, 1.0)
            }
            ScannerPhase::FadingOut => {
                (1.0 - (now - self.deactivated_at) / FADE_DURATION_MS) as f32
            }
        }
    }

    /// Recompute the scanned set from the current world. Clears the cache
    /// once the fade-out has finished.
    pub fn refresh(&mut self, world: &World, now: f64) {
        if self.phase(now) == ScannerPhase::Off {
            self.records.clear();
            return;
        }
        let Some(me) = world.local() else {
            self.records.clear();
            return;
        };
        let my_pos = me.position;
        let my_id = me.id.clone();

        let previous: HashMap<String, f64> = self
            .records
            .drain(..)
            .map(|r| (r.id, r.first_seen))
            .collect();

        for entity in world.iter() {
            if entity.id == my_id || entity.is_inert() {
                continue;
            }
            let distance = my_pos.distance(&entity.position);
            if distance >= SCAN_RANGE_CELLS {
                continue;
            }
            self.records.push(ScanRecord {
                label: scan_label(entity),
                distance_au: distance / AU_IN_CELLS,
                class: classify(entity),
                first_seen: previous.get(&entity.id).copied().unwrap_or(now),
                id: entity.id.clone(),
            });
        }
    }

    pub fn records(&self) -> &[ScanRecord] {
        &self.records
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Human label for a scanned entity.
fn scan_label(entity: &Entity) -> String {
    match EntityClass::of(entity) {
        EntityClass::Meteorite => "Meteorite".to_string(),
        EntityClass::Ore => {
            let kind = entity.name.trim_end_matches("_ORE");
            format!("Mineral ({kind})")
        }
        EntityClass::Boss => "Unknown Entity".to_string(),
        EntityClass::Wormhole => "Wormhole".to_string(),
        EntityClass::Station => "Station".to_string(),
        EntityClass::Vessel => format!("Vessel: {}", entity.name),
        _ => entity.name.clone(),
    }
}

fn classify(entity: &Entity) -> ScanClass {
    match EntityClass::of(entity) {
        EntityClass::Wormhole => ScanClass::Wormhole,
        EntityClass::Station => ScanClass::Station,
        EntityClass::Boss | EntityClass::Vessel => ScanClass::Enemy,
        _ if entity.name == "SENTINEL" => ScanClass::Enemy,
        _ => ScanClass::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::Position;

    fn world_with(me_pos: (f64, f64), others: Vec<Entity>) -> World {
        let mut world = World::new();
        world.set_local("me".into(), "Vega".into());
        let mut objects = vec![Entity {
            id: "me".into(),
            position: Position::new(me_pos.0, me_pos.1),
            hp: Some(5.0),
            ..Entity::default()
        }];
        objects.extend(others);
        world.apply_objects(objects, 0.0);
        world
    }

    fn rock(id: &str, x: f64, y: f64) -> Entity {
        Entity {
            id: id.into(),
            position: Position::new(x, y),
            name: "METEORITE".into(),
            ..Entity::default()
        }
    }

    #[test]
    fn double_toggle_within_cooldown_is_one_transition() {
        let mut scanner = Scanner::new();
        assert_eq!(scanner.toggle(1000.0), Some(true));
        assert_eq!(scanner.toggle(1500.0), None);
        assert!(scanner.is_active());
        // After the cooldown it always flips.
        assert_eq!(scanner.toggle(2000.0), Some(false));
    }

    #[test]
    fn phases_follow_boot_and_fade_durations() {
        let mut scanner = Scanner::new();
        assert_eq!(scanner.phase(0.0), ScannerPhase::Off);

        scanner.toggle(1000.0);
        assert_eq!(scanner.phase(1100.0), ScannerPhase::Booting);
        assert_eq!(scanner.phase(1000.0 + BOOT_DURATION_MS + 1.0), ScannerPhase::Active);

        scanner.toggle(5000.0);
        assert_eq!(scanner.phase(5100.0), ScannerPhase::FadingOut);
        assert_eq!(scanner.phase(5000.0 + FADE_DURATION_MS + 1.0), ScannerPhase::Off);
    }

    #[test]
    fn scan_excludes_self_inert_and_out_of_range() {
        let mut inert = Entity {
            hp: Some(0.0),
            ..rock("dead", 1.0, 0.0)
        };
        inert.name = "Ghost".into();
        let world = world_with(
            (0.0, 0.0),
            vec![rock("near", 3.0, 4.0), rock("far", 100.0, 0.0), inert],
        );

        let mut scanner = Scanner::new();
        scanner.toggle(0.0);
        scanner.refresh(&world, 10.0);

        let ids: Vec<&str> = scanner.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["near"]);
    }

    #[test]
    fn boundary_distance_is_exclusive() {
        // Exactly 30 cells away: excluded. A hair closer: included.
        let world = world_with(
            (0.0, 0.0),
            vec![rock("edge", 30.0, 0.0), rock("inside", 29.99, 0.0)],
        );
        let mut scanner = Scanner::new();
        scanner.toggle(0.0);
        scanner.refresh(&world, 10.0);
        let ids: Vec<&str> = scanner.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["inside"]);
    }

    #[test]
    fn first_seen_is_preserved_across_refreshes() {
        let world = world_with((0.0, 0.0), vec![rock("r", 3.0, 4.0)]);
        let mut scanner = Scanner::new();
        scanner.toggle(0.0);
        scanner.refresh(&world, 100.0);
        assert_eq!(scanner.records()[0].first_seen, 100.0);
        scanner.refresh(&world, 250.0);
        assert_eq!(scanner.records()[0].first_seen, 100.0);
    }

    #[test]
    fn cache_clears_after_fade_completes() {
        let world = world_with((0.0, 0.0), vec![rock("r", 3.0, 4.0)]);
        let mut scanner = Scanner::new();
        scanner.toggle(0.0);
        scanner.refresh(&world, 100.0);
        assert_eq!(scanner.records().len(), 1);

        scanner.toggle(2000.0);
        // Mid-fade the records stay visible.
        scanner.refresh(&world, 2200.0);
        assert_eq!(scanner.records().len(), 1);
        // Fade finished: cleared.
        scanner.refresh(&world, 2000.0 + FADE_DURATION_MS + 1.0);
        assert!(scanner.records().is_empty());
    }

    #[test]
    fn distance_readout_is_in_astronomical_units() {
        let world = world_with((0.0, 0.0), vec![rock("r", 3.0, 4.0)]);
        let mut scanner = Scanner::new();
        scanner.toggle(0.0);
        scanner.refresh(&world, 10.0);
        // 3-4-5 triangle: 5 cells = 0.5 AU.
        assert!((scanner.records()[0].distance_au - 0.5).abs() < 1e-9);
    }

    #[test]
    fn labels_and_classes_follow_entity_kind() {
        let mut ore = rock("o", 1.0, 0.0);
        ore.name = "COPPER_ORE".into();
        let mut boss = rock("b", 2.0, 0.0);
        boss.name = "NULL".into();
        let vessel = Entity {
            id: "v".into(),
            position: Position::new(3.0, 0.0),
            name: "Rook".into(),
            hp: Some(4.0),
            ..Entity::default()
        };
        let mut hole = rock("w", 4.0, 0.0);
        hole.name = "WORMHOLE".into();

        let world = world_with((0.0, 0.0), vec![ore, boss, vessel, hole]);
        let mut scanner = Scanner::new();
        scanner.toggle(0.0);
        scanner.refresh(&world, 10.0);

        let by_id = |id: &str| {
            scanner
                .records()
                .iter()
                .find(|r| r.id == id)
                .unwrap_or_else(|| panic!("{id} not scanned"))
        };
        assert_eq!(by_id("o").label, "Mineral (COPPER)");
        assert_eq!(by_id("b").label, "Unknown Entity");
        assert!(by_id("b").class.is_enemy());
        assert_eq!(by_id("v").label, "Vessel: Rook");
        assert!(by_id("v").class.is_enemy());
        assert_eq!(by_id("w").class, ScanClass::Wormhole);
    }
}
