// World snapshot store - the single source of truth for per-frame consumers
//
// Snapshots replace the entity set wholesale; nothing is merged field by
// field. The store is written only from the network callback and read by the
// renderer, scanner and effect system, none of which mutate it.

use std::collections::HashMap;

use protocol::Entity;

/// World dimensions in cells. The server never sends bounds; these match its
/// fixed map.
pub const WORLD_WIDTH: f32 = 500.0;
pub const WORLD_HEIGHT: f32 = 500.0;

/// Behavior class of an entity, derived once from its name tag so per-type
/// dispatch (glow, light radius, minimap marker) never re-compares strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityClass {
    /// A combat entity: player vessel or sentinel drone.
    Vessel,
    /// The roaming boss.
    Boss,
    Projectile,
    Meteorite,
    Ore,
    DataNode,
    Wormhole,
    Station,
    Unknown,
}

impl EntityClass {
    pub fn of(entity: &Entity) -> Self {
        match entity.name.as_str() {
            "NULL" => EntityClass::Boss,
            "PROJECTILE" => EntityClass::Projectile,
            "METEORITE" => EntityClass::Meteorite,
            "DATA_NODE" => EntityClass::DataNode,
            "WORMHOLE" => EntityClass::Wormhole,
            "OUTPOST" => EntityClass::Station,
            name if name.ends_with("_ORE") || name == "ORE_METEORITE" => EntityClass::Ore,
            _ if entity.is_combat() => EntityClass::Vessel,
            _ => EntityClass::Unknown,
        }
    }

    /// Whether the resource-cell background tint applies (terrain that can
    /// be mined).
    #[inline]
    pub fn is_resource_terrain(self) -> bool {
        matches!(self, EntityClass::Meteorite | EntityClass::Ore)
    }
}

pub struct World {
    entities: HashMap<String, Entity>,
    local_id: Option<String>,
    local_name: String,
    /// hp/shield of the local entity as of the previous snapshot, captured
    /// before each replace so damage is detectable within the same update.
    prev_hp: Option<f64>,
    prev_shield: Option<f64>,
    last_snapshot_at: f64,
    debug_data: Option<serde_json::Value>,
}

impl World {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            local_id: None,
            local_name: String::new(),
            prev_hp: None,
            prev_shield: None,
            last_snapshot_at: 0.0,
            debug_data: None,
        }
    }

    /// Record the locally controlled entity. Set once at welcome time; later
    /// welcomes on the same session are ignored.
    pub fn set_local(&mut self, id: String, name: String) {
        if self.local_id.is_none() {
            self.local_id = Some(id);
            self.local_name = name;
        }
    }

    /// Replace the whole entity set with a new snapshot.
    pub fn apply_objects(&mut self, objects: Vec<Entity>, now: f64) {
        self.prev_hp = self.local().and_then(|e| e.hp);
        self.prev_shield = self.local().and_then(|e| e.shield);

        self.entities.clear();
        for entity in objects {
            self.entities.insert(entity.id.clone(), entity);
        }
        self.last_snapshot_at = now;
    }

    pub fn set_debug_data(&mut self, data: Option<serde_json::Value>) {
        if data.is_some() {
            self.debug_data = data;
        }
    }

    pub fn debug_data(&self) -> Option<&serde_json::Value> {
        self.debug_data.as_ref()
    }

    /// Look up an entity by id; absent ids (stale scan records, dangling
    /// linkedId references) resolve to None and are skipped for the frame.
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn local(&self) -> Option<&Entity> {
        self.entity(self.local_id.as_deref()?)
    }

    /// Follow a wormhole-style pairing to the linked entity, if both ends
    /// still exist this frame.
    pub fn linked(&self, entity: &Entity) -> Option<&Entity> {
        self.entity(entity.linked_id.as_deref()?)
    }

    /// True once the player is spawned and not rebooting.
    pub fn is_local_alive(&self) -> bool {
        self.local().is_some_and(|e| !e.is_inert())
    }

    /// HP lost by the local entity in the snapshot just applied, if any.
    pub fn local_damage(&self) -> f64 {
        let (Some(prev), Some(entity)) = (self.prev_hp, self.local()) else {
            return 0.0;
        };
        let current = entity.hp.unwrap_or(prev);
        (prev - current).max(0.0)
    }

    pub fn last_snapshot_at(&self) -> f64 {
        self.last_snapshot_at
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::Position;

    fn entity(id: &str, x: f64, y: f64) -> Entity {
        Entity {
            id: id.to_string(),
            position: Position::new(x, y),
            ..Entity::default()
        }
    }

    fn combat(id: &str, x: f64, y: f64, hp: f64) -> Entity {
        Entity {
            hp: Some(hp),
            max_hp: Some(5.0),
            shield: Some(0.0),
            ..entity(id, x, y)
        }
    }

    #[test]
    fn welcome_then_snapshot_resolves_local_entity() {
        let mut world = World::new();
        world.set_local("42".into(), "Vega".into());
        world.apply_objects(vec![combat("42", 10.0, 10.0, 5.0)], 0.0);

        let me = world.local().expect("local entity present");
        assert_eq!(me.hp, Some(5.0));
        assert_eq!(me.position, Position::new(10.0, 10.0));
        assert_eq!(world.local_name(), "Vega");
    }

    #[test]
    fn local_id_is_never_reassigned() {
        let mut world = World::new();
        world.set_local("42".into(), "Vega".into());
        world.set_local("99".into(), "Impostor".into());
        assert_eq!(world.local_id(), Some("42"));
    }

    #[test]
    fn snapshot_is_a_full_replace() {
        let mut world = World::new();
        world.apply_objects(vec![entity("a", 0.0, 0.0), entity("b", 1.0, 1.0)], 0.0);
        world.apply_objects(vec![entity("b", 2.0, 2.0)], 1.0);
        assert!(world.entity("a").is_none());
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn hp_drop_is_visible_in_the_same_update() {
        let mut world = World::new();
        world.set_local("42".into(), "Vega".into());
        world.apply_objects(vec![combat("42", 10.0, 10.0, 5.0)], 0.0);
        assert_eq!(world.local_damage(), 0.0);

        world.apply_objects(vec![combat("42", 10.0, 10.0, 3.0)], 1.0);
        assert_eq!(world.local_damage(), 2.0);

        // Healing is not damage.
        world.apply_objects(vec![combat("42", 10.0, 10.0, 4.0)], 2.0);
        assert_eq!(world.local_damage(), 0.0);
    }

    #[test]
    fn dangling_linked_id_resolves_to_none() {
        let mut world = World::new();
        let mut wormhole = entity("w1", 5.0, 5.0);
        wormhole.name = "WORMHOLE".into();
        wormhole.linked_id = Some("w2".into());
        world.apply_objects(vec![wormhole], 0.0);

        let w1 = world.entity("w1").unwrap();
        assert!(world.linked(w1).is_none());
    }

    #[test]
    fn inert_local_entity_is_not_alive() {
        let mut world = World::new();
        world.set_local("42".into(), "Vega".into());
        world.apply_objects(vec![combat("42", 0.0, 0.0, 0.0)], 0.0);
        assert!(!world.is_local_alive());
        world.apply_objects(vec![combat("42", 0.0, 0.0, 5.0)], 1.0);
        assert!(world.is_local_alive());
    }

    #[test]
    fn entity_classes_dispatch_on_name() {
        let cases = [
            ("NULL", EntityClass::Boss),
            ("PROJECTILE", EntityClass::Projectile),
            ("METEORITE", EntityClass::Meteorite),
            ("COPPER_ORE", EntityClass::Ore),
            ("ORE_METEORITE", EntityClass::Ore),
            ("DATA_NODE", EntityClass::DataNode),
            ("WORMHOLE", EntityClass::Wormhole),
            ("OUTPOST", EntityClass::Station),
        ];
        for (name, expected) in cases {
            let mut e = entity("x", 0.0, 0.0);
            e.name = name.into();
            assert_eq!(EntityClass::of(&e), expected, "{name}");
        }

        let vessel = combat("v", 0.0, 0.0, 5.0);
        assert_eq!(EntityClass::of(&vessel), EntityClass::Vessel);
        let stranger = entity("s", 0.0, 0.0);
        assert_eq!(EntityClass::of(&stranger), EntityClass::Unknown);
    }
}
