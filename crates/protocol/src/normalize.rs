//! Abbreviated-key normalization.
//!
//! The server abbreviates map keys on the wire (`o` for `objects`, `h` for
//! `hp`, ...). Normalization expands them additively: the canonical key is
//! written next to the abbreviated one, which stays in place. Downstream code
//! only ever reads canonical keys. Unknown or absent keys are simply left
//! alone, and applying the pass twice is a no-op.

use serde_json::Value;

/// Wire abbreviation → canonical key. Applied to the message root, to every
/// element of `objects` and `effects`, and to a nested `weapon` record.
const KEY_MAP: &[(&str, &str)] = &[
    ("o", "objects"),
    ("ev", "events"),
    ("ef", "effects"),
    ("dbg", "debugData"),
    ("i", "id"),
    ("p", "position"),
    ("s", "symbol"),
    ("c", "color"),
    ("n", "name"),
    ("h", "hp"),
    ("mh", "maxHp"),
    ("sh", "shield"),
    ("msh", "maxShield"),
    ("co", "copper"),
    ("si", "silver"),
    ("go", "gold"),
    ("l", "level"),
    ("e", "exp"),
    ("w", "weapon"),
    ("t", "type"),
    ("sa", "scannerActive"),
    ("pi", "playerId"),
    ("pn", "playerName"),
    ("d", "payload"),
    ("tx", "targetX"),
    ("ty", "targetY"),
    ("sz", "size"),
    ("ts", "timestamp"),
    ("vib", "vibration"),
];

/// Expand abbreviated keys in place.
pub fn normalize(value: &mut Value) {
    let Value::Object(map) = value else {
        return;
    };

    for (abbr, canonical) in KEY_MAP {
        if let Some(v) = map.get(*abbr) {
            let v = v.clone();
            map.insert((*canonical).to_string(), v);
        }
    }

    if let Some(Value::Array(objects)) = map.get_mut("objects") {
        for obj in objects.iter_mut() {
            normalize(obj);
        }
    }
    if let Some(Value::Array(effects)) = map.get_mut("effects") {
        for effect in effects.iter_mut() {
            normalize(effect);
        }
    }
    if let Some(weapon) = map.get_mut("weapon") {
        normalize(weapon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_root_keys() {
        let mut v = json!({"pi": "abc", "pn": "Vega", "t": "WELCOME"});
        normalize(&mut v);
        assert_eq!(v["playerId"], "abc");
        assert_eq!(v["playerName"], "Vega");
        assert_eq!(v["type"], "WELCOME");
        // Abbreviated keys are left in place.
        assert_eq!(v["pi"], "abc");
    }

    #[test]
    fn expands_nested_objects_effects_and_weapon() {
        let mut v = json!({
            "o": [
                {"i": "1", "p": {"x": 10.0, "y": 10.0}, "h": 5.0, "w": {"n": "BASIC_BLASTER"}}
            ],
            "ef": [
                {"t": "EXPLOSION", "x": 5.0, "y": 5.0, "c": "#f85149", "sz": 2.0}
            ]
        });
        normalize(&mut v);
        assert_eq!(v["objects"][0]["id"], "1");
        assert_eq!(v["objects"][0]["hp"], 5.0);
        assert_eq!(v["objects"][0]["weapon"]["name"], "BASIC_BLASTER");
        assert_eq!(v["effects"][0]["type"], "EXPLOSION");
        assert_eq!(v["effects"][0]["size"], 2.0);
    }

    #[test]
    fn idempotent() {
        let mut once = json!({
            "o": [{"i": "1", "p": {"x": 1.0, "y": 2.0}, "n": "METEORITE", "w": {"n": "X"}}],
            "ef": [{"t": "HIT", "x": 0.0, "y": 0.0, "c": "#fff"}],
            "ev": ["[#3fb950]hello"]
        });
        normalize(&mut once);
        let mut twice = once.clone();
        normalize(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn every_mapping_is_reproducible() {
        // Each abbreviation, alone at the root, produces its canonical key.
        for (abbr, canonical) in KEY_MAP {
            let mut v = json!({ *abbr: 1 });
            normalize(&mut v);
            assert!(v.get(*canonical).is_some(), "{abbr} -> {canonical} missing");
        }
    }

    #[test]
    fn tolerates_non_objects_and_unknown_keys() {
        let mut v = json!(["not", "a", "map"]);
        normalize(&mut v);
        assert!(v.is_array());

        let mut v = json!({"zz": 1, "objects": "not-an-array"});
        normalize(&mut v);
        assert_eq!(v["zz"], 1);
    }
}
