//! Inbound messages: the one-time welcome and the recurring state snapshot.
//!
//! Frames arrive either as MessagePack (the compact default) or as JSON text
//! (the server's fallback encoding). Both carry the same logical schema with
//! abbreviated keys; `decode_frame` normalizes before any typed decoding, so
//! the structs below only ever name canonical keys.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::normalize;
use crate::{Position, ProtocolError};

/// A nested weapon record on a combat entity. Only the fields the HUD and
/// renderer care about are typed; the rest ride along in the raw value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Weapon {
    pub name: String,
    pub damage: Option<f64>,
    pub range: Option<f64>,
}

/// One world object as reported by the server.
///
/// Everything is optional except enough to identify and place the object;
/// rendering substitutes safe defaults for absent fields. `hp == Some(0)`
/// marks a temporarily inert (rebooting) entity that stays in the set but is
/// excluded from normal rendering and scanning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub position: Position,
    pub symbol: String,
    pub color: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub hp: Option<f64>,
    pub max_hp: Option<f64>,
    pub shield: Option<f64>,
    pub max_shield: Option<f64>,
    pub vx: Option<f64>,
    pub vy: Option<f64>,
    pub size: Option<f64>,
    /// Non-owning reference to a paired entity (wormhole exit). Resolved
    /// through the world store on every use; either endpoint may vanish
    /// between snapshots.
    pub linked_id: Option<String>,
    pub score: Option<i64>,
    pub level: Option<i64>,
    pub exp: Option<i64>,
    pub copper: Option<i64>,
    pub silver: Option<i64>,
    pub gold: Option<i64>,
    pub scanner_active: Option<bool>,
    pub weapon: Option<Weapon>,
}

impl Entity {
    /// Combat entities report hit points; decorations do not.
    #[inline]
    pub fn is_combat(&self) -> bool {
        self.hp.is_some()
    }

    /// Inert entities keep their slot in the set while respawning.
    #[inline]
    pub fn is_inert(&self) -> bool {
        self.hp == Some(0.0)
    }

    pub fn velocity(&self) -> Option<glam::Vec2> {
        match (self.vx, self.vy) {
            (Some(vx), Some(vy)) => Some(glam::Vec2::new(vx as f32, vy as f32)),
            _ => None,
        }
    }

    /// HP bar divisor when the server omits `maxHp`.
    #[inline]
    pub fn max_hp_or_default(&self) -> f64 {
        self.max_hp.filter(|m| *m > 0.0).unwrap_or(5.0)
    }

    /// Shield bar divisor when the server omits `maxShield`.
    #[inline]
    pub fn max_shield_or_default(&self) -> f64 {
        self.max_shield.filter(|m| *m > 0.0).unwrap_or(3.0)
    }
}

/// Discriminated visual effect type. Unrecognized strings decode to
/// `Unknown` and fall back to a generic burst client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectKind {
    Explosion,
    Debris,
    Hit,
    Collect,
    ProjectileDeath,
    Teleport,
    MiningLaser,
    #[serde(other)]
    Unknown,
}

impl Default for EffectKind {
    fn default() -> Self {
        EffectKind::Unknown
    }
}

/// A one-shot visual effect descriptor. Consumed on the frame it arrives,
/// never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisualEffect {
    #[serde(rename = "type")]
    pub kind: EffectKind,
    pub x: f64,
    pub y: f64,
    pub target_x: Option<f64>,
    pub target_y: Option<f64>,
    pub color: String,
    pub size: Option<f64>,
}

impl VisualEffect {
    pub fn origin(&self) -> Position {
        Position::new(self.x, self.y)
    }

    pub fn target(&self) -> Option<Position> {
        match (self.target_x, self.target_y) {
            (Some(x), Some(y)) => Some(Position::new(x, y)),
            _ => None,
        }
    }
}

/// Sent once per connection, right after the channel opens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Welcome {
    pub player_id: String,
    pub player_name: String,
}

/// One complete server-authoritative description of the world. Replaces the
/// client's prior view wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StateSnapshot {
    pub objects: Vec<Entity>,
    pub events: Vec<String>,
    pub effects: Vec<VisualEffect>,
    pub debug_data: Option<Value>,
    pub timestamp: Option<f64>,
    /// Screen-shake impulse reported by the server (explosions near the
    /// player, wormhole transits).
    pub vibration: Option<f64>,
}

/// A decoded inbound frame.
#[derive(Debug, Clone)]
pub enum ServerMessage {
    Welcome(Welcome),
    State(StateSnapshot),
}

/// Decode one raw frame into a canonical message.
///
/// The server probes the first byte to pick the encoding (a `{` means JSON
/// text); the client mirrors that here. Normalization runs before the typed
/// decode so abbreviated and canonical payloads are indistinguishable past
/// this point.
pub fn decode_frame(data: &[u8]) -> Result<ServerMessage, ProtocolError> {
    let first = *data.first().ok_or(ProtocolError::EmptyFrame)?;
    let mut value: Value = if first == b'{' {
        serde_json::from_slice(data)?
    } else {
        rmp_serde::from_slice(data)?
    };
    normalize(&mut value);

    if value.get("type").and_then(Value::as_str) == Some("WELCOME") {
        Ok(ServerMessage::Welcome(serde_json::from_value(value)?))
    } else {
        Ok(ServerMessage::State(serde_json::from_value(value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn msgpack(value: &Value) -> Vec<u8> {
        rmp_serde::to_vec(value).unwrap()
    }

    #[test]
    fn decodes_abbreviated_welcome_from_msgpack() {
        let frame = msgpack(&json!({"t": "WELCOME", "pi": "42", "pn": "Vega"}));
        match decode_frame(&frame).unwrap() {
            ServerMessage::Welcome(w) => {
                assert_eq!(w.player_id, "42");
                assert_eq!(w.player_name, "Vega");
            }
            other => panic!("expected welcome, got {other:?}"),
        }
    }

    #[test]
    fn decodes_state_from_json_fallback() {
        let frame = serde_json::to_vec(&json!({
            "o": [
                {"i": "42", "p": {"x": 10.0, "y": 10.0}, "h": 5.0, "mh": 5.0, "sh": 0.0,
                 "s": "@", "c": "#58a6ff", "n": "Vega", "vx": 0.1, "vy": 0.0},
                {"i": "rock", "p": {"x": 3.0, "y": 4.0}, "s": "#", "c": "#8b949e", "n": "METEORITE"}
            ],
            "ev": ["[#3fb950]Uplink established."],
            "ef": [{"t": "EXPLOSION", "x": 5.0, "y": 5.0, "c": "#f85149", "sz": 2.0}]
        }))
        .unwrap();

        let ServerMessage::State(state) = decode_frame(&frame).unwrap() else {
            panic!("expected state");
        };
        assert_eq!(state.objects.len(), 2);
        let vega = &state.objects[0];
        assert_eq!(vega.id, "42");
        assert_eq!(vega.hp, Some(5.0));
        assert!(vega.is_combat());
        assert!(!state.objects[1].is_combat());
        assert_eq!(state.events.len(), 1);
        assert_eq!(state.effects[0].kind, EffectKind::Explosion);
        assert_eq!(state.effects[0].size, Some(2.0));
    }

    #[test]
    fn unknown_effect_kind_is_tolerated() {
        let frame = msgpack(&json!({
            "ef": [{"t": "SOMETHING_NEW", "x": 0.0, "y": 0.0, "c": "#fff"}]
        }));
        let ServerMessage::State(state) = decode_frame(&frame).unwrap() else {
            panic!("expected state");
        };
        assert_eq!(state.effects[0].kind, EffectKind::Unknown);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let frame = msgpack(&json!({"o": [{"i": "x", "p": {"x": 1.0, "y": 2.0}}]}));
        let ServerMessage::State(state) = decode_frame(&frame).unwrap() else {
            panic!("expected state");
        };
        let e = &state.objects[0];
        assert!(e.hp.is_none());
        assert_eq!(e.max_hp_or_default(), 5.0);
        assert_eq!(e.max_shield_or_default(), 3.0);
        assert!(e.velocity().is_none());
        assert!(state.events.is_empty());
        assert!(state.vibration.is_none());
    }

    #[test]
    fn empty_frame_is_an_error() {
        assert!(matches!(decode_frame(&[]), Err(ProtocolError::EmptyFrame)));
    }

    #[test]
    fn mining_laser_carries_a_target() {
        let frame = msgpack(&json!({
            "ef": [{"t": "MINING_LASER", "x": 1.0, "y": 1.0, "tx": 4.0, "ty": 5.0, "c": "#d29922"}]
        }));
        let ServerMessage::State(state) = decode_frame(&frame).unwrap() else {
            panic!("expected state");
        };
        let effect = &state.effects[0];
        assert_eq!(effect.kind, EffectKind::MiningLaser);
        let target = effect.target().unwrap();
        assert_eq!((target.x, target.y), (4.0, 5.0));
    }
}
