//! Shared protocol crate for starlance.
//!
//! This crate contains:
//! - Wire frame decoding (MessagePack with a JSON text fallback)
//! - Abbreviated-key normalization
//! - Canonical message types and outbound command encoding

mod error;
mod normalize;
pub mod messages;

pub use error::ProtocolError;
pub use messages::client::{Command, Direction, encode_command};
pub use messages::server::{
    EffectKind, Entity, ServerMessage, StateSnapshot, VisualEffect, Weapon, Welcome, decode_frame,
};
pub use normalize::normalize;

use serde::{Deserialize, Serialize};

/// A 2D position in world cell units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance to another position, in cells.
    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Lossy conversion for client-side f32 math.
    pub fn to_vec2(self) -> glam::Vec2 {
        glam::Vec2::new(self.x as f32, self.y as f32)
    }
}
