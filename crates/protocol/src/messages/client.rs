//! Outbound commands.
//!
//! Every command is a compact `{t, d}` record, MessagePack-encoded. No
//! command expects a synchronous reply; all effects are observed through the
//! next state snapshot.

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Movement direction payload for `MOVE_START` / `MOVE_STOP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn as_wire(self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        }
    }
}

/// A discrete client command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    MoveStart(Direction),
    MoveStop(Direction),
    /// Fire the equipped weapon, optionally at a world-coordinate target.
    Shoot(Option<(f64, f64)>),
    ScannerState(bool),
    ChangeName(String),
    ChangeColor,
    Chat(String),
    Buy(String),
}

impl Command {
    pub fn wire_type(&self) -> &'static str {
        match self {
            Command::MoveStart(_) => "MOVE_START",
            Command::MoveStop(_) => "MOVE_STOP",
            Command::Shoot(_) => "SHOOT",
            Command::ScannerState(_) => "SCANNER_STATE",
            Command::ChangeName(_) => "CHANGE_NAME",
            Command::ChangeColor => "CHANGE_COLOR",
            Command::Chat(_) => "CHAT",
            Command::Buy(_) => "BUY",
        }
    }

    pub fn wire_payload(&self) -> String {
        match self {
            Command::MoveStart(dir) | Command::MoveStop(dir) => dir.as_wire().to_string(),
            Command::Shoot(Some((x, y))) => format!("{x:.2},{y:.2}"),
            Command::Shoot(None) => String::new(),
            Command::ScannerState(on) => on.to_string(),
            Command::ChangeName(name) | Command::Chat(name) | Command::Buy(name) => name.clone(),
            Command::ChangeColor => String::new(),
        }
    }
}

/// The on-wire shape of a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandFrame {
    pub t: String,
    pub d: String,
}

/// Encode a command as a MessagePack `{t, d}` map.
pub fn encode_command(command: &Command) -> Result<Vec<u8>, ProtocolError> {
    let frame = CommandFrame {
        t: command.wire_type().to_string(),
        d: command.wire_payload(),
    };
    // to_vec_named keeps struct fields as map keys, matching the server's
    // jackson-msgpack reader.
    Ok(rmp_serde::to_vec_named(&frame)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(command: &Command) -> CommandFrame {
        let bytes = encode_command(command).unwrap();
        rmp_serde::from_slice(&bytes).unwrap()
    }

    #[test]
    fn encodes_every_command_type() {
        let cases = [
            (Command::MoveStart(Direction::Up), "MOVE_START", "UP"),
            (Command::MoveStop(Direction::Left), "MOVE_STOP", "LEFT"),
            (Command::Shoot(None), "SHOOT", ""),
            (Command::ScannerState(true), "SCANNER_STATE", "true"),
            (Command::ScannerState(false), "SCANNER_STATE", "false"),
            (Command::ChangeName("Vega".into()), "CHANGE_NAME", "Vega"),
            (Command::ChangeColor, "CHANGE_COLOR", ""),
            (Command::Chat("gg".into()), "CHAT", "gg"),
            (Command::Buy("shield".into()), "BUY", "shield"),
        ];
        for (command, t, d) in cases {
            let frame = roundtrip(&command);
            assert_eq!(frame.t, t);
            assert_eq!(frame.d, d);
        }
    }

    #[test]
    fn shoot_target_is_formatted_with_two_decimals() {
        let frame = roundtrip(&Command::Shoot(Some((12.3456, 7.0))));
        assert_eq!(frame.d, "12.35,7.00");
    }

    #[test]
    fn frame_is_a_msgpack_map_with_string_keys() {
        // The server-side reader expects named fields, not a tuple.
        let bytes = encode_command(&Command::Chat("hi".into())).unwrap();
        let value: serde_json::Value = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(value["t"], "CHAT");
        assert_eq!(value["d"], "hi");
    }
}
