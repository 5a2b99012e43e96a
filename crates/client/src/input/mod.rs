// Keyboard and pointer state with per-frame edge detection
//
// Event handlers only flip the booleans here; the game loop reads edges once
// per tick and emits the matching commands (MOVE_START on press, MOVE_STOP
// on release).

use glam::Vec2;
use protocol::Direction;

/// One key's pressed/previous pair.
#[derive(Default, Clone, Copy)]
pub struct KeyState {
    pub pressed: bool,
    prev: bool,
}

impl KeyState {
    pub fn just_pressed(&self) -> bool {
        self.pressed && !self.prev
    }

    pub fn just_released(&self) -> bool {
        !self.pressed && self.prev
    }

    fn roll(&mut self) {
        self.prev = self.pressed;
    }
}

#[derive(Default)]
pub struct Input {
    pub up: KeyState,
    pub down: KeyState,
    pub left: KeyState,
    pub right: KeyState,
    /// Space: fire the equipped weapon.
    pub shoot: KeyState,
    /// C: scanner toggle.
    pub scan: KeyState,
    pub enter: KeyState,
    pub mouse_pos: Vec2,
    /// Set by the mousedown handler, consumed once per tick.
    pub pending_click: Option<Vec2>,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a DOM key name to its movement direction, if any.
    pub fn direction_for_key(key: &str) -> Option<Direction> {
        match key {
            "w" | "W" | "ArrowUp" => Some(Direction::Up),
            "s" | "S" | "ArrowDown" => Some(Direction::Down),
            "a" | "A" | "ArrowLeft" => Some(Direction::Left),
            "d" | "D" | "ArrowRight" => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn direction_state(&mut self, direction: Direction) -> &mut KeyState {
        match direction {
            Direction::Up => &mut self.up,
            Direction::Down => &mut self.down,
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
        }
    }

    /// Movement keys with a press edge this frame.
    pub fn started_directions(&self) -> Vec<Direction> {
        self.edges(|k| k.just_pressed())
    }

    /// Movement keys with a release edge this frame.
    pub fn stopped_directions(&self) -> Vec<Direction> {
        self.edges(|k| k.just_released())
    }

    fn edges(&self, test: impl Fn(&KeyState) -> bool) -> Vec<Direction> {
        let mut out = Vec::new();
        for (state, direction) in [
            (&self.up, Direction::Up),
            (&self.down, Direction::Down),
            (&self.left, Direction::Left),
            (&self.right, Direction::Right),
        ] {
            if test(state) {
                out.push(direction);
            }
        }
        out
    }

    /// Roll current state into previous. Call once per tick, after edges
    /// have been read.
    pub fn roll_previous(&mut self) {
        self.up.roll();
        self.down.roll();
        self.left.roll();
        self.right.roll();
        self.shoot.roll();
        self.scan.roll();
        self.enter.roll();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_edge_fires_once() {
        let mut input = Input::new();
        input.up.pressed = true;
        assert_eq!(input.started_directions(), vec![Direction::Up]);
        input.roll_previous();
        // Held key: no new edge.
        assert!(input.started_directions().is_empty());
    }

    #[test]
    fn release_edge_fires_once() {
        let mut input = Input::new();
        input.left.pressed = true;
        input.roll_previous();
        input.left.pressed = false;
        assert_eq!(input.stopped_directions(), vec![Direction::Left]);
        input.roll_previous();
        assert!(input.stopped_directions().is_empty());
    }

    #[test]
    fn wasd_and_arrows_map_to_directions() {
        assert_eq!(Input::direction_for_key("w"), Some(Direction::Up));
        assert_eq!(Input::direction_for_key("ArrowDown"), Some(Direction::Down));
        assert_eq!(Input::direction_for_key("A"), Some(Direction::Left));
        assert_eq!(Input::direction_for_key("x"), None);
    }
}
