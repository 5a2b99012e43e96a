// HUD / DOM layer - status tag, player stats, event log, nearby list, theme
//
// Everything here is a read-only projection of client state onto DOM nodes;
// nothing feeds back into the simulation except through the command
// interface wired up in lib.rs.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, HtmlInputElement};

use protocol::Entity;

use crate::scanner::AU_IN_CELLS;
use crate::theme::Theme;
use crate::world::World;

/// The log view keeps at most this many entries; the oldest are evicted.
pub const LOG_CAP: usize = 50;
/// Nearby-entity list length, self included.
const PLAYER_LIST_CAP: usize = 8;
const XP_BAR_CELLS: usize = 10;

/// One colored run of a log message. `color` is None for default-styled
/// text.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupRun {
    pub color: Option<String>,
    pub text: String,
}

/// Split a log line on `[#RRGGBB]` inline color markers. The marker colors
/// everything up to the next marker (or the end of the line).
pub fn parse_markup(message: &str) -> Vec<MarkupRun> {
    let mut runs = Vec::new();
    let mut color: Option<String> = None;
    let mut rest = message;

    while let Some(start) = rest.find("[#") {
        let candidate = &rest[start..];
        // A marker is exactly "[#" + 6 hex digits + "]".
        let is_marker = candidate.len() >= 9
            && candidate.as_bytes()[8] == b']'
            && candidate[2..8].bytes().all(|b| b.is_ascii_hexdigit());
        if !is_marker {
            // Leave a literal bracket alone, keep scanning after it.
            let (head, tail) = rest.split_at(start + 2);
            if !head.is_empty() {
                runs.push(MarkupRun {
                    color: color.clone(),
                    text: head.to_string(),
                });
            }
            rest = tail;
            continue;
        }

        if start > 0 {
            runs.push(MarkupRun {
                color: color.clone(),
                text: rest[..start].to_string(),
            });
        }
        color = Some(candidate[1..8].to_string());
        rest = &candidate[9..];
    }
    if !rest.is_empty() {
        runs.push(MarkupRun {
            color,
            text: rest.to_string(),
        });
    }
    runs
}

/// HP readout: one bar per hit point, or the reboot banner at zero.
pub fn hp_bars(hp: f64) -> String {
    let hp = hp.max(0.0) as usize;
    if hp == 0 {
        "REBOOTING...".to_string()
    } else {
        "|".repeat(hp)
    }
}

pub fn shield_bars(shield: f64) -> String {
    let shield = shield.max(0.0) as usize;
    if shield == 0 {
        "EMPTY".to_string()
    } else {
        "(".repeat(shield)
    }
}

/// Character progress bar toward the next level (`level * 500` exp needed).
pub fn xp_bar(level: i64, exp: i64) -> String {
    let needed = (level.max(1) * 500) as f64;
    let percent = ((exp.max(0) as f64 / needed) * 100.0).floor().min(100.0);
    let filled = ((percent / 100.0) * XP_BAR_CELLS as f64).floor() as usize;
    format!(
        "{}{} {percent:.0}%",
        "■".repeat(filled),
        "□".repeat(XP_BAR_CELLS - filled)
    )
}

pub struct Ui {
    document: Document,
}

impl Ui {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn get_el(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn set_text(&self, id: &str, text: &str) {
        if let Some(el) = self.get_el(id) {
            el.set_text_content(Some(text));
        }
    }

    /// Connection status tag in the HUD header.
    pub fn set_status(&self, text: &str, connected: bool) {
        if let Some(el) = self.get_el("connection-status") {
            el.set_text_content(Some(text));
            el.set_class_name(if connected {
                "status-tag connected"
            } else {
                "status-tag disconnected"
            });
        }
    }

    pub fn set_latency(&self, ms: f64) {
        self.set_text("latency", &format!("{ms:.0}ms"));
    }

    pub fn set_fps(&self, fps: u32) {
        self.set_text("fps", &fps.to_string());
    }

    pub fn set_player_name(&self, name: &str) {
        self.set_text("player-name", name);
    }

    /// Refresh the local-entity stat readouts from the latest snapshot.
    pub fn update_player_panel(&self, me: &Entity) {
        self.set_text("player-name", &me.name);
        if let Some(el) = self.get_el("player-color-indicator") {
            if let Ok(el) = el.dyn_into::<HtmlElement>() {
                let _ = el.style().set_property("color", &me.color);
            }
        }

        let hp = me.hp.unwrap_or(0.0);
        if let Some(el) = self.get_el("player-hp") {
            el.set_text_content(Some(&hp_bars(hp)));
            el.set_class_name("danger");
        }
        self.set_text("player-shield", &shield_bars(me.shield.unwrap_or(0.0)));

        let level = me.level.unwrap_or(1).max(1);
        self.set_text("player-level", &level.to_string());
        self.set_text("player-xp", &xp_bar(level, me.exp.unwrap_or(0)));

        self.set_text("player-copper", &me.copper.unwrap_or(0).to_string());
        self.set_text("player-silver", &me.silver.unwrap_or(0).to_string());
        self.set_text("player-gold", &me.gold.unwrap_or(0).to_string());

        if let Some(weapon) = &me.weapon {
            self.set_text("player-weapon", &weapon.name);
        }

        let speed = me
            .velocity()
            .map(|v| v.length() as f64 * 100.0)
            .unwrap_or(0.0);
        self.set_text("player-speed", &format!("{speed:.2}"));
        // Thrust is halved while the scanner draws power.
        let accel = if me.scanner_active.unwrap_or(false) {
            0.006
        } else {
            0.012
        };
        self.set_text("player-accel", &format!("{:.2}", accel * 100.0));

        // Operational status follows the reboot state.
        if hp <= 0.0 {
            self.set_status("REBOOTING", false);
        } else {
            self.set_status("OPERATIONAL", true);
        }
    }

    /// Append one entry to the event log, honoring `[#RRGGBB]` markup and
    /// evicting the oldest entry past the cap.
    pub fn log(&self, message: &str) {
        let Some(logs) = self.get_el("logs") else {
            return;
        };
        let Ok(entry) = self.document.create_element("div") else {
            return;
        };
        entry.set_class_name("log-entry");

        let _ = entry.append_child(&self.document.create_text_node("> "));
        for run in parse_markup(message) {
            match run.color {
                Some(color) => {
                    if let Ok(span) = self.document.create_element("span") {
                        if let Ok(span) = span.dyn_into::<HtmlElement>() {
                            let _ = span.style().set_property("color", &color);
                            span.set_text_content(Some(&run.text));
                            let _ = entry.append_child(&span);
                        }
                    }
                }
                None => {
                    let _ = entry.append_child(&self.document.create_text_node(&run.text));
                }
            }
        }

        let _ = logs.append_child(&entry);
        while logs.child_element_count() as usize > LOG_CAP {
            if let Some(first) = logs.first_element_child() {
                first.remove();
            } else {
                break;
            }
        }
        logs.set_scroll_top(logs.scroll_height());
    }

    /// Ranked nearby-entity list: self first, then combat entities by
    /// distance, capped.
    pub fn update_player_list(&self, world: &World) {
        let Some(list) = self.get_el("player-list") else {
            return;
        };
        let local_id = world.local_id();
        let me = world.local();

        let mut players: Vec<&Entity> = world.iter().filter(|e| e.is_combat()).collect();
        match me {
            Some(me) => {
                players.sort_by(|a, b| {
                    if Some(a.id.as_str()) == local_id {
                        return std::cmp::Ordering::Less;
                    }
                    if Some(b.id.as_str()) == local_id {
                        return std::cmp::Ordering::Greater;
                    }
                    let da = me.position.distance(&a.position);
                    let db = me.position.distance(&b.position);
                    da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                });
            }
            None => {
                players.sort_by_key(|e| std::cmp::Reverse(e.score.unwrap_or(0)));
            }
        }
        players.truncate(PLAYER_LIST_CAP);

        list.set_text_content(None);
        for player in players {
            let Ok(entry) = self.document.create_element("div") else {
                continue;
            };
            entry.set_class_name(if Some(player.id.as_str()) == local_id {
                "player-entry accent"
            } else {
                "player-entry"
            });

            if let Ok(name_span) = self.document.create_element("span") {
                if let Ok(name_span) = name_span.dyn_into::<HtmlElement>() {
                    let _ = name_span.style().set_property("color", &player.color);
                    name_span.set_text_content(Some(&player.name));
                    let _ = entry.append_child(&name_span);
                }
            }
            if let Some(me) = me {
                if Some(player.id.as_str()) != local_id {
                    if let Ok(dist_span) = self.document.create_element("span") {
                        dist_span.set_class_name("muted");
                        let au = me.position.distance(&player.position) / AU_IN_CELLS;
                        dist_span.set_text_content(Some(&format!(" {au:.2} AU")));
                        let _ = entry.append_child(&dist_span);
                    }
                }
            }
            if let Ok(score_span) = self.document.create_element("span") {
                score_span.set_class_name("accent");
                score_span.set_text_content(Some(&player.score.unwrap_or(0).to_string()));
                let _ = entry.append_child(&score_span);
            }
            let _ = list.append_child(&entry);
        }
    }

    pub fn focus_chat_input(&self) {
        if let Some(input) = self.get_el("chat-input") {
            if let Ok(input) = input.dyn_into::<HtmlInputElement>() {
                let _ = input.focus();
            }
        }
    }

    /// Push a theme's palette into the page's CSS variables and name it on
    /// the selector button.
    pub fn apply_theme(&self, theme: &Theme) -> Result<(), JsValue> {
        if let Some(root) = self.document.document_element() {
            if let Ok(root) = root.dyn_into::<HtmlElement>() {
                let style = root.style();
                style.set_property("--bg", theme.bg)?;
                style.set_property("--fg", theme.fg)?;
                style.set_property("--panel-bg", theme.panel_bg)?;
                style.set_property("--border", theme.border)?;
                style.set_property("--accent", theme.accent)?;
                style.set_property("--success", theme.success)?;
                style.set_property("--danger", theme.danger)?;
                style.set_property("--warning", theme.warning)?;
                style.set_property("--muted", theme.muted)?;
                style.set_property("--grid", theme.grid)?;
            }
        }
        self.set_text("theme-selector", theme.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_splits_colored_runs() {
        let runs = parse_markup("Welcome, agent [#58a6ff]Vega");
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].color, None);
        assert_eq!(runs[0].text, "Welcome, agent ");
        assert_eq!(runs[1].color.as_deref(), Some("#58a6ff"));
        assert_eq!(runs[1].text, "Vega");
    }

    #[test]
    fn markup_color_extends_to_next_marker() {
        let runs = parse_markup("[#f85149]boom[#3fb950]ok");
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].color.as_deref(), Some("#f85149"));
        assert_eq!(runs[0].text, "boom");
        assert_eq!(runs[1].color.as_deref(), Some("#3fb950"));
        assert_eq!(runs[1].text, "ok");
    }

    #[test]
    fn plain_text_and_literal_brackets_survive() {
        let runs = parse_markup("no markup here");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].color, None);

        let runs = parse_markup("array[#3] is not a marker");
        let text: String = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(text, "array[#3] is not a marker");
    }

    #[test]
    fn hp_and_shield_bars() {
        assert_eq!(hp_bars(3.0), "|||");
        assert_eq!(hp_bars(0.0), "REBOOTING...");
        assert_eq!(hp_bars(-1.0), "REBOOTING...");
        assert_eq!(shield_bars(2.0), "((");
        assert_eq!(shield_bars(0.0), "EMPTY");
    }

    #[test]
    fn xp_bar_fills_with_progress() {
        assert_eq!(xp_bar(1, 0), "□□□□□□□□□□ 0%");
        assert_eq!(xp_bar(1, 250), "■■■■■□□□□□ 50%");
        assert_eq!(xp_bar(1, 500), "■■■■■■■■■■ 100%");
    }
}
