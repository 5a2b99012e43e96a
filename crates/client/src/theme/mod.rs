// Color themes and their persistence.
//
// The selected theme id is kept under a single localStorage key; absence
// falls back to NET_RUNNER. Switching themes invalidates every sprite and
// light cache, so it goes through GameClient rather than being applied here.

/// localStorage key holding the selected theme id.
pub const THEME_STORAGE_KEY: &str = "starlance-theme";
pub const DEFAULT_THEME_ID: &str = "NET_RUNNER";

/// One color scheme. All values are CSS color strings so they can be handed
/// to canvas fill/stroke styles and CSS variables alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub id: &'static str,
    pub bg: &'static str,
    pub fg: &'static str,
    pub panel_bg: &'static str,
    pub border: &'static str,
    pub accent: &'static str,
    pub success: &'static str,
    pub danger: &'static str,
    pub warning: &'static str,
    pub muted: &'static str,
    pub grid: &'static str,
}

pub const THEMES: &[Theme] = &[
    Theme {
        id: "GITHUB_DARK",
        bg: "#0d1117",
        fg: "#c9d1d9",
        panel_bg: "rgba(13, 17, 23, 0.95)",
        border: "#30363d",
        accent: "#58a6ff",
        success: "#3fb950",
        danger: "#f85149",
        warning: "#d29922",
        muted: "#8b949e",
        grid: "#161b22",
    },
    Theme {
        id: "NET_RUNNER",
        bg: "#010409",
        fg: "#c9d1d9",
        panel_bg: "rgba(1, 4, 9, 0.95)",
        border: "#30363d",
        accent: "#58a6ff",
        success: "#3fb950",
        danger: "#f85149",
        warning: "#d29922",
        muted: "#8b949e",
        grid: "#0d1117",
    },
];

/// Look up a theme by id, defaulting when the id is unknown.
pub fn by_id(id: &str) -> &'static Theme {
    THEMES
        .iter()
        .find(|t| t.id == id)
        .unwrap_or_else(|| by_id(DEFAULT_THEME_ID))
}

/// The theme after `id` in cycle order (the theme-selector click target).
pub fn next_id(id: &str) -> &'static str {
    let index = THEMES.iter().position(|t| t.id == id).unwrap_or(0);
    THEMES[(index + 1) % THEMES.len()].id
}

/// Read the persisted theme id, falling back to the default.
pub fn load_persisted_id() -> String {
    let stored = web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .and_then(|s| s.get_item(THEME_STORAGE_KEY).ok().flatten());
    stored.unwrap_or_else(|| DEFAULT_THEME_ID.to_string())
}

/// Persist the theme id. Best-effort; storage may be unavailable.
pub fn persist_id(id: &str) {
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        let _ = storage.set_item(THEME_STORAGE_KEY, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_id_falls_back_to_default() {
        assert_eq!(by_id("NOT_A_THEME").id, DEFAULT_THEME_ID);
    }

    #[test]
    fn next_id_cycles_through_all_themes() {
        let mut id = THEMES[0].id;
        for _ in 0..THEMES.len() {
            id = next_id(id);
        }
        assert_eq!(id, THEMES[0].id);
    }
}
