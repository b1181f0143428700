//! Player settings and preferences
//!
//! Persisted in LocalStorage, separate from any run state.

use serde::{Deserialize, Serialize};

use crate::sim::Difficulty;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Difficulty selected on the menu at startup
    pub difficulty: Difficulty,
    /// Last successfully submitted username (prefills the game-over input)
    pub username: String,
    /// Leaderboard service base URL, without trailing slash
    pub api_base_url: String,
    /// Show FPS counter
    pub show_fps: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            username: String::new(),
            api_base_url: "http://localhost:5000".to_string(),
            show_fps: false,
        }
    }
}

impl Settings {
    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "flappy_kiro_settings";

    /// Endpoint for score submissions
    pub fn scores_url(&self) -> String {
        format!("{}/scores", self.api_base_url.trim_end_matches('/'))
    }

    /// Endpoint for the ranked list
    pub fn leaderboard_url(&self) -> String {
        format!("{}/leaderboard", self.api_base_url.trim_end_matches('/'))
    }

    /// Parse settings JSON, falling back to defaults for anything missing
    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Some(settings) = Self::from_json(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
