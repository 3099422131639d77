//! User preferences: accent color, appearance and model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::storage::{load_json, save_json, KeyValueStore, SETTINGS_KEY};

pub const THEME_COLORS: [&str; 5] = ["#5645ee", "#dc2626", "#ca8a04", "#2563eb", "#16a34a"];

pub const MODELS: [&str; 5] = [
    "llama3-8b-8192",
    "llama3-70b-8192",
    "llama-3.2-1b-preview",
    "llama-3.2-3b-preview",
    "mixtral-8x7b-32768",
];

pub const DEFAULT_COLOR: &str = THEME_COLORS[0];
pub const DEFAULT_MODEL: &str = MODELS[0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppearanceMode {
    #[default]
    System,
    Dark,
    Light,
}

impl AppearanceMode {
    pub const ALL: [AppearanceMode; 3] = [
        AppearanceMode::System,
        AppearanceMode::Dark,
        AppearanceMode::Light,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppearanceMode::System => "system",
            AppearanceMode::Dark => "dark",
            AppearanceMode::Light => "light",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AppearanceMode::System => "System",
            AppearanceMode::Dark => "Dark",
            AppearanceMode::Light => "Light",
        }
    }
}

impl fmt::Display for AppearanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppearanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(AppearanceMode::System),
            "dark" => Ok(AppearanceMode::Dark),
            "light" => Ok(AppearanceMode::Light),
            other => Err(format!(
                "unknown appearance '{other}' (expected system, dark or light)"
            )),
        }
    }
}

/// Persisted as `{"selectedColor", "appearance", "model"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub selected_color: String,
    pub appearance: AppearanceMode,
    pub model: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            selected_color: DEFAULT_COLOR.to_string(),
            appearance: AppearanceMode::System,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Settings {
    /// Read persisted settings, falling back to defaults for anything
    /// missing, malformed or outside the offered choices.
    pub fn load(store: &dyn KeyValueStore) -> Settings {
        let settings = match load_json::<Settings>(store, SETTINGS_KEY) {
            Ok(Some(settings)) => settings,
            Ok(None) => return Settings::default(),
            Err(err) => {
                warn!(error = %err, "Using default settings");
                return Settings::default();
            }
        };
        settings.sanitized()
    }

    pub fn save(&self, store: &dyn KeyValueStore) {
        if let Err(err) = save_json(store, SETTINGS_KEY, self) {
            warn!(error = %err, "Failed to persist settings");
        }
    }

    fn sanitized(mut self) -> Self {
        let color = self.selected_color.to_ascii_lowercase();
        if THEME_COLORS.contains(&color.as_str()) {
            self.selected_color = color;
        } else {
            warn!(color = %self.selected_color, "Unknown theme color; using default");
            self.selected_color = DEFAULT_COLOR.to_string();
        }
        if !MODELS.contains(&self.model.as_str()) {
            warn!(model = %self.model, "Unknown model; using default");
            self.model = DEFAULT_MODEL.to_string();
        }
        self
    }

    pub fn set_color(&mut self, color: &str) -> Result<(), String> {
        let color = color.trim().to_ascii_lowercase();
        if !THEME_COLORS.contains(&color.as_str()) {
            return Err(format!(
                "unknown color '{color}' (expected one of {})",
                THEME_COLORS.join(", ")
            ));
        }
        self.selected_color = color;
        Ok(())
    }

    pub fn set_model(&mut self, model: &str) -> Result<(), String> {
        let model = model.trim();
        if !MODELS.contains(&model) {
            return Err(format!(
                "unknown model '{model}' (expected one of {})",
                MODELS.join(", ")
            ));
        }
        self.model = model.to_string();
        Ok(())
    }

    pub fn restore_defaults(&mut self) {
        *self = Settings::default();
    }

    /// Step the accent color through the palette.
    pub fn cycle_color(&mut self, forward: bool) {
        let current = THEME_COLORS
            .iter()
            .position(|c| *c == self.selected_color)
            .unwrap_or(0);
        let next = cycle_index(current, THEME_COLORS.len(), forward);
        self.selected_color = THEME_COLORS[next].to_string();
    }

    pub fn cycle_appearance(&mut self, forward: bool) {
        let current = AppearanceMode::ALL
            .iter()
            .position(|m| *m == self.appearance)
            .unwrap_or(0);
        let next = cycle_index(current, AppearanceMode::ALL.len(), forward);
        self.appearance = AppearanceMode::ALL[next];
    }

    pub fn cycle_model(&mut self, forward: bool) {
        let current = MODELS.iter().position(|m| *m == self.model).unwrap_or(0);
        self.model = MODELS[cycle_index(current, MODELS.len(), forward)].to_string();
    }

    pub fn print_all(&self) {
        println!("Current settings:");
        println!("  color: {}", self.selected_color);
        println!("  appearance: {}", self.appearance);
        println!("  model: {}", self.model);
    }
}

fn cycle_index(current: usize, len: usize, forward: bool) -> usize {
    if forward {
        (current + 1) % len
    } else {
        (current + len - 1) % len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::MemoryStore;

    #[test]
    fn absent_settings_use_defaults() {
        let store = MemoryStore::new();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn settings_use_camel_case_field_names() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert_eq!(
            json,
            r##"{"selectedColor":"#5645ee","appearance":"system","model":"llama3-8b-8192"}"##
        );
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = MemoryStore::new();
        let mut settings = Settings::default();
        settings.set_color("#2563EB").unwrap();
        settings.appearance = AppearanceMode::Light;
        settings.set_model("mixtral-8x7b-32768").unwrap();
        settings.save(&store);

        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn malformed_settings_fall_back_to_defaults() {
        let store = MemoryStore::with_value(SETTINGS_KEY, "not json");
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn unknown_values_are_replaced_individually() {
        let store = MemoryStore::with_value(
            SETTINGS_KEY,
            r##"{"selectedColor":"#000000","appearance":"dark","model":"gpt-9"}"##,
        );
        let settings = Settings::load(&store);
        assert_eq!(settings.selected_color, DEFAULT_COLOR);
        assert_eq!(settings.appearance, AppearanceMode::Dark);
        assert_eq!(settings.model, DEFAULT_MODEL);
    }

    #[test]
    fn cycling_wraps_in_both_directions() {
        let mut settings = Settings::default();
        settings.cycle_color(false);
        assert_eq!(settings.selected_color, "#16a34a");
        settings.cycle_color(true);
        assert_eq!(settings.selected_color, DEFAULT_COLOR);

        settings.cycle_appearance(false);
        assert_eq!(settings.appearance, AppearanceMode::Light);
        settings.cycle_model(true);
        assert_eq!(settings.model, "llama3-70b-8192");
    }

    #[test]
    fn rejects_values_outside_the_palette() {
        let mut settings = Settings::default();
        assert!(settings.set_color("#ffffff").is_err());
        assert!(settings.set_model("gpt-4o").is_err());
        assert_eq!(settings, Settings::default());
        assert!("sepia".parse::<AppearanceMode>().is_err());
    }
}
