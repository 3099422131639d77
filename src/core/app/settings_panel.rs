//! Settings overlay: accent color, appearance, model and restore defaults.
//!
//! Every change is written to the store at once and re-themes the UI.

use tracing::debug;

use super::App;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Color,
    Appearance,
    Model,
    RestoreDefaults,
}

impl SettingsField {
    pub const ALL: [SettingsField; 4] = [
        SettingsField::Color,
        SettingsField::Appearance,
        SettingsField::Model,
        SettingsField::RestoreDefaults,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingsField::Color => "Theme color",
            SettingsField::Appearance => "Appearance",
            SettingsField::Model => "Model",
            SettingsField::RestoreDefaults => "Restore defaults",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsPanel {
    pub field: SettingsField,
}

impl Default for SettingsPanel {
    fn default() -> Self {
        Self {
            field: SettingsField::Color,
        }
    }
}

impl App {
    pub fn open_settings(&mut self) {
        self.commit_rename();
        self.sidebar.menu = None;
        self.settings_panel = Some(SettingsPanel::default());
    }

    pub fn close_settings(&mut self) {
        self.settings_panel = None;
    }

    pub fn settings_move(&mut self, delta: i32) {
        if let Some(panel) = self.settings_panel.as_mut() {
            let len = SettingsField::ALL.len() as i32;
            let current = SettingsField::ALL
                .iter()
                .position(|f| *f == panel.field)
                .unwrap_or(0) as i32;
            panel.field = SettingsField::ALL[(current + delta).rem_euclid(len) as usize];
        }
    }

    /// Step the highlighted value, or restore defaults on that row.
    pub fn settings_adjust(&mut self, forward: bool) {
        let Some(panel) = self.settings_panel else {
            return;
        };
        if self.chat.is_revealing() {
            self.ui.set_status("Settings can be changed once the reply has finished");
            return;
        }
        match panel.field {
            SettingsField::Color => self.settings.cycle_color(forward),
            SettingsField::Appearance => self.settings.cycle_appearance(forward),
            SettingsField::Model => {
                self.settings.cycle_model(forward);
                self.model_override = None;
            }
            SettingsField::RestoreDefaults => {
                self.settings.restore_defaults();
                self.model_override = None;
            }
        }
        debug!(
            color = %self.settings.selected_color,
            appearance = %self.settings.appearance,
            model = %self.settings.model,
            "Settings changed"
        );
        self.settings.save(self.store.as_ref());
        self.apply_theme();
    }
}
