//! Platform light/dark preference, used when the appearance setting is
//! `system`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Light,
    Dark,
}

/// Best-effort OS hint. `None` when the platform offers no signal.
pub fn detect_preferred_appearance() -> Option<Appearance> {
    #[cfg(target_os = "macos")]
    {
        use std::process::Command;
        // A missing AppleInterfaceStyle key (non-zero exit) means light mode.
        let output = Command::new("/usr/bin/defaults")
            .args(["read", "-g", "AppleInterfaceStyle"])
            .output()
            .ok()?;
        if !output.status.success() {
            return Some(Appearance::Light);
        }
        return Some(appearance_from_apple_style(&String::from_utf8_lossy(
            &output.stdout,
        )));
    }

    #[cfg(target_os = "windows")]
    {
        use winreg::enums::HKEY_CURRENT_USER;
        use winreg::RegKey;
        let personalize = RegKey::predef(HKEY_CURRENT_USER)
            .open_subkey("Software\\Microsoft\\Windows\\CurrentVersion\\Themes\\Personalize")
            .ok()?;
        let apps_use_light: u32 = personalize.get_value("AppsUseLightTheme").ok()?;
        return Some(if apps_use_light == 0 {
            Appearance::Dark
        } else {
            Appearance::Light
        });
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(scheme) = gsettings_value("color-scheme") {
            if let Some(appearance) = appearance_from_color_scheme(&scheme) {
                return Some(appearance);
            }
        }
        // Older GNOME: dark variants carry "-dark" in the GTK theme name.
        gsettings_value("gtk-theme").map(|theme| appearance_from_gtk_theme(&theme))
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}

#[cfg(target_os = "linux")]
fn gsettings_value(key: &str) -> Option<String> {
    let output = std::process::Command::new("gsettings")
        .args(["get", "org.gnome.desktop.interface", key])
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).to_ascii_lowercase())
}

#[cfg_attr(not(any(test, target_os = "macos")), allow(dead_code))]
fn appearance_from_apple_style(value: &str) -> Appearance {
    if value.to_ascii_lowercase().contains("dark") {
        Appearance::Dark
    } else {
        Appearance::Light
    }
}

#[cfg_attr(not(any(test, target_os = "linux")), allow(dead_code))]
fn appearance_from_color_scheme(value: &str) -> Option<Appearance> {
    let value = value.to_ascii_lowercase();
    if value.contains("prefer-dark") {
        Some(Appearance::Dark)
    } else if value.contains("prefer-light") || value.contains("default") {
        Some(Appearance::Light)
    } else {
        None
    }
}

#[cfg_attr(not(any(test, target_os = "linux")), allow(dead_code))]
fn appearance_from_gtk_theme(value: &str) -> Appearance {
    if value.to_ascii_lowercase().contains("-dark") {
        Appearance::Dark
    } else {
        Appearance::Light
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_gnome_color_scheme() {
        assert_eq!(
            appearance_from_color_scheme("'prefer-dark'\n"),
            Some(Appearance::Dark)
        );
        assert_eq!(appearance_from_color_scheme("'default'"), Some(Appearance::Light));
        assert_eq!(appearance_from_color_scheme("''"), None);
    }

    #[test]
    fn reads_legacy_theme_names() {
        assert_eq!(appearance_from_gtk_theme("'Adwaita-dark'"), Appearance::Dark);
        assert_eq!(appearance_from_gtk_theme("'Yaru'"), Appearance::Light);
        assert_eq!(appearance_from_apple_style("Dark\n"), Appearance::Dark);
    }
}
