//! Key bindings, resolved against what currently has the keyboard.
//!
//! Resolution is pure: a key plus a [`KeyContext`] yields the actions to
//! dispatch, or a request to forward the key to the input box.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::app::{App, AppAction, UiFocus};

/// Which surface owns the keyboard, innermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyContext {
    Settings,
    Rename,
    SidebarMenu,
    Sidebar,
    Input,
}

impl KeyContext {
    pub fn from_app(app: &App) -> Self {
        if app.settings_panel.is_some() {
            KeyContext::Settings
        } else if app.sidebar.rename.is_some() {
            KeyContext::Rename
        } else if app.sidebar.menu.is_some() {
            KeyContext::SidebarMenu
        } else if app.ui.focus == UiFocus::Sidebar && app.ui.show_sidebar {
            KeyContext::Sidebar
        } else {
            KeyContext::Input
        }
    }
}

#[derive(Debug)]
pub enum KeyResult {
    Actions(Vec<AppAction>),
    /// Hand the key to the text area.
    EditInput,
    NotHandled,
}

impl KeyResult {
    fn one(action: AppAction) -> Self {
        KeyResult::Actions(vec![action])
    }
}

pub fn resolve_key(context: KeyContext, key: &KeyEvent) -> KeyResult {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return KeyResult::one(AppAction::Quit);
    }

    match context {
        KeyContext::Settings => resolve_settings_key(key),
        KeyContext::Rename => {
            resolve_global_key(key).unwrap_or_else(|| resolve_rename_key(key))
        }
        KeyContext::SidebarMenu => resolve_menu_key(key),
        KeyContext::Sidebar => {
            resolve_global_key(key).unwrap_or_else(|| resolve_sidebar_key(key))
        }
        KeyContext::Input => resolve_global_key(key).unwrap_or_else(|| resolve_input_key(key)),
    }
}

/// Bindings that work everywhere outside the settings overlay.
fn resolve_global_key(key: &KeyEvent) -> Option<KeyResult> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    let action = match key.code {
        KeyCode::Char('b') if ctrl => AppAction::ToggleSidebar,
        KeyCode::Char('n') if ctrl => AppAction::NewChat,
        KeyCode::Char('o') if ctrl => AppAction::OpenSettings,
        KeyCode::Char('y') if ctrl => AppAction::CopyLastReply,
        KeyCode::PageUp => AppAction::PageUp,
        KeyCode::PageDown => AppAction::PageDown,
        KeyCode::End if ctrl || key.modifiers.is_empty() => AppAction::ScrollToBottom,
        KeyCode::Up if alt => AppAction::ScrollUp { lines: 1 },
        KeyCode::Down if alt => AppAction::ScrollDown { lines: 1 },
        KeyCode::Tab | KeyCode::BackTab => AppAction::ToggleFocus,
        KeyCode::Esc => AppAction::Escape,
        _ => return None,
    };
    Some(KeyResult::one(action))
}

fn resolve_input_key(key: &KeyEvent) -> KeyResult {
    let newline_modifier = key
        .modifiers
        .intersects(KeyModifiers::ALT | KeyModifiers::SHIFT);
    match key.code {
        KeyCode::Enter if !newline_modifier => KeyResult::one(AppAction::SubmitInput),
        _ => KeyResult::EditInput,
    }
}

fn resolve_sidebar_key(key: &KeyEvent) -> KeyResult {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => KeyResult::one(AppAction::SidebarMove { delta: -1 }),
        KeyCode::Down | KeyCode::Char('j') => KeyResult::one(AppAction::SidebarMove { delta: 1 }),
        KeyCode::Home => KeyResult::one(AppAction::SidebarMove { delta: i32::MIN }),
        KeyCode::Enter => KeyResult::one(AppAction::SidebarOpenSelected),
        KeyCode::Right | KeyCode::Char(' ') | KeyCode::Char('m') => {
            KeyResult::one(AppAction::SidebarToggleMenu)
        }
        _ => KeyResult::NotHandled,
    }
}

/// Menu keys drive the menu; any other key closes it first and then acts
/// as it would in the sidebar.
fn resolve_menu_key(key: &KeyEvent) -> KeyResult {
    match key.code {
        KeyCode::Up => KeyResult::one(AppAction::SidebarMenuMove { delta: -1 }),
        KeyCode::Down => KeyResult::one(AppAction::SidebarMenuMove { delta: 1 }),
        KeyCode::Enter => KeyResult::one(AppAction::SidebarMenuConfirm),
        KeyCode::Esc => KeyResult::one(AppAction::Escape),
        _ => {
            let mut actions = vec![AppAction::SidebarCloseMenu];
            let follow_up = resolve_global_key(key).unwrap_or_else(|| resolve_sidebar_key(key));
            if let KeyResult::Actions(more) = follow_up {
                // Toggling would reopen the menu that was just closed.
                actions.extend(
                    more.into_iter()
                        .filter(|a| !matches!(a, AppAction::SidebarToggleMenu)),
                );
            }
            KeyResult::Actions(actions)
        }
    }
}

fn resolve_rename_key(key: &KeyEvent) -> KeyResult {
    match key.code {
        KeyCode::Enter => KeyResult::one(AppAction::RenameCommit),
        KeyCode::Backspace => KeyResult::one(AppAction::RenameBackspace),
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            KeyResult::one(AppAction::RenameInput { ch })
        }
        _ => KeyResult::NotHandled,
    }
}

fn resolve_settings_key(key: &KeyEvent) -> KeyResult {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let action = match key.code {
        KeyCode::Esc => AppAction::Escape,
        KeyCode::Char('o') if ctrl => AppAction::CloseSettings,
        KeyCode::Up | KeyCode::BackTab => AppAction::SettingsMove { delta: -1 },
        KeyCode::Down | KeyCode::Tab => AppAction::SettingsMove { delta: 1 },
        KeyCode::Left => AppAction::SettingsAdjust { forward: false },
        KeyCode::Right | KeyCode::Enter | KeyCode::Char(' ') => {
            AppAction::SettingsAdjust { forward: true }
        }
        _ => return KeyResult::NotHandled,
    };
    KeyResult::one(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::create_test_app;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn actions(result: KeyResult) -> Vec<AppAction> {
        match result {
            KeyResult::Actions(actions) => actions,
            other => panic!("expected actions, got {other:?}"),
        }
    }

    #[test]
    fn enter_sends_and_alt_enter_edits() {
        assert!(matches!(
            actions(resolve_key(KeyContext::Input, &key(KeyCode::Enter))).as_slice(),
            [AppAction::SubmitInput]
        ));
        let alt_enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT);
        assert!(matches!(
            resolve_key(KeyContext::Input, &alt_enter),
            KeyResult::EditInput
        ));
        assert!(matches!(
            resolve_key(KeyContext::Input, &key(KeyCode::Char('x'))),
            KeyResult::EditInput
        ));
    }

    #[test]
    fn ctrl_c_quits_from_every_context() {
        for context in [
            KeyContext::Settings,
            KeyContext::Rename,
            KeyContext::SidebarMenu,
            KeyContext::Sidebar,
            KeyContext::Input,
        ] {
            assert!(matches!(
                actions(resolve_key(context, &ctrl('c'))).as_slice(),
                [AppAction::Quit]
            ));
        }
    }

    #[test]
    fn global_shortcuts_map_to_actions() {
        assert!(matches!(
            actions(resolve_key(KeyContext::Input, &ctrl('n'))).as_slice(),
            [AppAction::NewChat]
        ));
        assert!(matches!(
            actions(resolve_key(KeyContext::Sidebar, &ctrl('b'))).as_slice(),
            [AppAction::ToggleSidebar]
        ));
        assert!(matches!(
            actions(resolve_key(KeyContext::Input, &ctrl('y'))).as_slice(),
            [AppAction::CopyLastReply]
        ));
        assert!(matches!(
            actions(resolve_key(KeyContext::Input, &key(KeyCode::Tab))).as_slice(),
            [AppAction::ToggleFocus]
        ));
    }

    #[test]
    fn other_keys_close_the_menu() {
        let result = actions(resolve_key(KeyContext::SidebarMenu, &key(KeyCode::Char('j'))));
        assert!(matches!(
            result.as_slice(),
            [AppAction::SidebarCloseMenu, AppAction::SidebarMove { delta: 1 }]
        ));

        let result = actions(resolve_key(KeyContext::SidebarMenu, &key(KeyCode::Right)));
        assert!(matches!(result.as_slice(), [AppAction::SidebarCloseMenu]));
    }

    #[test]
    fn rename_captures_characters() {
        assert!(matches!(
            actions(resolve_key(KeyContext::Rename, &key(KeyCode::Char('j')))).as_slice(),
            [AppAction::RenameInput { ch: 'j' }]
        ));
        assert!(matches!(
            actions(resolve_key(KeyContext::Rename, &key(KeyCode::Enter))).as_slice(),
            [AppAction::RenameCommit]
        ));
    }

    #[test]
    fn settings_overlay_takes_arrow_keys() {
        assert!(matches!(
            actions(resolve_key(KeyContext::Settings, &key(KeyCode::Left))).as_slice(),
            [AppAction::SettingsAdjust { forward: false }]
        ));
        assert!(matches!(
            resolve_key(KeyContext::Settings, &ctrl('n')),
            KeyResult::NotHandled
        ));
    }

    #[test]
    fn context_follows_innermost_surface() {
        let mut app = create_test_app();
        assert_eq!(KeyContext::from_app(&app), KeyContext::Input);
        app.ui.focus = UiFocus::Sidebar;
        assert_eq!(KeyContext::from_app(&app), KeyContext::Sidebar);
        app.open_settings();
        assert_eq!(KeyContext::from_app(&app), KeyContext::Settings);
    }
}
