//! Copy text through the platform clipboard command.

use std::error::Error as StdError;
use std::fmt;
use std::io::{self, Write};
use std::process::{Command, Stdio};

#[cfg(target_os = "macos")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("pbcopy", &[])];
#[cfg(target_os = "windows")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("cmd", &["/C", "clip"])];
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

#[derive(Debug)]
pub enum ClipboardError {
    /// None of the known clipboard commands could be started.
    Unavailable,
    Failed { command: &'static str, source: io::Error },
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardError::Unavailable => {
                let names: Vec<&str> = CLIPBOARD_COMMANDS.iter().map(|(cmd, _)| *cmd).collect();
                write!(f, "no clipboard command found (tried {})", names.join(", "))
            }
            ClipboardError::Failed { command, source } => {
                write!(f, "clipboard command `{command}` failed: {source}")
            }
        }
    }
}

impl StdError for ClipboardError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ClipboardError::Failed { source, .. } => Some(source),
            ClipboardError::Unavailable => None,
        }
    }
}

/// Try each known command in turn; the first one that starts decides the
/// outcome.
pub fn copy_to_clipboard(text: &str) -> Result<(), ClipboardError> {
    for &(command, args) in CLIPBOARD_COMMANDS {
        let child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        let Ok(mut child) = child else {
            continue;
        };
        return feed_and_wait(&mut child, text).map_err(|source| ClipboardError::Failed {
            command,
            source,
        });
    }
    Err(ClipboardError::Unavailable)
}

fn feed_and_wait(child: &mut std::process::Child, text: &str) -> io::Result<()> {
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("exited with {status}")))
    }
}
