//! Console command parsing.

use std::path::PathBuf;

use kiln_core::shortcut::KeyChord;

/// One parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    New,
    /// `open` with no path goes through the open dialog.
    Open(Option<PathBuf>),
    Save,
    /// `close` with no index closes the active tab.
    Close(Option<usize>),
    Tabs,
    Tab(usize),
    /// Replaces the active document's content.
    Edit(String),
    Ports,
    Connect(String),
    Disconnect,
    Read,
    Write(String),
    AutoRead,
    LineMode,
    Buffer,
    Build,
    Run,
    Info,
    ZoomIn,
    ZoomOut,
    Quit,
    Yes,
    No,
    /// A raw keyboard chord, routed through the shortcut table.
    Key(KeyChord),
    Help,
}

/// Parses one input line. Empty lines are `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb {
        "new" => Command::New,
        "open" => Command::Open((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "save" => Command::Save,
        "close" => Command::Close(parse_optional_index(rest)?),
        "tabs" => Command::Tabs,
        "tab" => Command::Tab(parse_index(rest)?),
        "edit" => Command::Edit(rest.to_string()),
        "ports" => Command::Ports,
        "connect" => {
            if rest.is_empty() {
                return Err("usage: connect <port>".to_string());
            }
            Command::Connect(rest.to_string())
        }
        "disconnect" => Command::Disconnect,
        "read" => Command::Read,
        "write" => Command::Write(rest.to_string()),
        "autoread" => Command::AutoRead,
        "linemode" => Command::LineMode,
        "buffer" => Command::Buffer,
        "build" => Command::Build,
        "run" => Command::Run,
        "info" => Command::Info,
        "zoom" => match rest {
            "in" => Command::ZoomIn,
            "out" => Command::ZoomOut,
            _ => return Err("usage: zoom in|out".to_string()),
        },
        "quit" | "exit" => Command::Quit,
        "yes" | "y" => Command::Yes,
        "no" | "n" => Command::No,
        "key" => Command::Key(parse_chord(rest)?),
        "help" => Command::Help,
        other => return Err(format!("unknown command: {other}")),
    };
    Ok(Some(command))
}

fn parse_index(text: &str) -> Result<usize, String> {
    text.parse()
        .map_err(|_| format!("not a tab index: {text:?}"))
}

fn parse_optional_index(text: &str) -> Result<Option<usize>, String> {
    if text.is_empty() {
        Ok(None)
    } else {
        parse_index(text).map(Some)
    }
}

/// Parses an emacs-style chord like `C-s` or `C-S-=`.
///
/// `C-` and `S-` prefixes set the modifiers; the remainder must be a single
/// character, so `C--` is Ctrl with the `-` key.
pub fn parse_chord(text: &str) -> Result<KeyChord, String> {
    let mut rest = text;
    let mut ctrl = false;
    let mut shift = false;
    loop {
        if let Some(tail) = rest.strip_prefix("C-")
            && tail.chars().count() >= 1
        {
            ctrl = true;
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("S-")
            && tail.chars().count() >= 1
        {
            shift = true;
            rest = tail;
        } else {
            break;
        }
    }
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(key), None) => Ok(KeyChord { ctrl, shift, key }),
        _ => Err(format!("not a key chord: {text:?}")),
    }
}
