//! Presentation of the server's `game_log`.
//!
//! The server reports rule violations as plain text inside the log, so entries are
//! styled by keyword. Anything unrecognised is styled as a success.

use furrow_protocol::PlayerId;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub const FAILURE_KEYWORDS: [&str; 6] = [
    "Insufficient",
    "Invalid",
    "Unknown",
    "not ready",
    "No crop to harvest",
    "is not vacant",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTone {
    Success,
    Error,
}

pub fn classify(entry: &str) -> LogTone {
    if FAILURE_KEYWORDS.iter().any(|k| entry.contains(k)) {
        LogTone::Error
    } else {
        LogTone::Success
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub text: String,
    pub tone: LogTone,
}

impl LogLine {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let tone = classify(&text);
        Self { text, tone }
    }

    pub fn is_error(&self) -> bool {
        self.tone == LogTone::Error
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogLayout {
    /// Single panel, every entry in server order.
    Combined,
    /// Even indices go to player 1, odd indices to player 2.
    Interleaved,
    /// Entries go to the player named in their `Day n, Player k:` prefix.
    #[default]
    ByPlayer,
}

impl FromStr for LogLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "combined" => Ok(Self::Combined),
            "interleaved" => Ok(Self::Interleaved),
            "by-player" => Ok(Self::ByPlayer),
            other => Err(format!(
                "unknown log layout {other:?} (expected combined, interleaved or by-player)"
            )),
        }
    }
}

impl fmt::Display for LogLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Combined => "combined",
            Self::Interleaved => "interleaved",
            Self::ByPlayer => "by-player",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogPanel {
    Combined,
    Player(PlayerId),
}

fn parity_owner(index: usize) -> PlayerId {
    if index % 2 == 0 {
        PlayerId::One
    } else {
        PlayerId::Two
    }
}

// None only if the pattern fails to compile; attribution then falls back to parity.
fn entry_prefix() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Day \d+, Player (\d+):").ok())
        .as_ref()
}

/// Player named by the server's entry prefix.
pub fn attribute(entry: &str) -> Option<PlayerId> {
    let caps = entry_prefix()?.captures(entry)?;
    caps.get(1)?
        .as_str()
        .parse::<u32>()
        .ok()
        .and_then(PlayerId::from_number)
}

fn owner(layout: LogLayout, index: usize, entry: &str) -> PlayerId {
    match layout {
        LogLayout::Interleaved => parity_owner(index),
        LogLayout::Combined | LogLayout::ByPlayer => {
            attribute(entry).unwrap_or_else(|| parity_owner(index))
        }
    }
}

/// Log panels for one snapshot, plus the tone of each player's latest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogBook {
    pub panels: Vec<(LogPanel, Vec<LogLine>)>,
    last_tone: [Option<LogTone>; 2],
}

impl LogBook {
    pub fn build(entries: &[String], layout: LogLayout) -> Self {
        let mut last_tone = [None, None];
        let mut per_player: [Vec<LogLine>; 2] = [Vec::new(), Vec::new()];
        let mut combined = Vec::new();

        for (i, entry) in entries.iter().enumerate() {
            let line = LogLine::new(entry.as_str());
            let who = owner(layout, i, entry);
            last_tone[who.index()] = Some(line.tone);
            match layout {
                LogLayout::Combined => combined.push(line),
                LogLayout::Interleaved | LogLayout::ByPlayer => per_player[who.index()].push(line),
            }
        }

        let panels = match layout {
            LogLayout::Combined => vec![(LogPanel::Combined, combined)],
            LogLayout::Interleaved | LogLayout::ByPlayer => {
                let [one, two] = per_player;
                vec![
                    (LogPanel::Player(PlayerId::One), one),
                    (LogPanel::Player(PlayerId::Two), two),
                ]
            }
        };

        Self { panels, last_tone }
    }

    /// Empty panels for the given layout.
    pub fn empty(layout: LogLayout) -> Self {
        Self::build(&[], layout)
    }

    pub fn last_entry_failed(&self, player: PlayerId) -> bool {
        self.last_tone[player.index()] == Some(LogTone::Error)
    }
}
