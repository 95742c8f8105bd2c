use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub const ALL: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    pub fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    pub fn from_number(n: u32) -> Option<Self> {
        match n {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => f.write_str("Player 1"),
            Self::Two => f.write_str("Player 2"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
}

/// One simulated day pushed by `POST /start_game`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameTick {
    pub day: u32,
    #[serde(default)]
    pub game_over: bool,
    #[serde(
        default,
        deserialize_with = "lenient_action",
        skip_serializing_if = "Option::is_none"
    )]
    pub player1_action: Option<Action>,
    #[serde(
        default,
        deserialize_with = "lenient_action",
        skip_serializing_if = "Option::is_none"
    )]
    pub player2_action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player1_score: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player2_score: Option<Number>,
}

impl GameTick {
    pub fn day(day: u32) -> Self {
        Self {
            day,
            game_over: false,
            player1_action: None,
            player2_action: None,
            message: None,
            winner: None,
            player1_score: None,
            player2_score: None,
        }
    }

    pub fn action(&self, player: PlayerId) -> Option<&Action> {
        match player {
            PlayerId::One => self.player1_action.as_ref(),
            PlayerId::Two => self.player2_action.as_ref(),
        }
    }

    /// Final result carried by the terminal tick, if the server sent one.
    pub fn outcome(&self) -> Option<GameOutcome> {
        if !self.game_over {
            return None;
        }
        let winner = self.winner.clone()?;
        Some(GameOutcome {
            day: self.day,
            winner,
            player1_score: self.player1_score.clone(),
            player2_score: self.player2_score.clone(),
        })
    }
}

// The server seeds both actions with "" before the first decision, so anything
// that is not an object means "no action this day".
fn lenient_action<'de, D>(deserializer: D) -> Result<Option<Action>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    if !raw.is_object() {
        return Ok(None);
    }
    serde_json::from_value(raw)
        .map(Some)
        .map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub day: u32,
    pub winner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player1_score: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player2_score: Option<Number>,
}

impl GameOutcome {
    pub fn score(&self, player: PlayerId) -> Option<&Number> {
        match player {
            PlayerId::One => self.player1_score.as_ref(),
            PlayerId::Two => self.player2_score.as_ref(),
        }
    }
}

/// Full snapshot served by `GET /game_state`. Every fetch replaces the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub current_day: u32,
    pub player1: PlayerState,
    pub player2: PlayerState,
    #[serde(default)]
    pub game_log: Vec<String>,
    #[serde(default)]
    pub game_over: bool,
}

impl GameState {
    pub fn player(&self, player: PlayerId) -> &PlayerState {
        match player {
            PlayerId::One => &self.player1,
            PlayerId::Two => &self.player2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub season: String,
    pub weather: String,
    pub money: Number,
    pub energy: Number,
    #[serde(default)]
    pub plots: Vec<Plot>,
    #[serde(default)]
    pub harvested_crops: BTreeMap<String, Number>,
    #[serde(default)]
    pub upgrades: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    pub soil_quality: f64,
    #[serde(default)]
    pub crop: Option<Crop>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub growth_progress: f64,
}

pub mod routes {
    pub const START_GAME: &str = "/start_game";
    pub const STOP_GAME: &str = "/stop_game";
    pub const GAME_STATE: &str = "/game_state";
}
