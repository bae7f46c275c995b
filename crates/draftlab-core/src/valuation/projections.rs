// Player projection loading from CSV.

use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::draft::pick::Position;
use crate::draft::player::{DraftStatus, Player, SEASON_WEEKS};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde struct (private)
// ---------------------------------------------------------------------------

/// One row of the player CSV. Numeric columns are read as loose JSON values
/// because blank cells are common and the flattened map below hands typed
/// fields whatever the CSV reader inferred. Weekly columns
/// (`week_1_points` .. `week_17_points`) and any unknown columns land in
/// `extra`.
#[derive(Debug, Deserialize)]
struct RawPlayerRow {
    id: Value,
    name: String,
    position: String,
    #[serde(default)]
    team: String,
    #[serde(default)]
    bye_week: Value,
    #[serde(default)]
    injury_status: String,
    #[serde(default)]
    adp: Value,
    #[serde(default)]
    player_rating: Value,
    #[serde(default)]
    team_offensive_rank: Value,
    #[serde(default)]
    team_defensive_rank: Value,
    #[serde(default)]
    matchup_rating: Value,
    #[serde(default)]
    drafted: Value,
    #[serde(default)]
    locked: Value,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Finite number from a cell, or None for blanks and junk.
fn number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn text(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn flag(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes"),
        _ => false,
    }
}

fn whole(v: &Value) -> Option<u32> {
    number(v)
        .filter(|n| *n >= 0.0 && n.fract() == 0.0)
        .map(|n| n as u32)
}

fn into_player(raw: RawPlayerRow) -> Result<Player, String> {
    let id = text(&raw.id);
    let name = raw.name.trim().to_string();
    if id.is_empty() {
        return Err(format!("player '{name}' has no id"));
    }

    let position = Position::from_str_pos(&raw.position)
        .filter(|p| *p != Position::Flex)
        .ok_or_else(|| format!("player '{name}' has unknown position '{}'", raw.position))?;

    let bye_week = whole(&raw.bye_week)
        .filter(|w| (1..=SEASON_WEEKS as u32 + 1).contains(w))
        .map(|w| w as u8);

    let mut weekly_projections = Vec::with_capacity(SEASON_WEEKS);
    for week in 1..=SEASON_WEEKS {
        let cell = raw.extra.get(&format!("week_{week}_points"));
        let points = match cell {
            None | Some(Value::Null) => 0.0,
            Some(Value::String(s)) if s.trim().is_empty() => 0.0,
            Some(v) => number(v)
                .ok_or_else(|| format!("player '{name}' has invalid week {week} projection"))?,
        };
        weekly_projections.push(points);
    }

    let status = match whole(&raw.drafted) {
        None => DraftStatus::Available,
        Some(code) => u8::try_from(code)
            .ok()
            .and_then(DraftStatus::from_code)
            .ok_or_else(|| format!("player '{name}' has invalid drafted code {code}"))?,
    };

    Ok(Player {
        id,
        name,
        position,
        team: raw.team.trim().to_string(),
        bye_week,
        injury_status: raw.injury_status.trim().to_uppercase(),
        weekly_projections,
        adp: number(&raw.adp),
        rating: number(&raw.player_rating),
        team_offensive_rank: whole(&raw.team_offensive_rank),
        team_defensive_rank: whole(&raw.team_defensive_rank),
        matchup_rating: number(&raw.matchup_rating),
        status,
        locked: flag(&raw.locked),
    })
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

/// Parse players from any reader. Malformed rows and duplicate ids are
/// skipped with a warning.
pub fn load_players_from_reader<R: Read>(rdr: R) -> Result<Vec<Player>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut players = Vec::new();
    let mut seen = HashSet::new();
    for result in reader.deserialize::<RawPlayerRow>() {
        match result {
            Ok(raw) => match into_player(raw) {
                Ok(player) => {
                    if !seen.insert(player.id.clone()) {
                        warn!("skipping duplicate player id '{}'", player.id);
                        continue;
                    }
                    players.push(player);
                }
                Err(reason) => warn!("skipping player row: {}", reason),
            },
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
            }
        }
    }
    Ok(players)
}

/// Load the player pool from a CSV file. An empty pool is an error.
pub fn load_players(path: &Path) -> Result<Vec<Player>, ProjectionError> {
    let file = std::fs::File::open(path).map_err(|e| ProjectionError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let players = load_players_from_reader(file).map_err(|e| ProjectionError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    if players.is_empty() {
        return Err(ProjectionError::Validation(format!(
            "no usable players in {}",
            path.display()
        )));
    }
    Ok(players)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
