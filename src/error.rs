use std::collections::HashSet;

use thiserror::Error;

use crate::types::{FactionMatchup, Player, Role, GROUP_SIZE, VALID_POOL_SIZES};

#[derive(Error, Debug)]
pub enum MatchmakingError {
    #[error("Invalid number of players: {0}. Must be 12, 24, 36, or 48 players")]
    InvalidPlayerCount(usize),

    #[error("Duplicate player id: {0}")]
    DuplicatePlayer(String),

    #[error("Player {id} has {role:?} proficiency {value} outside [0, 10]")]
    ProficiencyOutOfRange { id: String, role: Role, value: f64 },

    #[error("Faction matchup table is empty")]
    EmptyFactionTable,

    #[error("Faction matchup {index} is malformed: {reason}")]
    MalformedFaction { index: usize, reason: String },

    #[error("Map catalog is empty")]
    EmptyMapCatalog,

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Coarse classification of a [`MatchmakingError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Configuration,
    Input,
}

impl MatchmakingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchmakingError::InvalidPlayerCount(_)
            | MatchmakingError::DuplicatePlayer(_)
            | MatchmakingError::ProficiencyOutOfRange { .. } => ErrorKind::Validation,
            MatchmakingError::EmptyFactionTable
            | MatchmakingError::MalformedFaction { .. }
            | MatchmakingError::EmptyMapCatalog => ErrorKind::Configuration,
            MatchmakingError::Parse(_) => ErrorKind::Input,
        }
    }
}

/// Number of groups for a pool of `count` players
pub fn validate_pool_size(count: usize) -> Result<usize, MatchmakingError> {
    if VALID_POOL_SIZES.contains(&count) {
        Ok(count / GROUP_SIZE)
    } else {
        Err(MatchmakingError::InvalidPlayerCount(count))
    }
}

/// Pool size, unique ids and proficiency range
pub fn validate_pool(players: &[Player]) -> Result<usize, MatchmakingError> {
    let groups = validate_pool_size(players.len())?;

    let mut seen = HashSet::with_capacity(players.len());
    for player in players {
        if !seen.insert(player.id.as_str()) {
            return Err(MatchmakingError::DuplicatePlayer(player.id.clone()));
        }
        for role in Role::ALL {
            let value = player.proficiency.get(role);
            if !value.is_finite() || !(0.0..=10.0).contains(&value) {
                return Err(MatchmakingError::ProficiencyOutOfRange {
                    id: player.id.clone(),
                    role,
                    value,
                });
            }
        }
    }

    Ok(groups)
}

pub fn validate_factions(factions: &[FactionMatchup]) -> Result<(), MatchmakingError> {
    if factions.is_empty() {
        return Err(MatchmakingError::EmptyFactionTable);
    }

    for (index, entry) in factions.iter().enumerate() {
        if entry.faction_a.trim().is_empty() || entry.faction_b.trim().is_empty() {
            return Err(MatchmakingError::MalformedFaction {
                index,
                reason: "faction name is blank".to_string(),
            });
        }
        if !entry.win_differential.is_finite() {
            return Err(MatchmakingError::MalformedFaction {
                index,
                reason: format!("win differential {} is not finite", entry.win_differential),
            });
        }
    }

    Ok(())
}

pub fn validate_maps(maps: &[String]) -> Result<(), MatchmakingError> {
    if maps.is_empty() {
        Err(MatchmakingError::EmptyMapCatalog)
    } else {
        Ok(())
    }
}
