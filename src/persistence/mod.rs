//! Match persistence
//!
//! Features:
//! - `MatchRepository` seam: load by id, save
//! - Versioned JSON envelope, unknown versions rejected on load
//! - `InMemoryRepository` keeping serialized envelopes keyed by match id

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::engine::{Match, MatchId};
use crate::error::{EngineError, Result};

/// Current envelope format
pub const ENVELOPE_VERSION: u32 = 1;

/// Stored form of a match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub version: u32,
    #[serde(rename = "match")]
    pub game: Match,
}

impl Envelope {
    pub fn new(game: Match) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            game,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse an envelope, rejecting versions this build can't read
    pub fn from_json(json: &str) -> Result<Self> {
        let envelope: Self = serde_json::from_str(json)?;
        if envelope.version != ENVELOPE_VERSION {
            return Err(EngineError::Storage(format!(
                "unsupported envelope version {} (expected {ENVELOPE_VERSION})",
                envelope.version
            )));
        }
        Ok(envelope)
    }
}

/// Where matches live between requests
pub trait MatchRepository {
    fn load(&self, id: MatchId) -> Result<Match>;
    fn save(&mut self, game: &Match) -> Result<()>;
}

/// Repository holding serialized envelopes in memory
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    saves: HashMap<MatchId, String>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.saves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.saves.is_empty()
    }

    /// Raw stored JSON for a match
    pub fn raw(&self, id: MatchId) -> Option<&str> {
        self.saves.get(&id).map(String::as_str)
    }
}

impl MatchRepository for InMemoryRepository {
    fn load(&self, id: MatchId) -> Result<Match> {
        let json = self
            .saves
            .get(&id)
            .ok_or_else(|| EngineError::not_found(format!("match {id}")))?;
        Ok(Envelope::from_json(json)?.game)
    }

    fn save(&mut self, game: &Match) -> Result<()> {
        let json = Envelope::new(game.clone()).to_json()?;
        self.saves.insert(game.id, json);
        log::debug!("Saved match {}", game.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{NewPlayer, Turn, add_turn, create_match};
    use crate::settings::MatchSettings;

    fn played_match() -> Match {
        let m = create_match(
            MatchSettings::default(),
            vec![NewPlayer::human("Anna"), NewPlayer::bot("Bot", 45)],
        )
        .unwrap();
        add_turn(&m, &Turn::visit(100)).unwrap()
    }

    #[test]
    fn test_save_then_load_returns_same_match() {
        let m = played_match();
        let mut repo = InMemoryRepository::new();
        repo.save(&m).unwrap();
        assert_eq!(repo.load(m.id).unwrap(), m);
        assert!(repo.raw(m.id).unwrap().contains("\"version\":1"));
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo.load(uuid::Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn test_future_version_rejected() {
        let json = Envelope::new(played_match()).to_json().unwrap();
        let bumped = json.replacen("\"version\":1", "\"version\":2", 1);
        assert!(matches!(
            Envelope::from_json(&bumped),
            Err(EngineError::Storage(_))
        ));
    }
}
