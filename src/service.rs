//! Id-keyed match service
//!
//! Every call loads the match, applies one engine operation and saves the
//! result. Mutations take `&mut self`, so requests through one service are
//! serialized; nothing is saved when the operation fails.

use crate::bot;
use crate::engine::{
    self, EditRequest, Match, MatchId, MatchProgress, NewPlayer, Statistics, Turn,
};
use crate::error::Result;
use crate::persistence::MatchRepository;
use crate::settings::MatchSettings;

pub struct MatchService<R: MatchRepository> {
    repo: R,
}

impl<R: MatchRepository> MatchService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn get(&self, id: MatchId) -> Result<Match> {
        self.repo.load(id)
    }

    pub fn create(&mut self, settings: MatchSettings, players: Vec<NewPlayer>) -> Result<Match> {
        let m = engine::create_match(settings, players)?;
        self.repo.save(&m)?;
        Ok(m)
    }

    fn mutate(&mut self, id: MatchId, op: impl FnOnce(&Match) -> Result<Match>) -> Result<Match> {
        let current = self.repo.load(id)?;
        let next = op(&current)?;
        self.repo.save(&next)?;
        Ok(next)
    }

    pub fn add_turn(&mut self, id: MatchId, turn: Turn) -> Result<Match> {
        self.mutate(id, |m| engine::add_turn(m, &turn))
    }

    pub fn edit_turn(&mut self, id: MatchId, request: EditRequest) -> Result<Match> {
        self.mutate(id, |m| engine::edit_turn(m, &request))
    }

    pub fn delete_last_turn(&mut self, id: MatchId) -> Result<Match> {
        self.mutate(id, engine::delete_last_turn)
    }

    /// Simulated bot visit, not yet recorded
    pub fn create_dart_bot_turn(&self, id: MatchId) -> Result<Turn> {
        bot::create_dart_bot_turn(&self.repo.load(id)?)
    }

    /// Simulate the bot's visit and record it
    pub fn play_dart_bot_turn(&mut self, id: MatchId) -> Result<Match> {
        self.mutate(id, |m| {
            let turn = bot::create_dart_bot_turn(m)?;
            engine::add_turn(m, &turn)
        })
    }

    pub fn progress(&self, id: MatchId) -> Result<MatchProgress> {
        Ok(self.repo.load(id)?.progress)
    }

    /// Per-player statistics in throwing order
    pub fn statistics(&self, id: MatchId) -> Result<Vec<(String, Statistics)>> {
        Ok(self
            .repo
            .load(id)?
            .players
            .into_iter()
            .map(|p| (p.name, p.statistics))
            .collect())
    }
}
