use crate::{
    BoosterTier, ConfigError, ErrorKind, Event, EventBus, GameStore, RandomSource, StoreError,
    UserId,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SlotOutcome {
    Booster { tier: BoosterTier },
    Tokens { amount: u64 },
    Lose,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlotCategory {
    Booster,
    Token,
    None,
}

impl SlotOutcome {
    pub fn category(&self) -> SlotCategory {
        match self {
            Self::Booster { .. } => SlotCategory::Booster,
            Self::Tokens { .. } => SlotCategory::Token,
            Self::Lose => SlotCategory::None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SlotEntry {
    pub outcome: SlotOutcome,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotTable {
    pub entries: Vec<SlotEntry>,
}

impl Default for SlotTable {
    fn default() -> Self {
        let entry = |outcome, weight| SlotEntry { outcome, weight };
        Self {
            entries: vec![
                entry(SlotOutcome::Booster { tier: BoosterTier::Common }, 0.30),
                entry(SlotOutcome::Booster { tier: BoosterTier::Rare }, 0.10),
                entry(SlotOutcome::Booster { tier: BoosterTier::Epic }, 0.05),
                entry(SlotOutcome::Tokens { amount: 200 }, 0.05),
                entry(SlotOutcome::Lose, 0.50),
            ],
        }
    }
}

impl SlotTable {
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.weight).sum()
    }

    /// Walks entries in declaration order. A roll past the covered mass
    /// lands on the first entry.
    pub fn outcome_for_roll(&self, roll: f64) -> Option<SlotOutcome> {
        let mut cumulative = 0.0;
        for entry in &self.entries {
            cumulative += entry.weight;
            if roll < cumulative {
                return Some(entry.outcome);
            }
        }
        self.entries.first().map(|entry| entry.outcome)
    }

    /// Draws in `[0, total)`, so tables that do not sum to one still cover
    /// their whole mass. `None` only for an empty table.
    pub fn spin<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Option<SlotOutcome> {
        let roll = rng.next_f64() * self.total();
        self.outcome_for_roll(roll)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entries.is_empty() {
            return Err(ConfigError::EmptySlotTable);
        }
        for (index, entry) in self.entries.iter().enumerate() {
            if !entry.weight.is_finite() || entry.weight < 0.0 {
                return Err(ConfigError::NegativeSlotWeight {
                    index,
                    weight: entry.weight,
                });
            }
        }
        if self.total() <= 0.0 {
            return Err(ConfigError::EmptySlotTable);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotRules {
    pub play_cost: u64,
    pub daily_free_play: bool,
    pub table: SlotTable,
}

impl Default for SlotRules {
    fn default() -> Self {
        Self {
            play_cost: 100,
            daily_free_play: true,
            table: SlotTable::default(),
        }
    }
}

/// Free play resets at calendar midnight, not after a rolling 24 hours.
pub fn free_play_available(last_free_play: Option<NaiveDate>, today: NaiveDate) -> bool {
    last_free_play.map_or(true, |last| last != today)
}

pub fn free_play_available_at(last_play: Option<NaiveDateTime>, now: NaiveDateTime) -> bool {
    free_play_available(last_play.map(|at| at.date()), now.date())
}

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("slot machine has no outcomes configured")]
    EmptyTable,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SlotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyTable => ErrorKind::Internal,
            Self::Store(err) => err.kind(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPlay {
    pub outcome: SlotOutcome,
    pub free_play: bool,
    pub cost: u64,
    pub balance: u64,
}

pub struct SlotMachine<'a, S: GameStore + ?Sized> {
    store: &'a S,
    rules: &'a SlotRules,
}

impl<'a, S: GameStore + ?Sized> SlotMachine<'a, S> {
    pub fn new(store: &'a S, rules: &'a SlotRules) -> Self {
        Self { store, rules }
    }

    /// `now` is the player's local wall-clock time.
    pub fn play<R: RandomSource + ?Sized>(
        &self,
        user: UserId,
        rng: &mut R,
        now: NaiveDateTime,
        events: &mut EventBus,
    ) -> Result<SlotPlay, SlotError> {
        let outcome = self.rules.table.spin(rng).ok_or(SlotError::EmptyTable)?;
        let free_play = self.rules.daily_free_play && self.try_claim_free(user, now.date())?;
        let cost = if free_play { 0 } else { self.rules.play_cost };
        let mut balance = self.store.try_debit(user, cost)?;
        match outcome {
            SlotOutcome::Tokens { amount } => {
                balance = self.store.credit(user, amount)?;
            }
            SlotOutcome::Booster { tier } => {
                self.store.grant_boosters(user, tier, 1)?;
            }
            SlotOutcome::Lose => {}
        }
        tracing::debug!(user = %user, ?outcome, free_play, balance, "slot machine spun");
        events.push(Event::SlotPlayed {
            outcome,
            free_play,
            balance,
        });
        Ok(SlotPlay {
            outcome,
            free_play,
            cost,
            balance,
        })
    }

    fn try_claim_free(&self, user: UserId, today: NaiveDate) -> Result<bool, SlotError> {
        match self.store.claim_free_play(user, today) {
            Ok(()) => Ok(true),
            Err(StoreError::FreePlayUsed) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
