use crate::{
    BoosterRules, BoosterTier, EnemyTier, Rarity, RarityTable, SlotRules, SoloConfig,
    SoloEventKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{tier} booster has invalid {rarity} weight {weight}")]
    NegativeRarityWeight {
        tier: BoosterTier,
        rarity: Rarity,
        weight: f64,
    },
    #[error("{tier} booster rarity weights sum to {total}, expected 1")]
    RarityWeightsSum { tier: BoosterTier, total: f64 },
    #[error("booster pack size must be positive")]
    InvalidPackSize,
    #[error("slot machine table is empty or has no weight")]
    EmptySlotTable,
    #[error("slot entry {index} has invalid weight {weight}")]
    NegativeSlotWeight { index: usize, weight: f64 },
    #[error("solo event {kind:?} has invalid probability {value}")]
    NegativeEventProbability { kind: SoloEventKind, value: f64 },
    #[error("solo event probabilities sum to {0}, expected at most 1")]
    EventProbabilitiesSum(f64),
    #[error("solo runs need at least one starting life")]
    NoStartingLives,
    #[error("{0} must not be empty")]
    EmptyMultiplierTable(&'static str),
    #[error("{table} contains invalid multiplier {value}")]
    InvalidMultiplier { table: &'static str, value: f64 },
    #[error("no {0:?} enemies configured")]
    EmptyEnemyPool(EnemyTier),
    #[error("no {0} configured")]
    EmptyPool(&'static str),
    #[error("choice event {0} has no options")]
    ChoiceWithoutOptions(String),
    #[error("{context}: probability {value} outside [0, 1]")]
    InvalidProbability { context: String, value: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    pub rarities: RarityTable,
    pub boosters: BoosterRules,
    pub slot_machine: SlotRules,
    pub solo: SoloConfig,
}

impl GameConfig {
    /// Fails on the first table that would not behave as a distribution.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rarities.validate()?;
        if self.boosters.pack_size == 0 {
            return Err(ConfigError::InvalidPackSize);
        }
        self.slot_machine.table.validate()?;
        self.solo.validate()?;
        Ok(())
    }
}
