use crate::{ConfigError, RandomSource};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance used when checking that a distribution sums to one.
pub const WEIGHT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 4] = [
        Rarity::Common,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    /// Order of the cumulative walk, rarest first.
    pub const DRAW_ORDER: [Rarity; 4] = [
        Rarity::Legendary,
        Rarity::Epic,
        Rarity::Rare,
        Rarity::Common,
    ];

    pub fn from_keyword(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "common" => Some(Self::Common),
            "rare" => Some(Self::Rare),
            "epic" => Some(Self::Epic),
            "legendary" => Some(Self::Legendary),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Booster pack tier. Shares labels with [`Rarity`] but selects a weight row,
/// not a card grade.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum BoosterTier {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl BoosterTier {
    pub const ALL: [BoosterTier; 4] = [
        BoosterTier::Common,
        BoosterTier::Rare,
        BoosterTier::Epic,
        BoosterTier::Legendary,
    ];

    pub fn from_keyword(value: &str) -> Option<Self> {
        Rarity::from_keyword(value).map(Self::from)
    }

    pub fn keyword(self) -> &'static str {
        Rarity::from(self).keyword()
    }
}

impl From<Rarity> for BoosterTier {
    fn from(value: Rarity) -> Self {
        match value {
            Rarity::Common => Self::Common,
            Rarity::Rare => Self::Rare,
            Rarity::Epic => Self::Epic,
            Rarity::Legendary => Self::Legendary,
        }
    }
}

impl From<BoosterTier> for Rarity {
    fn from(value: BoosterTier) -> Self {
        match value {
            BoosterTier::Common => Self::Common,
            BoosterTier::Rare => Self::Rare,
            BoosterTier::Epic => Self::Epic,
            BoosterTier::Legendary => Self::Legendary,
        }
    }
}

impl fmt::Display for BoosterTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Probability of each rarity for one booster tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RarityWeights {
    pub common: f64,
    pub rare: f64,
    pub epic: f64,
    pub legendary: f64,
}

impl RarityWeights {
    pub const fn new(common: f64, rare: f64, epic: f64, legendary: f64) -> Self {
        Self {
            common,
            rare,
            epic,
            legendary,
        }
    }

    pub fn weight(&self, rarity: Rarity) -> f64 {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Rare => self.rare,
            Rarity::Epic => self.epic,
            Rarity::Legendary => self.legendary,
        }
    }

    pub fn total(&self) -> f64 {
        Rarity::ALL.iter().map(|rarity| self.weight(*rarity)).sum()
    }

    /// Cumulative walk over [`Rarity::DRAW_ORDER`]. A roll beyond the
    /// covered mass resolves to common.
    pub fn rarity_for_roll(&self, roll: f64) -> Rarity {
        let mut cumulative = 0.0;
        for rarity in Rarity::DRAW_ORDER {
            cumulative += self.weight(rarity);
            if roll < cumulative {
                return rarity;
            }
        }
        Rarity::Common
    }

    pub fn validate(&self, tier: BoosterTier) -> Result<(), ConfigError> {
        for rarity in Rarity::ALL {
            let weight = self.weight(rarity);
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::NegativeRarityWeight { tier, rarity, weight });
            }
        }
        let total = self.total();
        if (total - 1.0).abs() > WEIGHT_EPSILON {
            return Err(ConfigError::RarityWeightsSum { tier, total });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RarityTable {
    pub common: RarityWeights,
    pub rare: RarityWeights,
    pub epic: RarityWeights,
    pub legendary: RarityWeights,
}

impl Default for RarityTable {
    fn default() -> Self {
        Self {
            common: RarityWeights::new(0.80, 0.15, 0.04, 0.01),
            rare: RarityWeights::new(0.55, 0.35, 0.08, 0.02),
            epic: RarityWeights::new(0.30, 0.45, 0.20, 0.05),
            legendary: RarityWeights::new(0.15, 0.35, 0.35, 0.15),
        }
    }
}

impl RarityTable {
    pub fn weights_for(&self, tier: BoosterTier) -> &RarityWeights {
        match tier {
            BoosterTier::Common => &self.common,
            BoosterTier::Rare => &self.rare,
            BoosterTier::Epic => &self.epic,
            BoosterTier::Legendary => &self.legendary,
        }
    }

    pub fn resolve_rarity<R: RandomSource + ?Sized>(
        &self,
        tier: BoosterTier,
        rng: &mut R,
    ) -> Rarity {
        let roll = rng.next_f64();
        self.weights_for(tier).rarity_for_roll(roll)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for tier in BoosterTier::ALL {
            self.weights_for(tier).validate(tier)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedRandom;

    #[test]
    fn default_table_is_valid() {
        RarityTable::default().validate().expect("default table");
    }

    #[test]
    fn walk_checks_legendary_first() {
        let weights = RarityTable::default().rare;
        assert_eq!(weights.rarity_for_roll(0.0), Rarity::Legendary);
        assert_eq!(weights.rarity_for_roll(0.019), Rarity::Legendary);
        assert_eq!(weights.rarity_for_roll(0.02), Rarity::Epic);
        assert_eq!(weights.rarity_for_roll(0.099), Rarity::Epic);
        assert_eq!(weights.rarity_for_roll(0.11), Rarity::Rare);
        assert_eq!(weights.rarity_for_roll(0.44), Rarity::Rare);
        assert_eq!(weights.rarity_for_roll(0.46), Rarity::Common);
        assert_eq!(weights.rarity_for_roll(0.999), Rarity::Common);
    }

    #[test]
    fn uncovered_mass_resolves_to_common() {
        let weights = RarityWeights::new(0.0, 0.1, 0.1, 0.1);
        assert_eq!(weights.rarity_for_roll(0.95), Rarity::Common);
    }

    #[test]
    fn resolve_rarity_uses_one_draw() {
        let table = RarityTable::default();
        let mut rng = ScriptedRandom::new(vec![0.05]);
        assert_eq!(
            table.resolve_rarity(BoosterTier::Legendary, &mut rng),
            Rarity::Legendary
        );
        assert_eq!(rng.draws(), 1);
    }

    #[test]
    fn rejects_skewed_table() {
        let mut table = RarityTable::default();
        table.epic = RarityWeights::new(0.30, 0.45, 0.20, 0.10);
        match table.validate() {
            Err(ConfigError::RarityWeightsSum { tier, .. }) => {
                assert_eq!(tier, BoosterTier::Epic)
            }
            other => panic!("unexpected validation result: {:?}", other),
        }
    }

    #[test]
    fn rejects_negative_weight() {
        let mut table = RarityTable::default();
        table.common = RarityWeights::new(1.05, 0.0, 0.0, -0.05);
        assert!(matches!(
            table.validate(),
            Err(ConfigError::NegativeRarityWeight {
                rarity: Rarity::Legendary,
                ..
            })
        ));
    }

    #[test]
    fn keywords_parse_case_insensitively() {
        assert_eq!(BoosterTier::from_keyword(" Epic "), Some(BoosterTier::Epic));
        assert_eq!(Rarity::from_keyword("LEGENDARY"), Some(Rarity::Legendary));
        assert_eq!(BoosterTier::from_keyword("mythic"), None);
    }
}
