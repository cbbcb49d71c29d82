//! JSON shapes exchanged with clients.

use crate::{BoosterOpening, BoosterRules, BoosterTier, CardStats, OpenedCard, Rarity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameCardView {
    pub name: String,
    pub rarity: Rarity,
    pub image_url: String,
    pub stats: CardStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: String,
    pub game_card: GameCardView,
    pub token_id: Option<String>,
}

impl From<&OpenedCard> for CardView {
    fn from(value: &OpenedCard) -> Self {
        Self {
            id: value.card.id.to_string(),
            game_card: GameCardView {
                name: value.template.name.clone(),
                rarity: value.template.rarity,
                image_url: value.template.image_url.clone(),
                stats: value.card.effective_stats(&value.template),
            },
            token_id: value.card.token_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuyAndOpenRequest {
    pub booster_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuyAndOpenResponse {
    pub success: bool,
    pub cards: Vec<CardView>,
    pub token_balance: u64,
}

impl From<&BoosterOpening> for BuyAndOpenResponse {
    fn from(value: &BoosterOpening) -> Self {
        Self {
            success: true,
            cards: value.cards.iter().map(CardView::from).collect(),
            token_balance: value.balance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoosterConfigEntry {
    pub name: String,
    pub price: u64,
}

/// Tier keyword to display name and price.
pub type BoosterConfigResponse = BTreeMap<BoosterTier, BoosterConfigEntry>;

pub fn booster_config(rules: &BoosterRules) -> BoosterConfigResponse {
    BoosterTier::ALL
        .iter()
        .map(|tier| {
            let listing = rules.listing(*tier);
            (
                *tier,
                BoosterConfigEntry {
                    name: listing.name.clone(),
                    price: listing.price,
                },
            )
        })
        .collect()
}
