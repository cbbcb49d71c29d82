use crate::{CardStats, CardTemplate, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CardId = Uuid;

pub const MAX_LEVEL: u32 = 10;
pub const XP_PER_LEVEL: u32 = 100;

/// A user's instance of a [`CardTemplate`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OwnedCard {
    pub id: CardId,
    pub owner: UserId,
    pub template_id: String,
    pub level: u32,
    pub experience: u32,
    #[serde(default)]
    pub enhancement: CardStats,
    #[serde(default)]
    pub for_sale: bool,
    #[serde(default)]
    pub price: Option<u64>,
    pub acquired_at: DateTime<Utc>,
    #[serde(default)]
    pub token_id: Option<String>,
}

impl OwnedCard {
    pub fn from_template(owner: UserId, template: &CardTemplate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            template_id: template.id.clone(),
            level: 1,
            experience: 0,
            enhancement: CardStats::default(),
            for_sale: false,
            price: None,
            acquired_at: now,
            token_id: None,
        }
    }

    pub fn effective_stats(&self, template: &CardTemplate) -> CardStats {
        template.stats.boosted_by(&self.enhancement)
    }

    pub fn xp_to_next_level(&self) -> Option<u32> {
        if self.level >= MAX_LEVEL {
            None
        } else {
            Some(self.level * XP_PER_LEVEL)
        }
    }

    /// Adds experience and applies any level-ups. Returns levels gained.
    pub fn add_experience(&mut self, xp: u32) -> u32 {
        if self.level >= MAX_LEVEL {
            return 0;
        }
        self.experience = self.experience.saturating_add(xp);
        let mut gained = 0;
        while let Some(needed) = self.xp_to_next_level() {
            if self.experience < needed {
                break;
            }
            self.experience -= needed;
            self.level += 1;
            self.enhancement.attack += 1;
            self.enhancement.defense += 1;
            gained += 1;
        }
        if self.level >= MAX_LEVEL {
            self.experience = 0;
        }
        gained
    }

    pub fn list_for_sale(&mut self, price: u64) {
        self.for_sale = true;
        self.price = Some(price);
    }

    pub fn unlist(&mut self) {
        self.for_sale = false;
        self.price = None;
    }

    /// Reassigns ownership and takes the card off the market.
    pub fn transfer_to(&mut self, owner: UserId) {
        self.owner = owner;
        self.unlist();
    }

    /// Records the external-ledger token id. Returns false if one is already set.
    pub fn assign_token(&mut self, token_id: impl Into<String>) -> bool {
        if self.token_id.is_some() {
            return false;
        }
        self.token_id = Some(token_id.into());
        true
    }
}
