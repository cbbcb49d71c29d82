use crate::{BoosterTier, CardId, Rarity, SlotOutcome, SoloEventKind, SoloPhase};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    BoostersBought {
        tier: BoosterTier,
        quantity: u32,
        cost: u64,
        balance: u64,
    },
    BoosterOpened {
        tier: BoosterTier,
        rarities: Vec<Rarity>,
        fallbacks: usize,
    },
    SlotPlayed {
        outcome: SlotOutcome,
        free_play: bool,
        balance: u64,
    },
    CardListed { card: CardId, price: u64 },
    CardUnlisted { card: CardId },
    CardSold {
        card: CardId,
        price: u64,
        buyer_balance: u64,
    },
    SoloStarted { lives: u32 },
    SoloEncounter { level: u32, kind: SoloEventKind },
    SoloDamaged { amount: u32, lives: u32 },
    SoloEnded { phase: SoloPhase, level: u32, tokens: u64 },
}

#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<Event>,
}

impl EventBus {
    pub fn push(&mut self, event: Event) {
        self.queue.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
