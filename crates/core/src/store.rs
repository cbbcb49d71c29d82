use crate::{BoosterTier, CardId, OwnedCard};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use uuid::Uuid;

pub type UserId = Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoosterInventory {
    pub common: u32,
    pub rare: u32,
    pub epic: u32,
    pub legendary: u32,
}

impl BoosterInventory {
    pub fn count(&self, tier: BoosterTier) -> u32 {
        match tier {
            BoosterTier::Common => self.common,
            BoosterTier::Rare => self.rare,
            BoosterTier::Epic => self.epic,
            BoosterTier::Legendary => self.legendary,
        }
    }

    fn slot_mut(&mut self, tier: BoosterTier) -> &mut u32 {
        match tier {
            BoosterTier::Common => &mut self.common,
            BoosterTier::Rare => &mut self.rare,
            BoosterTier::Epic => &mut self.epic,
            BoosterTier::Legendary => &mut self.legendary,
        }
    }

    pub fn total(&self) -> u32 {
        BoosterTier::ALL.iter().map(|tier| self.count(*tier)).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: UserId,
    pub username: String,
    pub token_balance: u64,
    #[serde(default)]
    pub boosters: BoosterInventory,
    #[serde(default)]
    pub cards: Vec<CardId>,
    #[serde(default)]
    pub last_free_play: Option<NaiveDate>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("account {0} not found")]
    AccountNotFound(UserId),
    #[error("card {0} not found")]
    CardNotFound(CardId),
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: u64, available: u64 },
    #[error("no {0} boosters owned")]
    NoBoosters(BoosterTier),
    #[error("daily free play already used")]
    FreePlayUsed,
    #[error("card {0} is not listed for sale")]
    NotListed(CardId),
    #[error("card {0} is owned by someone else")]
    NotOwner(CardId),
    #[error("cannot buy your own card")]
    SelfPurchase,
    #[error("transaction {0} was already redeemed")]
    TransactionRedeemed(String),
    #[error("balance overflow")]
    Overflow,
}

/// Settled marketplace sale.
#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    pub card: OwnedCard,
    pub seller: UserId,
    pub price: u64,
    pub buyer_balance: u64,
    pub seller_balance: u64,
}

/// Persistence for accounts and owned cards. Each method is one atomic
/// step: conditional operations either apply fully or leave state untouched.
pub trait GameStore {
    fn create_account(&self, username: &str, token_balance: u64) -> UserId;
    fn account(&self, user: UserId) -> Result<Account, StoreError>;

    /// Debits `amount` only if the balance covers it. Returns the new balance.
    fn try_debit(&self, user: UserId, amount: u64) -> Result<u64, StoreError>;
    fn credit(&self, user: UserId, amount: u64) -> Result<u64, StoreError>;

    fn grant_boosters(
        &self,
        user: UserId,
        tier: BoosterTier,
        quantity: u32,
    ) -> Result<u32, StoreError>;
    /// Grants boosters for a ledger transaction, at most once per transaction id.
    /// Returns how many boosters of `tier` the user now owns.
    fn redeem_transaction(
        &self,
        user: UserId,
        transaction: &str,
        tier: BoosterTier,
        quantity: u32,
    ) -> Result<u32, StoreError>;
    /// Credits `tokens` and one booster per entry of `boosters` together.
    /// Returns the new balance.
    fn grant_rewards(
        &self,
        user: UserId,
        tokens: u64,
        boosters: &[BoosterTier],
    ) -> Result<u64, StoreError>;
    /// Removes one owned booster of `tier`. Returns how many remain.
    fn take_booster(&self, user: UserId, tier: BoosterTier) -> Result<u32, StoreError>;

    /// Claims the once-per-calendar-day free play for `today`.
    fn claim_free_play(&self, user: UserId, today: NaiveDate) -> Result<(), StoreError>;

    /// Persists cards and appends them to their owner's card list.
    fn insert_cards(&self, user: UserId, cards: &[OwnedCard]) -> Result<(), StoreError>;
    fn card(&self, id: CardId) -> Result<OwnedCard, StoreError>;
    fn cards_of(&self, user: UserId) -> Result<Vec<OwnedCard>, StoreError>;
    fn update_card(&self, card: &OwnedCard) -> Result<(), StoreError>;

    fn listings(&self) -> Vec<OwnedCard>;
    /// Moves a listed card to `buyer`, paying its price to the seller.
    fn settle_sale(&self, buyer: UserId, card: CardId) -> Result<Sale, StoreError>;
}

#[derive(Debug, Default)]
struct StoreInner {
    accounts: HashMap<UserId, Account>,
    cards: HashMap<CardId, OwnedCard>,
    redeemed: HashSet<String>,
}

impl StoreInner {
    fn account_mut(&mut self, user: UserId) -> Result<&mut Account, StoreError> {
        self.accounts
            .get_mut(&user)
            .ok_or(StoreError::AccountNotFound(user))
    }
}

/// In-process [`GameStore`]; a single mutex serializes every operation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl GameStore for MemoryStore {
    fn create_account(&self, username: &str, token_balance: u64) -> UserId {
        let id = Uuid::new_v4();
        self.lock().accounts.insert(
            id,
            Account {
                id,
                username: username.to_string(),
                token_balance,
                boosters: BoosterInventory::default(),
                cards: Vec::new(),
                last_free_play: None,
            },
        );
        id
    }

    fn account(&self, user: UserId) -> Result<Account, StoreError> {
        self.lock()
            .accounts
            .get(&user)
            .cloned()
            .ok_or(StoreError::AccountNotFound(user))
    }

    fn try_debit(&self, user: UserId, amount: u64) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let account = inner.account_mut(user)?;
        if account.token_balance < amount {
            return Err(StoreError::InsufficientFunds {
                required: amount,
                available: account.token_balance,
            });
        }
        account.token_balance -= amount;
        Ok(account.token_balance)
    }

    fn credit(&self, user: UserId, amount: u64) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let account = inner.account_mut(user)?;
        account.token_balance = account
            .token_balance
            .checked_add(amount)
            .ok_or(StoreError::Overflow)?;
        Ok(account.token_balance)
    }

    fn grant_boosters(
        &self,
        user: UserId,
        tier: BoosterTier,
        quantity: u32,
    ) -> Result<u32, StoreError> {
        let mut inner = self.lock();
        let account = inner.account_mut(user)?;
        let slot = account.boosters.slot_mut(tier);
        *slot = slot.checked_add(quantity).ok_or(StoreError::Overflow)?;
        Ok(*slot)
    }

    fn redeem_transaction(
        &self,
        user: UserId,
        transaction: &str,
        tier: BoosterTier,
        quantity: u32,
    ) -> Result<u32, StoreError> {
        let mut inner = self.lock();
        if inner.redeemed.contains(transaction) {
            return Err(StoreError::TransactionRedeemed(transaction.to_string()));
        }
        let account = inner.account_mut(user)?;
        let slot = account.boosters.slot_mut(tier);
        *slot = slot.checked_add(quantity).ok_or(StoreError::Overflow)?;
        let owned = *slot;
        inner.redeemed.insert(transaction.to_string());
        Ok(owned)
    }

    fn grant_rewards(
        &self,
        user: UserId,
        tokens: u64,
        boosters: &[BoosterTier],
    ) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let account = inner.account_mut(user)?;
        let balance = account
            .token_balance
            .checked_add(tokens)
            .ok_or(StoreError::Overflow)?;
        let mut inventory = account.boosters;
        for tier in boosters {
            let slot = inventory.slot_mut(*tier);
            *slot = slot.checked_add(1).ok_or(StoreError::Overflow)?;
        }
        account.token_balance = balance;
        account.boosters = inventory;
        Ok(balance)
    }

    fn take_booster(&self, user: UserId, tier: BoosterTier) -> Result<u32, StoreError> {
        let mut inner = self.lock();
        let account = inner.account_mut(user)?;
        let slot = account.boosters.slot_mut(tier);
        if *slot == 0 {
            return Err(StoreError::NoBoosters(tier));
        }
        *slot -= 1;
        Ok(*slot)
    }

    fn claim_free_play(&self, user: UserId, today: NaiveDate) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let account = inner.account_mut(user)?;
        if !crate::free_play_available(account.last_free_play, today) {
            return Err(StoreError::FreePlayUsed);
        }
        account.last_free_play = Some(today);
        Ok(())
    }

    fn insert_cards(&self, user: UserId, cards: &[OwnedCard]) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let account = inner.account_mut(user)?;
        account.cards.extend(cards.iter().map(|card| card.id));
        for card in cards {
            inner.cards.insert(card.id, card.clone());
        }
        Ok(())
    }

    fn card(&self, id: CardId) -> Result<OwnedCard, StoreError> {
        self.lock()
            .cards
            .get(&id)
            .cloned()
            .ok_or(StoreError::CardNotFound(id))
    }

    fn cards_of(&self, user: UserId) -> Result<Vec<OwnedCard>, StoreError> {
        let inner = self.lock();
        let account = inner
            .accounts
            .get(&user)
            .ok_or(StoreError::AccountNotFound(user))?;
        Ok(account
            .cards
            .iter()
            .filter_map(|id| inner.cards.get(id).cloned())
            .collect())
    }

    fn update_card(&self, card: &OwnedCard) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let stored = inner
            .cards
            .get_mut(&card.id)
            .ok_or(StoreError::CardNotFound(card.id))?;
        if stored.owner != card.owner {
            return Err(StoreError::NotOwner(card.id));
        }
        *stored = card.clone();
        Ok(())
    }

    fn listings(&self) -> Vec<OwnedCard> {
        let mut listed: Vec<OwnedCard> = self
            .lock()
            .cards
            .values()
            .filter(|card| card.for_sale)
            .cloned()
            .collect();
        listed.sort_by_key(|card| card.acquired_at);
        listed
    }

    fn settle_sale(&self, buyer: UserId, card_id: CardId) -> Result<Sale, StoreError> {
        let mut inner = self.lock();
        let card = inner
            .cards
            .get(&card_id)
            .cloned()
            .ok_or(StoreError::CardNotFound(card_id))?;
        let price = match (card.for_sale, card.price) {
            (true, Some(price)) => price,
            _ => return Err(StoreError::NotListed(card_id)),
        };
        let seller = card.owner;
        if seller == buyer {
            return Err(StoreError::SelfPurchase);
        }
        let seller_balance = inner
            .accounts
            .get(&seller)
            .ok_or(StoreError::AccountNotFound(seller))?
            .token_balance
            .checked_add(price)
            .ok_or(StoreError::Overflow)?;
        let buyer_account = inner.account_mut(buyer)?;
        if buyer_account.token_balance < price {
            return Err(StoreError::InsufficientFunds {
                required: price,
                available: buyer_account.token_balance,
            });
        }

        // All checks passed; mutate.
        buyer_account.token_balance -= price;
        buyer_account.cards.push(card_id);
        let buyer_balance = buyer_account.token_balance;
        let seller_account = inner.account_mut(seller)?;
        seller_account.token_balance = seller_balance;
        seller_account.cards.retain(|id| *id != card_id);
        let stored = inner
            .cards
            .get_mut(&card_id)
            .ok_or(StoreError::CardNotFound(card_id))?;
        stored.transfer_to(buyer);
        Ok(Sale {
            card: stored.clone(),
            seller,
            price,
            buyer_balance,
            seller_balance,
        })
    }
}
