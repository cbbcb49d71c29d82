use crate::{
    booster_config, BoosterConfigResponse, BoosterPurchaseClaim, BoosterTier, CardCatalog,
    CardDrop, CardTemplate, DropError, DropResolver, ErrorKind, Event, EventBus, GameStore,
    LedgerError, LedgerVerifier, OwnedCard, RandomSource, Rarity, RarityTable, StoreError,
    UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PACK_SIZE: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoosterListing {
    pub name: String,
    pub price: u64,
}

impl BoosterListing {
    fn new(name: &str, price: u64) -> Self {
        Self {
            name: name.to_string(),
            price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoosterRules {
    pub pack_size: usize,
    pub common: BoosterListing,
    pub rare: BoosterListing,
    pub epic: BoosterListing,
    pub legendary: BoosterListing,
}

impl Default for BoosterRules {
    fn default() -> Self {
        Self {
            pack_size: DEFAULT_PACK_SIZE,
            common: BoosterListing::new("Common Booster", 100),
            rare: BoosterListing::new("Rare Booster", 250),
            epic: BoosterListing::new("Epic Booster", 500),
            legendary: BoosterListing::new("Legendary Booster", 1000),
        }
    }
}

impl BoosterRules {
    pub fn listing(&self, tier: BoosterTier) -> &BoosterListing {
        match tier {
            BoosterTier::Common => &self.common,
            BoosterTier::Rare => &self.rare,
            BoosterTier::Epic => &self.epic,
            BoosterTier::Legendary => &self.legendary,
        }
    }

    pub fn price(&self, tier: BoosterTier) -> u64 {
        self.listing(tier).price
    }

    pub fn bulk_price(&self, tier: BoosterTier, quantity: u32) -> Option<u64> {
        self.price(tier).checked_mul(u64::from(quantity))
    }
}

#[derive(Debug, Error)]
pub enum BoosterError {
    #[error("invalid booster type: {0}")]
    InvalidBoosterType(String),
    #[error("booster quantity must be positive")]
    InvalidQuantity,
    #[error("price overflow")]
    PriceOverflow,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Drop(#[from] DropError),
    #[error("purchase not verified: {0}")]
    Ledger(#[from] LedgerError),
}

impl BoosterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidBoosterType(_) | Self::InvalidQuantity => ErrorKind::InvalidInput,
            Self::PriceOverflow => ErrorKind::InvalidInput,
            Self::Store(err) => err.kind(),
            Self::Drop(err) => err.kind(),
            Self::Ledger(_) => ErrorKind::Unverified,
        }
    }
}

pub fn parse_booster_type(value: &str) -> Result<BoosterTier, BoosterError> {
    BoosterTier::from_keyword(value)
        .ok_or_else(|| BoosterError::InvalidBoosterType(value.to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenedCard {
    pub card: OwnedCard,
    pub template: CardTemplate,
    pub rolled: Rarity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoosterOpening {
    pub tier: BoosterTier,
    pub cards: Vec<OpenedCard>,
    pub balance: u64,
}

pub struct BoosterService<'a, S: GameStore + ?Sized, C: CardCatalog + ?Sized> {
    store: &'a S,
    catalog: &'a C,
    table: &'a RarityTable,
    rules: &'a BoosterRules,
}

impl<'a, S: GameStore + ?Sized, C: CardCatalog + ?Sized> BoosterService<'a, S, C> {
    pub fn new(
        store: &'a S,
        catalog: &'a C,
        table: &'a RarityTable,
        rules: &'a BoosterRules,
    ) -> Self {
        Self {
            store,
            catalog,
            table,
            rules,
        }
    }

    pub fn rules(&self) -> &BoosterRules {
        self.rules
    }

    pub fn config(&self) -> BoosterConfigResponse {
        booster_config(self.rules)
    }

    pub fn buy_and_open_named<R: RandomSource + ?Sized>(
        &self,
        user: UserId,
        booster_type: &str,
        rng: &mut R,
        now: DateTime<Utc>,
        events: &mut EventBus,
    ) -> Result<BoosterOpening, BoosterError> {
        let tier = parse_booster_type(booster_type)?;
        self.buy_and_open(user, tier, rng, now, events)
    }

    /// Charges one booster of `tier` and opens it immediately.
    pub fn buy_and_open<R: RandomSource + ?Sized>(
        &self,
        user: UserId,
        tier: BoosterTier,
        rng: &mut R,
        now: DateTime<Utc>,
        events: &mut EventBus,
    ) -> Result<BoosterOpening, BoosterError> {
        let price = self.rules.price(tier);
        let account = self.store.account(user)?;
        if account.token_balance < price {
            return Err(StoreError::InsufficientFunds {
                required: price,
                available: account.token_balance,
            }
            .into());
        }
        // Draw before debiting so a catalog failure never charges the user.
        let drops = self.draw(tier, rng)?;
        let balance = self.store.try_debit(user, price)?;
        tracing::info!(user = %user, tier = %tier, price, balance, "booster purchased");
        events.push(Event::BoostersBought {
            tier,
            quantity: 1,
            cost: price,
            balance,
        });
        let cards = self.persist(user, tier, drops, now, events)?;
        Ok(BoosterOpening {
            tier,
            cards,
            balance,
        })
    }

    /// Buys `quantity` unopened boosters into the user's inventory.
    pub fn buy_boosters(
        &self,
        user: UserId,
        tier: BoosterTier,
        quantity: u32,
        events: &mut EventBus,
    ) -> Result<u32, BoosterError> {
        if quantity == 0 {
            return Err(BoosterError::InvalidQuantity);
        }
        let cost = self
            .rules
            .bulk_price(tier, quantity)
            .ok_or(BoosterError::PriceOverflow)?;
        let balance = self.store.try_debit(user, cost)?;
        let owned = match self.store.grant_boosters(user, tier, quantity) {
            Ok(owned) => owned,
            Err(err) => {
                self.store.credit(user, cost)?;
                return Err(err.into());
            }
        };
        tracing::info!(
            user = %user,
            tier = %tier,
            quantity,
            cost,
            balance,
            "boosters purchased"
        );
        events.push(Event::BoostersBought {
            tier,
            quantity,
            cost,
            balance,
        });
        Ok(owned)
    }

    /// Grants boosters paid for on the external ledger, after verification.
    /// Each ledger transaction is redeemed once.
    pub fn redeem_purchase<V: LedgerVerifier + ?Sized>(
        &self,
        user: UserId,
        claim: &BoosterPurchaseClaim<'_>,
        verifier: &V,
        events: &mut EventBus,
    ) -> Result<u32, BoosterError> {
        if claim.quantity == 0 {
            return Err(BoosterError::InvalidQuantity);
        }
        let account = self.store.account(user)?;
        verifier.verify_booster_purchase(&account, claim)?;
        let owned =
            self.store
                .redeem_transaction(user, claim.transaction, claim.tier, claim.quantity)?;
        tracing::info!(
            user = %user,
            tier = %claim.tier,
            quantity = claim.quantity,
            transaction = claim.transaction,
            "ledger purchase redeemed"
        );
        events.push(Event::BoostersBought {
            tier: claim.tier,
            quantity: claim.quantity,
            cost: 0,
            balance: account.token_balance,
        });
        Ok(owned)
    }

    /// Opens one booster from the user's inventory.
    pub fn open_booster<R: RandomSource + ?Sized>(
        &self,
        user: UserId,
        tier: BoosterTier,
        rng: &mut R,
        now: DateTime<Utc>,
        events: &mut EventBus,
    ) -> Result<BoosterOpening, BoosterError> {
        let account = self.store.account(user)?;
        if account.boosters.count(tier) == 0 {
            return Err(StoreError::NoBoosters(tier).into());
        }
        let drops = self.draw(tier, rng)?;
        self.store.take_booster(user, tier)?;
        let cards = self.persist(user, tier, drops, now, events)?;
        Ok(BoosterOpening {
            tier,
            cards,
            balance: account.token_balance,
        })
    }

    fn draw<R: RandomSource + ?Sized>(
        &self,
        tier: BoosterTier,
        rng: &mut R,
    ) -> Result<Vec<CardDrop>, BoosterError> {
        let resolver = DropResolver::new(self.table, self.catalog);
        Ok(resolver.draw_cards(tier, self.rules.pack_size, rng)?)
    }

    fn persist(
        &self,
        user: UserId,
        tier: BoosterTier,
        drops: Vec<CardDrop>,
        now: DateTime<Utc>,
        events: &mut EventBus,
    ) -> Result<Vec<OpenedCard>, BoosterError> {
        let fallbacks = drops.iter().filter(|drop| drop.fell_back()).count();
        let opened: Vec<OpenedCard> = drops
            .into_iter()
            .map(|drop| OpenedCard {
                card: OwnedCard::from_template(user, &drop.template, now),
                template: drop.template,
                rolled: drop.rolled,
            })
            .collect();
        let cards: Vec<OwnedCard> = opened.iter().map(|item| item.card.clone()).collect();
        self.store.insert_cards(user, &cards)?;
        tracing::info!(
            user = %user,
            tier = %tier,
            cards = cards.len(),
            fallbacks,
            "booster opened"
        );
        events.push(Event::BoosterOpened {
            tier,
            rarities: opened.iter().map(|item| item.template.rarity).collect(),
            fallbacks,
        });
        Ok(opened)
    }
}
