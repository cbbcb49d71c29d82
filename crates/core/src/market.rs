use crate::{CardId, ErrorKind, Event, EventBus, GameStore, OwnedCard, Sale, StoreError, UserId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("listing price must be positive")]
    InvalidPrice,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MarketError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPrice => ErrorKind::InvalidInput,
            Self::Store(err) => err.kind(),
        }
    }
}

/// Player-to-player card trading.
pub struct Marketplace<'a, S: GameStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: GameStore + ?Sized> Marketplace<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn list(
        &self,
        seller: UserId,
        card: CardId,
        price: u64,
        events: &mut EventBus,
    ) -> Result<OwnedCard, MarketError> {
        if price == 0 {
            return Err(MarketError::InvalidPrice);
        }
        let mut owned = self.owned_by(seller, card)?;
        owned.list_for_sale(price);
        self.store.update_card(&owned)?;
        tracing::info!(seller = %seller, card = %card, price, "card listed");
        events.push(Event::CardListed { card, price });
        Ok(owned)
    }

    pub fn unlist(
        &self,
        seller: UserId,
        card: CardId,
        events: &mut EventBus,
    ) -> Result<OwnedCard, MarketError> {
        let mut owned = self.owned_by(seller, card)?;
        if !owned.for_sale {
            return Err(StoreError::NotListed(card).into());
        }
        owned.unlist();
        self.store.update_card(&owned)?;
        events.push(Event::CardUnlisted { card });
        Ok(owned)
    }

    pub fn listings(&self) -> Vec<OwnedCard> {
        self.store.listings()
    }

    pub fn buy(
        &self,
        buyer: UserId,
        card: CardId,
        events: &mut EventBus,
    ) -> Result<Sale, MarketError> {
        let sale = self.store.settle_sale(buyer, card)?;
        tracing::info!(
            buyer = %buyer,
            seller = %sale.seller,
            card = %card,
            price = sale.price,
            "card sold"
        );
        events.push(Event::CardSold {
            card,
            price: sale.price,
            buyer_balance: sale.buyer_balance,
        });
        Ok(sale)
    }

    fn owned_by(&self, user: UserId, card: CardId) -> Result<OwnedCard, MarketError> {
        let owned = self.store.card(card)?;
        if owned.owner != user {
            return Err(StoreError::NotOwner(card).into());
        }
        Ok(owned)
    }
}
