use crate::{BoosterTier, CardCatalog, CardTemplate, RandomSource, Rarity, RarityTable};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DropError {
    #[error("draw count must be positive")]
    InvalidCount,
    #[error("no card templates available for {0} or the common fallback")]
    CatalogExhausted(Rarity),
}

/// One resolved draw: the rarity rolled and the template handed out.
#[derive(Debug, Clone, PartialEq)]
pub struct CardDrop {
    pub rolled: Rarity,
    pub template: CardTemplate,
}

impl CardDrop {
    pub fn fell_back(&self) -> bool {
        self.rolled != self.template.rarity
    }
}

/// Samples card templates from a catalog snapshot. Pure: persisting the
/// result is up to the caller.
pub struct DropResolver<'a, C: CardCatalog + ?Sized> {
    table: &'a RarityTable,
    catalog: &'a C,
}

impl<'a, C: CardCatalog + ?Sized> DropResolver<'a, C> {
    pub fn new(table: &'a RarityTable, catalog: &'a C) -> Self {
        Self { table, catalog }
    }

    pub fn resolve_rarity<R: RandomSource + ?Sized>(
        &self,
        tier: BoosterTier,
        rng: &mut R,
    ) -> Rarity {
        self.table.resolve_rarity(tier, rng)
    }

    pub fn draw_one<R: RandomSource + ?Sized>(
        &self,
        tier: BoosterTier,
        rng: &mut R,
    ) -> Result<CardDrop, DropError> {
        let rolled = self.resolve_rarity(tier, rng);
        let template = self.pick_template(rolled, rng)?;
        Ok(CardDrop {
            rolled,
            template: template.clone(),
        })
    }

    pub fn draw_cards<R: RandomSource + ?Sized>(
        &self,
        tier: BoosterTier,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<CardDrop>, DropError> {
        if count == 0 {
            return Err(DropError::InvalidCount);
        }
        let mut drops = Vec::with_capacity(count);
        for _ in 0..count {
            drops.push(self.draw_one(tier, rng)?);
        }
        let rarities: Vec<Rarity> = drops.iter().map(|drop| drop.template.rarity).collect();
        tracing::debug!(tier = %tier, count, rarities = ?rarities, "resolved drops");
        Ok(drops)
    }

    /// Uniform pick within `rarity`, falling back one level to common.
    fn pick_template<R: RandomSource + ?Sized>(
        &self,
        rarity: Rarity,
        rng: &mut R,
    ) -> Result<&'a CardTemplate, DropError> {
        let catalog: &'a C = self.catalog;
        let pool = catalog.find_templates_by_rarity(rarity);
        if !pool.is_empty() {
            return Ok(pool[rng.next_index(pool.len())]);
        }
        if rarity != Rarity::Common {
            tracing::warn!(rarity = %rarity, "empty rarity pool, falling back to common");
            let fallback = catalog.find_templates_by_rarity(Rarity::Common);
            if !fallback.is_empty() {
                return Ok(fallback[rng.next_index(fallback.len())]);
            }
        }
        tracing::error!(rarity = %rarity, "card catalog exhausted; seed the common pool");
        Err(DropError::CatalogExhausted(rarity))
    }
}
