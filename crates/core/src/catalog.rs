use crate::Rarity;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Upper bound for any single card stat.
pub const STAT_MAX: u32 = 100;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CardStats {
    pub attack: u32,
    pub defense: u32,
    pub magic: u32,
    pub speed: u32,
}

impl CardStats {
    pub const fn new(attack: u32, defense: u32, magic: u32, speed: u32) -> Self {
        Self {
            attack,
            defense,
            magic,
            speed,
        }
    }

    pub fn is_bounded(&self) -> bool {
        [self.attack, self.defense, self.magic, self.speed]
            .iter()
            .all(|value| *value <= STAT_MAX)
    }

    /// Component-wise sum, clamped to [`STAT_MAX`].
    pub fn boosted_by(&self, delta: &CardStats) -> CardStats {
        CardStats {
            attack: (self.attack + delta.attack).min(STAT_MAX),
            defense: (self.defense + delta.defense).min(STAT_MAX),
            magic: (self.magic + delta.magic).min(STAT_MAX),
            speed: (self.speed + delta.speed).min(STAT_MAX),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardTemplate {
    pub id: String,
    pub name: String,
    pub rarity: Rarity,
    pub stats: CardStats,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// Read-only view of the card catalog used by draw resolution.
pub trait CardCatalog {
    /// Available templates of the given rarity.
    fn find_templates_by_rarity(&self, rarity: Rarity) -> Vec<&CardTemplate>;
    fn find_available(&self) -> Vec<&CardTemplate>;
    fn template(&self, id: &str) -> Option<&CardTemplate>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate card template id {0}")]
    DuplicateId(String),
    #[error("card template {0} has a stat above {STAT_MAX}")]
    StatOutOfBounds(String),
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    templates: Vec<CardTemplate>,
}

impl MemoryCatalog {
    pub fn new(templates: Vec<CardTemplate>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for template in &templates {
            if !seen.insert(template.id.as_str()) {
                return Err(CatalogError::DuplicateId(template.id.clone()));
            }
            if !template.stats.is_bounded() {
                return Err(CatalogError::StatOutOfBounds(template.id.clone()));
            }
        }
        Ok(Self { templates })
    }

    pub fn templates(&self) -> &[CardTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn set_available(&mut self, id: &str, available: bool) -> bool {
        match self.templates.iter_mut().find(|template| template.id == id) {
            Some(template) => {
                template.available = available;
                true
            }
            None => false,
        }
    }
}

impl CardCatalog for MemoryCatalog {
    fn find_templates_by_rarity(&self, rarity: Rarity) -> Vec<&CardTemplate> {
        self.templates
            .iter()
            .filter(|template| template.available && template.rarity == rarity)
            .collect()
    }

    fn find_available(&self) -> Vec<&CardTemplate> {
        self.templates
            .iter()
            .filter(|template| template.available)
            .collect()
    }

    fn template(&self, id: &str) -> Option<&CardTemplate> {
        self.templates.iter().find(|template| template.id == id)
    }
}
