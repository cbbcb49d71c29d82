use serde::{Deserialize, Serialize};

pub use cardforge_core::{
    BoosterRules, CardStats, CardTemplate, ChoiceEventDef, EnemyRoster, EventProbabilities,
    GameConfig, Rarity, RarityTable, SlotRules, SoloConfig, TrapDef,
};

/// One catalog row as authored in `content/cards.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDef {
    pub id: String,
    pub name: String,
    pub rarity: Rarity,
    pub stats: CardStats,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub retired: bool,
}

impl From<CardDef> for CardTemplate {
    fn from(def: CardDef) -> Self {
        CardTemplate {
            id: def.id,
            name: def.name,
            rarity: def.rarity,
            stats: def.stats,
            image_url: def.image_url,
            description: def.description,
            available: !def.retired,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPack {
    pub cards: Vec<CardDef>,
}
