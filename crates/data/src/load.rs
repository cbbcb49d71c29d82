use crate::schema::{
    BoosterRules, CardTemplate, ContentPack, GameConfig, Rarity, RarityTable, SlotRules,
    SoloConfig,
};
use anyhow::{bail, Context};
use cardforge_core::{CardCatalog, MemoryCatalog};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub const RARITIES_FILE: &str = "rarities.json";
pub const BOOSTERS_FILE: &str = "boosters.json";
pub const SLOT_MACHINE_FILE: &str = "slot_machine.json";
pub const SOLO_FILE: &str = "solo.json";
pub const CARDS_FILE: &str = "cards.json";

pub fn load_content_pack(path: &Path) -> anyhow::Result<ContentPack> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let pack = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(pack)
}

/// Loads every table under `dir` and rejects the set if any table is not a
/// usable distribution.
pub fn load_game_config(dir: &Path) -> anyhow::Result<GameConfig> {
    let rarities: RarityTable = load_json(dir.join(RARITIES_FILE))?;
    let boosters: BoosterRules = load_json(dir.join(BOOSTERS_FILE))?;
    let slot_machine: SlotRules = load_json(dir.join(SLOT_MACHINE_FILE))?;
    let solo: SoloConfig = load_json(dir.join(SOLO_FILE))?;

    let config = GameConfig {
        rarities,
        boosters,
        slot_machine,
        solo,
    };
    config
        .validate()
        .with_context(|| format!("validate config in {}", dir.display()))?;
    Ok(config)
}

pub fn load_catalog(dir: &Path) -> anyhow::Result<MemoryCatalog> {
    let path = dir.join("content").join(CARDS_FILE);
    let pack = load_content_pack(&path)?;
    if pack.cards.is_empty() {
        bail!("{} has no cards", path.display());
    }
    let templates: Vec<CardTemplate> = pack.cards.into_iter().map(CardTemplate::from).collect();
    let catalog =
        MemoryCatalog::new(templates).with_context(|| format!("load {}", path.display()))?;
    Ok(catalog)
}

/// Rarities with no available template. Draws of these fall back to the
/// common pool; a missing common pool makes every draw fail.
pub fn missing_rarities<C: CardCatalog + ?Sized>(catalog: &C) -> Vec<Rarity> {
    Rarity::ALL
        .into_iter()
        .filter(|rarity| catalog.find_templates_by_rarity(*rarity).is_empty())
        .collect()
}

fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}
