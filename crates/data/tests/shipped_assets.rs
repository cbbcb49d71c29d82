use cardforge_core::{
    BoosterRules, CardCatalog, EnemyTier, Rarity, RarityTable, SlotRules, SoloEventKind,
};
use cardforge_data::{load_catalog, load_game_config, missing_rarities};
use std::fs;
use std::path::{Path, PathBuf};

fn assets_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("assets")
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("cardforge-{}-{name}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("content")).expect("scratch dir");
    dir
}

fn copy_assets(to: &Path) {
    for file in ["rarities.json", "boosters.json", "slot_machine.json", "solo.json"] {
        fs::copy(assets_root().join(file), to.join(file)).expect("copy asset");
    }
}

#[test]
fn shipped_tables_match_defaults() {
    let config = load_game_config(&assets_root()).expect("load config");
    assert_eq!(config.rarities, RarityTable::default());
    assert_eq!(config.boosters, BoosterRules::default());
    assert_eq!(config.slot_machine, SlotRules::default());
}

#[test]
fn shipped_solo_config_is_complete() {
    let config = load_game_config(&assets_root()).expect("load config");
    let solo = &config.solo;
    assert_eq!(solo.starting_lives, 3);
    assert!((solo.events.total() - 1.0).abs() < 1e-9);
    assert_eq!(solo.events.probability(SoloEventKind::ChestCommon), 0.20);
    assert_eq!(solo.difficulty_multipliers.len(), 6);
    assert_eq!(solo.reward_multipliers.last().copied(), Some(1.8));
    for tier in EnemyTier::ALL {
        assert!(!solo.enemies.pool(tier).is_empty(), "{tier:?} pool empty");
    }
    assert!(solo.choices.iter().all(|choice| !choice.options.is_empty()));
}

#[test]
fn shipped_catalog_covers_every_rarity() {
    let catalog = load_catalog(&assets_root()).expect("load catalog");
    assert!(missing_rarities(&catalog).is_empty());
    let scarecrow = catalog.template("old-scarecrow").expect("retired card");
    assert!(!scarecrow.available);
    assert!(catalog
        .find_templates_by_rarity(Rarity::Common)
        .iter()
        .all(|template| template.id != "old-scarecrow"));
    assert_eq!(
        catalog.template("ember-fox").map(|t| t.image_url.as_str()),
        Some("/cards/ember-fox.png")
    );
}

#[test]
fn invalid_rarity_table_fails_loading() {
    let dir = scratch_dir("bad-rarities");
    copy_assets(&dir);
    fs::write(
        dir.join("rarities.json"),
        r#"{
          "common": { "common": 0.80, "rare": 0.15, "epic": 0.04, "legendary": 0.01 },
          "rare": { "common": 0.55, "rare": 0.35, "epic": 0.08, "legendary": 0.02 },
          "epic": { "common": 0.30, "rare": 0.45, "epic": 0.20, "legendary": 0.05 },
          "legendary": { "common": 0.15, "rare": 0.35, "epic": 0.35, "legendary": 0.50 }
        }"#,
    )
    .expect("write");
    let err = load_game_config(&dir).expect_err("sum above one");
    let message = format!("{err:#}");
    assert!(message.contains("legendary booster rarity weights"), "{message}");
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_file_names_the_path() {
    let dir = scratch_dir("missing");
    let err = load_game_config(&dir).expect_err("nothing there");
    assert!(format!("{err:#}").contains("rarities.json"));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn duplicate_card_ids_are_rejected() {
    let dir = scratch_dir("dupes");
    let card = r#"{ "id": "twin", "name": "Twin", "rarity": "common", "stats": { "attack": 1, "defense": 1, "magic": 1, "speed": 1 } }"#;
    fs::write(
        dir.join("content").join("cards.json"),
        format!(r#"{{ "cards": [{card}, {card}] }}"#),
    )
    .expect("write");
    let err = load_catalog(&dir).expect_err("duplicate");
    assert!(format!("{err:#}").contains("duplicate card template id twin"));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn catalog_without_rare_cards_is_reported() {
    let dir = scratch_dir("sparse");
    fs::write(
        dir.join("content").join("cards.json"),
        r#"{ "cards": [
            { "id": "a", "name": "A", "rarity": "common", "stats": { "attack": 1, "defense": 1, "magic": 1, "speed": 1 } },
            { "id": "b", "name": "B", "rarity": "epic", "stats": { "attack": 1, "defense": 1, "magic": 1, "speed": 1 } }
        ] }"#,
    )
    .expect("write");
    let catalog = load_catalog(&dir).expect("load");
    assert_eq!(
        missing_rarities(&catalog),
        vec![Rarity::Rare, Rarity::Legendary]
    );
    let _ = fs::remove_dir_all(&dir);
}
