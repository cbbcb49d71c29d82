use cardforge_core::{
    enemy_reward, multiplier_for, next_event, plan_settlement, resolve_choice, resolve_combat,
    resolve_trap, BoosterTier, CardStats, ChestCounts, ChoiceEventDef, ChoiceOption, EnemyDef,
    EnemyRoster, EnemyTier, Event, EventBus, EventProbabilities, GameStore, MemoryStore, Rarity,
    ResolutionDetail, Rewards, Risk, ScaledEnemy, ScriptedRandom, SoloAction, SoloConfig,
    SoloError, SoloEvent, SoloEventKind, SoloPhase, SoloRun, SoloSummary, StoreError, TrapDef,
};

fn enemy(name: &str, attack: u32, defense: u32) -> EnemyDef {
    EnemyDef {
        name: name.to_string(),
        attack,
        defense,
    }
}

fn probabilities() -> EventProbabilities {
    EventProbabilities {
        chest_common: 0.2,
        chest_rare: 0.1,
        chest_epic: 0.05,
        enemy_weak: 0.2,
        enemy_medium: 0.15,
        enemy_strong: 0.05,
        trap: 0.15,
        choice: 0.1,
    }
}

fn config() -> SoloConfig {
    SoloConfig {
        starting_lives: 3,
        events: probabilities(),
        difficulty_multipliers: vec![1.0, 1.2, 1.4, 1.6, 1.8, 2.0],
        reward_multipliers: vec![1.0, 1.1, 1.25, 1.4, 1.6, 1.8],
        enemies: EnemyRoster {
            weak: vec![enemy("Goblin", 10, 8)],
            medium: vec![enemy("Orc", 25, 20)],
            strong: vec![enemy("Troll", 45, 40)],
        },
        traps: vec![TrapDef {
            name: "Spikes".to_string(),
            damage: 1,
            avoidable: false,
            avoid_chance: 0.0,
        }],
        choices: vec![ChoiceEventDef {
            id: "shrine".to_string(),
            prompt: "A crumbling shrine hums with power.".to_string(),
            options: vec![
                ChoiceOption {
                    label: "Pray".to_string(),
                    rewards: Rewards {
                        tokens: 5,
                        keys: 1,
                        lives: 0,
                    },
                    risk: None,
                },
                ChoiceOption {
                    label: "Loot the altar".to_string(),
                    rewards: Rewards {
                        tokens: 50,
                        keys: 0,
                        lives: 0,
                    },
                    risk: Some(Risk {
                        probability: 0.5,
                        damage: 2,
                    }),
                },
            ],
        }],
    }
}

#[test]
fn shipped_style_config_validates() {
    config().validate().expect("valid");
    let mut broken = config();
    broken.events.choice = 0.2;
    assert!(broken.validate().is_err());
}

#[test]
fn multiplier_index_clamps_to_table() {
    let table = config().difficulty_multipliers;
    assert_eq!(multiplier_for(1, &table), 1.0);
    assert_eq!(multiplier_for(3, &table), 1.4);
    assert_eq!(multiplier_for(6, &table), 2.0);
    assert_eq!(multiplier_for(50, &table), 2.0);
    assert_eq!(multiplier_for(0, &table), 1.0);
    assert_eq!(multiplier_for(4, &[]), 1.0);
}

#[test]
fn enemies_scale_with_level() {
    let scaled = ScaledEnemy::scaled(&enemy("Goblin", 10, 8), EnemyTier::Weak, 1.4);
    assert_eq!(scaled.attack, 14);
    // 11.2 rounds down
    assert_eq!(scaled.defense, 11);
    assert_eq!(scaled.power(), 32.0);

    let rewards = config().reward_multipliers;
    assert_eq!(enemy_reward(EnemyTier::Weak, 1, &rewards), 10);
    assert_eq!(enemy_reward(EnemyTier::Medium, 2, &rewards), 22);
    // 37.5 rounds half away from zero
    assert_eq!(enemy_reward(EnemyTier::Strong, 3, &rewards), 38);
    assert_eq!(enemy_reward(EnemyTier::Strong, 99, &rewards), 54);
}

#[test]
fn tied_combat_is_a_loss() {
    let team = [CardStats::new(60, 40, 0, 0)];
    let foe = ScaledEnemy::scaled(&enemy("Wall", 40, 40), EnemyTier::Medium, 1.0);
    let outcome = resolve_combat(&team, &foe);
    assert_eq!(outcome.team_power, 100);
    assert_eq!(outcome.enemy_power, 100.0);
    assert!(!outcome.victory);

    let stronger = [CardStats::new(60, 40, 0, 0), CardStats::new(1, 0, 0, 0)];
    assert!(resolve_combat(&stronger, &foe).victory);
    assert!(!resolve_combat(&[], &foe).victory);
}

#[test]
fn traps_only_roll_when_avoidable() {
    let fixed = TrapDef {
        name: "Pit".to_string(),
        damage: 2,
        avoidable: false,
        avoid_chance: 0.9,
    };
    let mut rng = ScriptedRandom::new(vec![0.0]);
    let outcome = resolve_trap(&fixed, &mut rng);
    assert!(!outcome.avoided);
    assert_eq!(outcome.damage, 2);
    assert_eq!(rng.draws(), 0);

    let dodgeable = TrapDef {
        avoidable: true,
        avoid_chance: 0.3,
        ..fixed
    };
    let mut rng = ScriptedRandom::new(vec![0.29, 0.3]);
    assert!(resolve_trap(&dodgeable, &mut rng).avoided);
    let hit = resolve_trap(&dodgeable, &mut rng);
    assert!(!hit.avoided);
    assert_eq!(hit.damage, 2);
}

#[test]
fn choice_rewards_apply_even_when_risk_hits() {
    let config = config();
    let risky = &config.choices[0].options[1];
    let mut rng = ScriptedRandom::new(vec![0.4, 0.6]);
    let hit = resolve_choice(risky, &mut rng);
    assert_eq!(hit.damage, 2);
    assert_eq!(hit.rewards.tokens, 50);
    let safe = resolve_choice(risky, &mut rng);
    assert_eq!(safe.damage, 0);
    assert_eq!(safe.rewards.tokens, 50);

    let mut rng = ScriptedRandom::new(vec![0.0]);
    let calm = resolve_choice(&config.choices[0].options[0], &mut rng);
    assert_eq!(calm.damage, 0);
    assert_eq!(rng.draws(), 0);
}

macro_rules! event_roll_case {
    ($name:ident, $roll:expr, $kind:expr) => {
        #[test]
        fn $name() {
            assert_eq!(probabilities().kind_for_roll($roll), $kind);
        }
    };
}

event_roll_case!(roll_chest_common, 0.0, SoloEventKind::ChestCommon);
event_roll_case!(roll_chest_rare, 0.25, SoloEventKind::ChestRare);
event_roll_case!(roll_chest_epic, 0.32, SoloEventKind::ChestEpic);
event_roll_case!(roll_enemy_weak, 0.36, SoloEventKind::EnemyWeak);
event_roll_case!(roll_enemy_medium, 0.6, SoloEventKind::EnemyMedium);
event_roll_case!(roll_enemy_strong, 0.72, SoloEventKind::EnemyStrong);
event_roll_case!(roll_trap, 0.8, SoloEventKind::Trap);
event_roll_case!(roll_choice, 0.95, SoloEventKind::Choice);

#[test]
fn leftover_mass_is_a_common_chest() {
    let mut events = probabilities();
    events.choice = 0.0;
    assert_eq!(events.kind_for_roll(0.95), SoloEventKind::ChestCommon);
}

#[test]
fn next_event_scales_enemies_by_level() {
    let config = config();
    let mut rng = ScriptedRandom::new(vec![0.72, 0.0]);
    let event = next_event(6, &config, &mut rng).expect("event");
    match event {
        SoloEvent::Enemy { enemy, reward } => {
            assert_eq!(enemy.name, "Troll");
            assert_eq!(enemy.tier, EnemyTier::Strong);
            assert_eq!(enemy.attack, 90);
            assert_eq!(enemy.defense, 80);
            assert_eq!(reward, 54);
        }
        other => panic!("expected enemy, got {other:?}"),
    }

    let mut empty = config.clone();
    empty.traps.clear();
    let mut rng = ScriptedRandom::new(vec![0.8]);
    assert!(matches!(
        next_event(1, &empty, &mut rng),
        Err(SoloError::EmptyPool(SoloEventKind::Trap))
    ));
}

#[test]
fn run_plays_until_defeat() {
    let config = config();
    let store = MemoryStore::new();
    let user = store.create_account("ada", 0);
    let mut run = SoloRun::new();
    let mut events = EventBus::default();
    let mut rng = ScriptedRandom::new(vec![0.0, 0.36, 0.0, 0.8, 0.0, 0.95, 0.0, 0.1]);

    assert!(matches!(
        run.next_level(&config, &mut rng, &mut events),
        Err(SoloError::NotInProgress(SoloPhase::NotStarted))
    ));
    run.start(&config, &mut events).expect("start");
    assert!(matches!(
        run.start(&config, &mut events),
        Err(SoloError::AlreadyInProgress)
    ));
    assert_eq!(run.state().lives, 3);

    // level 1: common chest
    let event = run.next_level(&config, &mut rng, &mut events).expect("level 1");
    assert_eq!(event.kind(), SoloEventKind::ChestCommon);
    run.resolve(SoloAction::OpenChest, &mut rng, &mut events)
        .expect("chest");
    assert_eq!(run.state().chests.common, 1);

    // level 2: weak goblin scaled by 1.2
    run.next_level(&config, &mut rng, &mut events).expect("level 2");
    let err = run
        .resolve(SoloAction::OpenChest, &mut rng, &mut events)
        .expect_err("mismatch");
    assert!(matches!(err, SoloError::ActionMismatch(SoloEventKind::EnemyWeak)));
    assert!(run.pending().is_some());
    assert!(matches!(
        run.next_level(&config, &mut rng, &mut events),
        Err(SoloError::EventPending)
    ));
    let team = vec![CardStats::new(20, 15, 0, 0)];
    let fight = run
        .resolve(SoloAction::Fight(team), &mut rng, &mut events)
        .expect("fight");
    match fight.detail {
        ResolutionDetail::Combat { outcome, reward } => {
            assert!(outcome.victory);
            assert_eq!(outcome.enemy_power, 28.0);
            assert_eq!(reward, 11);
        }
        other => panic!("expected combat, got {other:?}"),
    }
    assert_eq!(run.state().tokens_earned, 11);
    assert_eq!(run.state().enemies_defeated, 1);

    // level 3: unavoidable trap
    run.next_level(&config, &mut rng, &mut events).expect("level 3");
    let trap = run
        .resolve(SoloAction::EndureTrap, &mut rng, &mut events)
        .expect("trap");
    assert_eq!(trap.damage, 1);
    assert_eq!(trap.lives, 2);

    // level 4: the risky option takes the last two lives
    run.next_level(&config, &mut rng, &mut events).expect("level 4");
    assert!(matches!(
        run.resolve(SoloAction::Choose(5), &mut rng, &mut events),
        Err(SoloError::InvalidOption(5))
    ));
    let choice = run
        .resolve(SoloAction::Choose(1), &mut rng, &mut events)
        .expect("choice");
    assert_eq!(choice.damage, 2);
    assert_eq!(choice.lives, 0);
    assert_eq!(choice.phase, SoloPhase::Defeated);
    assert_eq!(run.state().tokens_earned, 61);
    assert_eq!(rng.draws(), 8);

    assert!(matches!(
        run.next_level(&config, &mut rng, &mut events),
        Err(SoloError::NotInProgress(SoloPhase::Defeated))
    ));
    assert!(events.drain().any(|event| matches!(
        event,
        Event::SoloEnded {
            phase: SoloPhase::Defeated,
            level: 4,
            tokens: 61
        }
    )));

    let settlement = run.settle(&store, user).expect("settle");
    assert_eq!(settlement.summary.level, 4);
    assert_eq!(settlement.tokens_credited, 61);
    assert!(settlement.boosters.is_empty());
    assert_eq!(settlement.unopened_chests, 1);
    assert_eq!(store.account(user).expect("account").token_balance, 61);

    assert!(matches!(
        run.settle(&store, user),
        Err(SoloError::AlreadySettled)
    ));
    assert_eq!(store.account(user).expect("account").token_balance, 61);
}

#[test]
fn retreat_discards_pending_event() {
    let config = config();
    let mut run = SoloRun::default();
    let mut events = EventBus::default();
    let mut rng = ScriptedRandom::new(vec![0.36, 0.0]);

    assert!(matches!(run.summary(), Err(SoloError::NotEnded)));
    run.start(&config, &mut events).expect("start");
    run.next_level(&config, &mut rng, &mut events).expect("level 1");
    run.retreat(&mut events).expect("retreat");
    assert_eq!(run.phase(), SoloPhase::Retreated);
    assert!(run.pending().is_none());
    assert!(matches!(
        run.resolve(SoloAction::Fight(Vec::new()), &mut rng, &mut events),
        Err(SoloError::NotInProgress(SoloPhase::Retreated))
    ));

    // an ended run can be replaced by a fresh one
    run.start(&config, &mut events).expect("restart");
    assert_eq!(run.phase(), SoloPhase::InProgress);
    assert_eq!(run.state().level, 0);
}

#[test]
fn losing_a_fight_costs_one_life() {
    let config = config();
    let mut run = SoloRun::new();
    let mut events = EventBus::default();
    let mut rng = ScriptedRandom::new(vec![0.72, 0.0]);
    run.start(&config, &mut events).expect("start");
    run.next_level(&config, &mut rng, &mut events).expect("level 1");
    let resolution = run
        .resolve(SoloAction::Fight(vec![CardStats::new(5, 5, 0, 0)]), &mut rng, &mut events)
        .expect("fight");
    assert_eq!(resolution.damage, 1);
    assert_eq!(resolution.lives, 2);
    assert_eq!(resolution.phase, SoloPhase::InProgress);
    assert_eq!(run.state().tokens_earned, 0);
}

#[test]
fn settlement_turns_keyed_chests_into_boosters() {
    let summary = SoloSummary {
        phase: SoloPhase::Retreated,
        level: 7,
        tokens_earned: 40,
        keys: 2,
        chests: ChestCounts {
            common: 2,
            rare: 1,
            epic: 1,
        },
        enemies_defeated: 3,
    };
    let plan = plan_settlement(&summary);
    assert_eq!(plan.tokens, 40);
    assert_eq!(plan.boosters, vec![BoosterTier::Epic, BoosterTier::Rare]);
    assert_eq!(plan.unopened_chests, 2);

    let keyless = plan_settlement(&SoloSummary { keys: 0, ..summary });
    assert!(keyless.boosters.is_empty());
    assert_eq!(keyless.unopened_chests, 4);
}

/// Level 1 is a common chest, level 2 the shrine where praying earns a key.
fn keyed_run() -> SoloRun {
    let config = config();
    let mut run = SoloRun::new();
    let mut events = EventBus::default();
    let mut rng = ScriptedRandom::new(vec![0.0, 0.95, 0.0]);
    run.start(&config, &mut events).expect("start");
    run.next_level(&config, &mut rng, &mut events).expect("level 1");
    run.resolve(SoloAction::OpenChest, &mut rng, &mut events)
        .expect("chest");
    let event = run.next_level(&config, &mut rng, &mut events).expect("level 2");
    assert_eq!(event.kind(), SoloEventKind::Choice);
    run.resolve(SoloAction::Choose(0), &mut rng, &mut events)
        .expect("pray");
    run.retreat(&mut events).expect("retreat");
    run
}

#[test]
fn run_pays_out_once() {
    let store = MemoryStore::new();
    let user = store.create_account("ada", 10);
    let mut run = keyed_run();
    let tokens = run.state().tokens_earned;
    assert!(tokens > 0);

    let settlement = run.settle(&store, user).expect("settle");
    assert_eq!(settlement.summary.phase, SoloPhase::Retreated);
    assert_eq!(settlement.boosters, vec![BoosterTier::Common]);
    assert_eq!(settlement.unopened_chests, 0);
    assert_eq!(settlement.balance, 10 + tokens);

    for _ in 0..2 {
        let err = run.settle(&store, user).expect_err("second payout");
        assert!(matches!(err, SoloError::AlreadySettled));
    }
    let account = store.account(user).expect("account");
    assert_eq!(account.token_balance, 10 + tokens);
    assert_eq!(account.boosters.common, 1);
}

#[test]
fn failed_payout_grants_nothing_and_can_be_retried() {
    let store = MemoryStore::new();
    let rich = store.create_account("midas", u64::MAX);
    let mut run = keyed_run();

    let err = run.settle(&store, rich).expect_err("overflow");
    assert!(matches!(err, SoloError::Store(StoreError::Overflow)));
    let account = store.account(rich).expect("account");
    assert_eq!(account.token_balance, u64::MAX);
    assert_eq!(account.boosters.total(), 0);

    let user = store.create_account("ada", 0);
    let settlement = run.settle(&store, user).expect("retry");
    assert_eq!(settlement.boosters, vec![BoosterTier::Common]);
}

#[test]
fn unfinished_run_cannot_settle() {
    let config = config();
    let store = MemoryStore::new();
    let user = store.create_account("ada", 0);
    let mut run = SoloRun::new();
    let mut events = EventBus::default();
    assert!(matches!(run.settle(&store, user), Err(SoloError::NotEnded)));
    run.start(&config, &mut events).expect("start");
    assert!(matches!(run.settle(&store, user), Err(SoloError::NotEnded)));
    assert_eq!(store.account(user).expect("account").token_balance, 0);
}

#[test]
fn chest_events_carry_their_rarity() {
    let config = config();
    let mut rng = ScriptedRandom::new(vec![0.32]);
    let event = next_event(1, &config, &mut rng).expect("event");
    assert_eq!(event, SoloEvent::Chest { rarity: Rarity::Epic });
    let json = serde_json::to_value(&event).expect("json");
    assert_eq!(json["kind"], "chest");
    assert_eq!(json["rarity"], "epic");
}
