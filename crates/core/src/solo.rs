use crate::{
    BoosterTier, CardStats, ConfigError, ErrorKind, Event, EventBus, GameStore, RandomSource,
    Rarity, StoreError, UserId, WEIGHT_EPSILON,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lives lost when the team is beaten by an enemy.
pub const ENEMY_DEFEAT_DAMAGE: u32 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SoloEventKind {
    ChestCommon,
    ChestRare,
    ChestEpic,
    EnemyWeak,
    EnemyMedium,
    EnemyStrong,
    Trap,
    Choice,
}

impl SoloEventKind {
    /// Declaration order of the cumulative walk.
    pub const ORDER: [SoloEventKind; 8] = [
        SoloEventKind::ChestCommon,
        SoloEventKind::ChestRare,
        SoloEventKind::ChestEpic,
        SoloEventKind::EnemyWeak,
        SoloEventKind::EnemyMedium,
        SoloEventKind::EnemyStrong,
        SoloEventKind::Trap,
        SoloEventKind::Choice,
    ];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EventProbabilities {
    pub chest_common: f64,
    pub chest_rare: f64,
    pub chest_epic: f64,
    pub enemy_weak: f64,
    pub enemy_medium: f64,
    pub enemy_strong: f64,
    pub trap: f64,
    pub choice: f64,
}

impl EventProbabilities {
    pub fn probability(&self, kind: SoloEventKind) -> f64 {
        match kind {
            SoloEventKind::ChestCommon => self.chest_common,
            SoloEventKind::ChestRare => self.chest_rare,
            SoloEventKind::ChestEpic => self.chest_epic,
            SoloEventKind::EnemyWeak => self.enemy_weak,
            SoloEventKind::EnemyMedium => self.enemy_medium,
            SoloEventKind::EnemyStrong => self.enemy_strong,
            SoloEventKind::Trap => self.trap,
            SoloEventKind::Choice => self.choice,
        }
    }

    pub fn total(&self) -> f64 {
        SoloEventKind::ORDER
            .iter()
            .map(|kind| self.probability(*kind))
            .sum()
    }

    /// Leftover mass past the last bucket resolves to a common chest.
    pub fn kind_for_roll(&self, roll: f64) -> SoloEventKind {
        let mut cumulative = 0.0;
        for kind in SoloEventKind::ORDER {
            cumulative += self.probability(kind);
            if roll < cumulative {
                return kind;
            }
        }
        SoloEventKind::ChestCommon
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in SoloEventKind::ORDER {
            let value = self.probability(kind);
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NegativeEventProbability { kind, value });
            }
        }
        let total = self.total();
        if total > 1.0 + WEIGHT_EPSILON {
            return Err(ConfigError::EventProbabilitiesSum(total));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EnemyTier {
    Weak,
    Medium,
    Strong,
}

impl EnemyTier {
    pub const ALL: [EnemyTier; 3] = [EnemyTier::Weak, EnemyTier::Medium, EnemyTier::Strong];

    pub fn base_reward(self) -> u64 {
        match self {
            Self::Weak => 10,
            Self::Medium => 20,
            Self::Strong => 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnemyDef {
    pub name: String,
    pub attack: u32,
    pub defense: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScaledEnemy {
    pub name: String,
    pub tier: EnemyTier,
    pub attack: u32,
    pub defense: u32,
}

impl ScaledEnemy {
    pub fn scaled(def: &EnemyDef, tier: EnemyTier, multiplier: f64) -> Self {
        Self {
            name: def.name.clone(),
            tier,
            attack: scale_stat(def.attack, multiplier),
            defense: scale_stat(def.defense, multiplier),
        }
    }

    pub fn power(&self) -> f64 {
        self.attack as f64 * 1.5 + self.defense as f64
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnemyRoster {
    pub weak: Vec<EnemyDef>,
    pub medium: Vec<EnemyDef>,
    pub strong: Vec<EnemyDef>,
}

impl EnemyRoster {
    pub fn pool(&self, tier: EnemyTier) -> &[EnemyDef] {
        match tier {
            EnemyTier::Weak => &self.weak,
            EnemyTier::Medium => &self.medium,
            EnemyTier::Strong => &self.strong,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrapDef {
    pub name: String,
    pub damage: u32,
    #[serde(default)]
    pub avoidable: bool,
    #[serde(default)]
    pub avoid_chance: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rewards {
    #[serde(default)]
    pub tokens: u64,
    #[serde(default)]
    pub keys: u32,
    #[serde(default)]
    pub lives: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Risk {
    pub probability: f64,
    pub damage: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChoiceOption {
    pub label: String,
    #[serde(default)]
    pub rewards: Rewards,
    #[serde(default)]
    pub risk: Option<Risk>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChoiceEventDef {
    pub id: String,
    pub prompt: String,
    pub options: Vec<ChoiceOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoloConfig {
    pub starting_lives: u32,
    pub events: EventProbabilities,
    pub difficulty_multipliers: Vec<f64>,
    pub reward_multipliers: Vec<f64>,
    pub enemies: EnemyRoster,
    pub traps: Vec<TrapDef>,
    pub choices: Vec<ChoiceEventDef>,
}

impl SoloConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.starting_lives == 0 {
            return Err(ConfigError::NoStartingLives);
        }
        self.events.validate()?;
        for (name, table) in [
            ("difficulty_multipliers", &self.difficulty_multipliers),
            ("reward_multipliers", &self.reward_multipliers),
        ] {
            if table.is_empty() {
                return Err(ConfigError::EmptyMultiplierTable(name));
            }
            if let Some(value) = table.iter().find(|value| !value.is_finite() || **value < 0.0) {
                return Err(ConfigError::InvalidMultiplier {
                    table: name,
                    value: *value,
                });
            }
        }
        for tier in EnemyTier::ALL {
            if self.enemies.pool(tier).is_empty() {
                return Err(ConfigError::EmptyEnemyPool(tier));
            }
        }
        if self.traps.is_empty() {
            return Err(ConfigError::EmptyPool("traps"));
        }
        if self.choices.is_empty() {
            return Err(ConfigError::EmptyPool("choices"));
        }
        for trap in &self.traps {
            if trap.avoidable {
                check_probability(&trap.name, trap.avoid_chance)?;
            }
        }
        for choice in &self.choices {
            if choice.options.is_empty() {
                return Err(ConfigError::ChoiceWithoutOptions(choice.id.clone()));
            }
            for option in &choice.options {
                if let Some(risk) = option.risk {
                    check_probability(&choice.id, risk.probability)?;
                }
            }
        }
        Ok(())
    }
}

fn check_probability(context: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability {
            context: context.to_string(),
            value,
        })
    }
}

/// Multiplier for `level` (1-based); clamps to the last entry past the table.
pub fn multiplier_for(level: u32, table: &[f64]) -> f64 {
    if table.is_empty() {
        return 1.0;
    }
    let index = (level.saturating_sub(1) as usize).min(table.len() - 1);
    table[index]
}

pub fn scale_stat(base: u32, multiplier: f64) -> u32 {
    (base as f64 * multiplier).round() as u32
}

pub fn team_power(cards: &[CardStats]) -> u64 {
    cards
        .iter()
        .map(|card| u64::from(card.attack) + u64::from(card.defense))
        .sum()
}

pub fn enemy_reward(tier: EnemyTier, level: u32, reward_multipliers: &[f64]) -> u64 {
    (tier.base_reward() as f64 * multiplier_for(level, reward_multipliers)).round() as u64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatOutcome {
    pub team_power: u64,
    pub enemy_power: f64,
    pub victory: bool,
}

/// A tie goes to the enemy.
pub fn resolve_combat(team: &[CardStats], enemy: &ScaledEnemy) -> CombatOutcome {
    let team_power = team_power(team);
    let enemy_power = enemy.power();
    CombatOutcome {
        team_power,
        enemy_power,
        victory: team_power as f64 > enemy_power,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapOutcome {
    pub avoided: bool,
    pub damage: u32,
}

pub fn resolve_trap<R: RandomSource + ?Sized>(trap: &TrapDef, rng: &mut R) -> TrapOutcome {
    let avoided = trap.avoidable && rng.next_f64() < trap.avoid_chance;
    TrapOutcome {
        avoided,
        damage: if avoided { 0 } else { trap.damage },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceOutcome {
    pub rewards: Rewards,
    pub damage: u32,
}

/// Rewards always apply; the risk roll is independent of them.
pub fn resolve_choice<R: RandomSource + ?Sized>(
    option: &ChoiceOption,
    rng: &mut R,
) -> ChoiceOutcome {
    let damage = match option.risk {
        Some(risk) if rng.next_f64() < risk.probability => risk.damage,
        _ => 0,
    };
    ChoiceOutcome {
        rewards: option.rewards,
        damage,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SoloEvent {
    Chest { rarity: Rarity },
    Enemy { enemy: ScaledEnemy, reward: u64 },
    Trap { trap: TrapDef },
    Choice { choice: ChoiceEventDef },
}

impl SoloEvent {
    pub fn kind(&self) -> SoloEventKind {
        match self {
            Self::Chest { rarity } => match rarity {
                Rarity::Epic | Rarity::Legendary => SoloEventKind::ChestEpic,
                Rarity::Rare => SoloEventKind::ChestRare,
                Rarity::Common => SoloEventKind::ChestCommon,
            },
            Self::Enemy { enemy, .. } => match enemy.tier {
                EnemyTier::Weak => SoloEventKind::EnemyWeak,
                EnemyTier::Medium => SoloEventKind::EnemyMedium,
                EnemyTier::Strong => SoloEventKind::EnemyStrong,
            },
            Self::Trap { .. } => SoloEventKind::Trap,
            Self::Choice { .. } => SoloEventKind::Choice,
        }
    }
}

/// Draws the event for `level`.
pub fn next_event<R: RandomSource + ?Sized>(
    level: u32,
    config: &SoloConfig,
    rng: &mut R,
) -> Result<SoloEvent, SoloError> {
    let kind = config.events.kind_for_roll(rng.next_f64());
    let event = match kind {
        SoloEventKind::ChestCommon => SoloEvent::Chest {
            rarity: Rarity::Common,
        },
        SoloEventKind::ChestRare => SoloEvent::Chest {
            rarity: Rarity::Rare,
        },
        SoloEventKind::ChestEpic => SoloEvent::Chest {
            rarity: Rarity::Epic,
        },
        SoloEventKind::EnemyWeak | SoloEventKind::EnemyMedium | SoloEventKind::EnemyStrong => {
            let tier = match kind {
                SoloEventKind::EnemyWeak => EnemyTier::Weak,
                SoloEventKind::EnemyMedium => EnemyTier::Medium,
                _ => EnemyTier::Strong,
            };
            let def = pick(config.enemies.pool(tier), rng).ok_or(SoloError::EmptyPool(kind))?;
            let multiplier = multiplier_for(level, &config.difficulty_multipliers);
            SoloEvent::Enemy {
                enemy: ScaledEnemy::scaled(def, tier, multiplier),
                reward: enemy_reward(tier, level, &config.reward_multipliers),
            }
        }
        SoloEventKind::Trap => SoloEvent::Trap {
            trap: pick(&config.traps, rng)
                .ok_or(SoloError::EmptyPool(kind))?
                .clone(),
        },
        SoloEventKind::Choice => SoloEvent::Choice {
            choice: pick(&config.choices, rng)
                .ok_or(SoloError::EmptyPool(kind))?
                .clone(),
        },
    };
    Ok(event)
}

fn pick<'a, T, R: RandomSource + ?Sized>(items: &'a [T], rng: &mut R) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.next_index(items.len()))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SoloPhase {
    NotStarted,
    InProgress,
    Defeated,
    Retreated,
}

impl SoloPhase {
    pub fn is_ended(self) -> bool {
        matches!(self, Self::Defeated | Self::Retreated)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChestCounts {
    pub common: u32,
    pub rare: u32,
    pub epic: u32,
}

impl ChestCounts {
    fn add(&mut self, rarity: Rarity) {
        match rarity {
            Rarity::Common => self.common += 1,
            Rarity::Rare => self.rare += 1,
            Rarity::Epic | Rarity::Legendary => self.epic += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.common + self.rare + self.epic
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SoloRunState {
    pub lives: u32,
    pub keys: u32,
    pub chests: ChestCounts,
    pub tokens_earned: u64,
    pub level: u32,
    pub enemies_defeated: u32,
}

#[derive(Debug, Clone)]
pub enum SoloAction {
    OpenChest,
    Fight(Vec<CardStats>),
    EndureTrap,
    Choose(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionDetail {
    Chest { rarity: Rarity },
    Combat { outcome: CombatOutcome, reward: u64 },
    Trap { outcome: TrapOutcome },
    Choice { option: usize, outcome: ChoiceOutcome },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub detail: ResolutionDetail,
    pub damage: u32,
    pub lives: u32,
    pub phase: SoloPhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoloSummary {
    pub phase: SoloPhase,
    pub level: u32,
    pub tokens_earned: u64,
    pub keys: u32,
    pub chests: ChestCounts,
    pub enemies_defeated: u32,
}

#[derive(Debug, Error)]
pub enum SoloError {
    #[error("a run is already in progress")]
    AlreadyInProgress,
    #[error("no run in progress (phase {0:?})")]
    NotInProgress(SoloPhase),
    #[error("resolve the current event first")]
    EventPending,
    #[error("no event to resolve")]
    NoPendingEvent,
    #[error("action does not match the current {0:?} event")]
    ActionMismatch(SoloEventKind),
    #[error("invalid choice option {0}")]
    InvalidOption(usize),
    #[error("run has not ended")]
    NotEnded,
    #[error("run already settled")]
    AlreadySettled,
    #[error("no entries configured for {0:?}")]
    EmptyPool(SoloEventKind),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SoloError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidOption(_) | Self::ActionMismatch(_) => ErrorKind::InvalidInput,
            Self::EmptyPool(_) => ErrorKind::Internal,
            Self::Store(err) => err.kind(),
            _ => ErrorKind::Conflict,
        }
    }
}

/// One player's solo session. `NotStarted -> InProgress -> Defeated | Retreated`;
/// ended runs are never resumed, `start` begins a fresh one.
#[derive(Debug, Clone)]
pub struct SoloRun {
    phase: SoloPhase,
    state: SoloRunState,
    pending: Option<SoloEvent>,
    settled: bool,
}

impl Default for SoloRun {
    fn default() -> Self {
        Self::new()
    }
}

impl SoloRun {
    pub fn new() -> Self {
        Self {
            phase: SoloPhase::NotStarted,
            state: SoloRunState::default(),
            pending: None,
            settled: false,
        }
    }

    pub fn phase(&self) -> SoloPhase {
        self.phase
    }

    pub fn state(&self) -> &SoloRunState {
        &self.state
    }

    pub fn pending(&self) -> Option<&SoloEvent> {
        self.pending.as_ref()
    }

    pub fn start(&mut self, config: &SoloConfig, events: &mut EventBus) -> Result<(), SoloError> {
        if self.phase == SoloPhase::InProgress {
            return Err(SoloError::AlreadyInProgress);
        }
        self.phase = SoloPhase::InProgress;
        self.state = SoloRunState {
            lives: config.starting_lives,
            ..SoloRunState::default()
        };
        self.pending = None;
        self.settled = false;
        tracing::info!(lives = config.starting_lives, "solo run started");
        events.push(Event::SoloStarted {
            lives: config.starting_lives,
        });
        Ok(())
    }

    /// Advances one level and draws its event.
    pub fn next_level<R: RandomSource + ?Sized>(
        &mut self,
        config: &SoloConfig,
        rng: &mut R,
        events: &mut EventBus,
    ) -> Result<&SoloEvent, SoloError> {
        self.ensure_in_progress()?;
        if self.pending.is_some() {
            return Err(SoloError::EventPending);
        }
        let level = self.state.level + 1;
        let event = next_event(level, config, rng)?;
        self.state.level = level;
        tracing::debug!(level, kind = ?event.kind(), "solo encounter");
        events.push(Event::SoloEncounter {
            level,
            kind: event.kind(),
        });
        let event = self.pending.insert(event);
        Ok(&*event)
    }

    pub fn resolve<R: RandomSource + ?Sized>(
        &mut self,
        action: SoloAction,
        rng: &mut R,
        events: &mut EventBus,
    ) -> Result<Resolution, SoloError> {
        self.ensure_in_progress()?;
        let event = self.pending.take().ok_or(SoloError::NoPendingEvent)?;
        let resolved = match (&event, action) {
            (SoloEvent::Chest { rarity }, SoloAction::OpenChest) => {
                self.state.chests.add(*rarity);
                Ok((ResolutionDetail::Chest { rarity: *rarity }, 0))
            }
            (SoloEvent::Enemy { enemy, reward }, SoloAction::Fight(team)) => {
                let outcome = resolve_combat(&team, enemy);
                if outcome.victory {
                    self.state.tokens_earned += reward;
                    self.state.enemies_defeated += 1;
                    let detail = ResolutionDetail::Combat {
                        outcome,
                        reward: *reward,
                    };
                    Ok((detail, 0))
                } else {
                    let detail = ResolutionDetail::Combat { outcome, reward: 0 };
                    Ok((detail, ENEMY_DEFEAT_DAMAGE))
                }
            }
            (SoloEvent::Trap { trap }, SoloAction::EndureTrap) => {
                let outcome = resolve_trap(trap, rng);
                Ok((ResolutionDetail::Trap { outcome }, outcome.damage))
            }
            (SoloEvent::Choice { choice }, SoloAction::Choose(index)) => {
                match choice.options.get(index) {
                    Some(option) => {
                        let outcome = resolve_choice(option, rng);
                        self.state.tokens_earned += outcome.rewards.tokens;
                        self.state.keys += outcome.rewards.keys;
                        self.state.lives += outcome.rewards.lives;
                        let detail = ResolutionDetail::Choice {
                            option: index,
                            outcome,
                        };
                        Ok((detail, outcome.damage))
                    }
                    None => Err(SoloError::InvalidOption(index)),
                }
            }
            (other, _) => Err(SoloError::ActionMismatch(other.kind())),
        };
        let (detail, damage) = match resolved {
            Ok(value) => value,
            Err(err) => {
                self.pending = Some(event);
                return Err(err);
            }
        };
        if damage > 0 {
            self.state.lives = self.state.lives.saturating_sub(damage);
            events.push(Event::SoloDamaged {
                amount: damage,
                lives: self.state.lives,
            });
            if self.state.lives == 0 {
                self.end(SoloPhase::Defeated, events);
            }
        }
        Ok(Resolution {
            detail,
            damage,
            lives: self.state.lives,
            phase: self.phase,
        })
    }

    /// Leaves the run voluntarily, discarding any unresolved event.
    pub fn retreat(&mut self, events: &mut EventBus) -> Result<(), SoloError> {
        self.ensure_in_progress()?;
        self.pending = None;
        self.end(SoloPhase::Retreated, events);
        Ok(())
    }

    /// Totals of an ended run.
    pub fn summary(&self) -> Result<SoloSummary, SoloError> {
        if !self.phase.is_ended() {
            return Err(SoloError::NotEnded);
        }
        Ok(SoloSummary {
            phase: self.phase,
            level: self.state.level,
            tokens_earned: self.state.tokens_earned,
            keys: self.state.keys,
            chests: self.state.chests,
            enemies_defeated: self.state.enemies_defeated,
        })
    }

    /// Pays out an ended run to `user`. Tokens and boosters are granted in
    /// one store step, and a run pays out once.
    pub fn settle<S: GameStore + ?Sized>(
        &mut self,
        store: &S,
        user: UserId,
    ) -> Result<Settlement, SoloError> {
        let summary = self.summary()?;
        if self.settled {
            return Err(SoloError::AlreadySettled);
        }
        let plan = plan_settlement(&summary);
        let balance = store.grant_rewards(user, plan.tokens, &plan.boosters)?;
        self.settled = true;
        tracing::info!(
            user = %user,
            tokens = plan.tokens,
            boosters = plan.boosters.len(),
            unopened_chests = plan.unopened_chests,
            "solo run settled"
        );
        Ok(Settlement {
            summary,
            tokens_credited: plan.tokens,
            boosters: plan.boosters,
            unopened_chests: plan.unopened_chests,
            balance,
        })
    }

    fn ensure_in_progress(&self) -> Result<(), SoloError> {
        if self.phase != SoloPhase::InProgress {
            return Err(SoloError::NotInProgress(self.phase));
        }
        Ok(())
    }

    fn end(&mut self, phase: SoloPhase, events: &mut EventBus) {
        self.phase = phase;
        tracing::info!(
            ?phase,
            level = self.state.level,
            tokens = self.state.tokens_earned,
            "solo run ended"
        );
        events.push(Event::SoloEnded {
            phase,
            level: self.state.level,
            tokens: self.state.tokens_earned,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub summary: SoloSummary,
    pub tokens_credited: u64,
    pub boosters: Vec<BoosterTier>,
    pub unopened_chests: u32,
    pub balance: u64,
}

/// What an ended run is worth before anything is credited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPlan {
    pub tokens: u64,
    pub boosters: Vec<BoosterTier>,
    pub unopened_chests: u32,
}

/// Tokens carry over as earned. Each key opens one chest, rarest first, and
/// an opened chest becomes a booster of the same tier.
pub fn plan_settlement(summary: &SoloSummary) -> SettlementPlan {
    let mut keys = summary.keys;
    let mut boosters = Vec::new();
    for (tier, count) in [
        (BoosterTier::Epic, summary.chests.epic),
        (BoosterTier::Rare, summary.chests.rare),
        (BoosterTier::Common, summary.chests.common),
    ] {
        let opened = count.min(keys);
        keys -= opened;
        boosters.extend(std::iter::repeat(tier).take(opened as usize));
    }
    SettlementPlan {
        tokens: summary.tokens_earned,
        unopened_chests: summary.chests.total() - boosters.len() as u32,
        boosters,
    }
}
