use anyhow::{bail, Context};
use cardforge_core::{
    parse_booster_type, AcceptAllVerifier, BoosterOpening, BoosterPurchaseClaim,
    BoosterService, CardCatalog, CardStats, Event, EventBus, GameConfig, GameStore, Marketplace,
    MemoryCatalog, MemoryStore, OwnedCard, ResolutionDetail, RngState, SlotMachine, SlotOutcome,
    SoloAction, SoloEvent, SoloPhase, SoloRun, UserId,
};
use cardforge_data::{load_catalog, load_game_config, missing_rarities};
use chrono::{Local, Utc};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_SEED: u64 = 0xC0FFEE;
const DEFAULT_BALANCE: u64 = 1000;
const RIVAL_BALANCE: u64 = 500;
const TEAM_SIZE: usize = 3;

#[derive(Debug, Clone)]
struct CliOptions {
    assets: PathBuf,
    seed: u64,
    balance: u64,
}

fn parse_cli_options(args: &[String]) -> anyhow::Result<CliOptions> {
    let mut options = CliOptions {
        assets: PathBuf::from("assets"),
        seed: DEFAULT_SEED,
        balance: DEFAULT_BALANCE,
    };
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        let value = args.get(idx + 1);
        match (flag, value) {
            ("--assets", Some(value)) => options.assets = PathBuf::from(value),
            ("--seed", Some(value)) => {
                options.seed = value
                    .parse()
                    .with_context(|| format!("invalid seed {value}"))?;
            }
            ("--balance", Some(value)) => {
                options.balance = value
                    .parse()
                    .with_context(|| format!("invalid balance {value}"))?;
            }
            ("--assets" | "--seed" | "--balance", None) => bail!("{flag} needs a value"),
            _ => bail!("unknown option {flag}"),
        }
        idx += 2;
    }
    Ok(options)
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cardforge=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_cli_options(&args)?;
    let mut session = Session::new(&options)?;
    println!("seed: {}", session.rng.seed());
    print_help();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{}> ", session.prompt());
        io::stdout().flush().context("flush stdout")?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("read stdin")?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");
        let args: Vec<&str> = parts.collect();
        match cmd {
            "quit" | "exit" | "q" => break,
            "help" | "h" | "?" => print_help(),
            _ => {
                if let Err(err) = session.execute(cmd, &args) {
                    println!("error: {err:#}");
                }
            }
        }
        drain_events(&mut session.events);
    }
    Ok(())
}

fn print_help() {
    println!("commands:");
    println!("  balance                      tokens, boosters and card count");
    println!("  config                       booster names and prices");
    println!("  buy <tier>                   buy and open one booster");
    println!("  bulk <tier> <qty>            buy unopened boosters");
    println!("  open <tier>                  open an owned booster");
    println!("  redeem <tier> <qty> <tx>     claim boosters bought on the ledger");
    println!("  spin                         play the slot machine");
    println!("  cards                        list your cards");
    println!("  train <card> <xp>            give experience to a card");
    println!("  mint <card> <token>          record the ledger token id of a card");
    println!("  sell <card> <price>          list a card on the marketplace");
    println!("  unlist <card>                withdraw a listing");
    println!("  market                       show listings");
    println!("  purchase <listing>           buy a listed card");
    println!("  solo start|next|open|fight [cards..]|endure|choose <n>|retreat|finish");
    println!("  quit");
}

struct Session {
    config: GameConfig,
    catalog: MemoryCatalog,
    store: MemoryStore,
    user: UserId,
    rng: RngState,
    run: SoloRun,
    events: EventBus,
}

impl Session {
    fn new(options: &CliOptions) -> anyhow::Result<Self> {
        let config = load_game_config(&options.assets)?;
        let catalog = load_catalog(&options.assets)?;
        for rarity in missing_rarities(&catalog) {
            tracing::warn!(%rarity, "no available templates; draws fall back to common");
        }
        let store = MemoryStore::new();
        let user = store.create_account("player", options.balance);
        let mut session = Self {
            config,
            catalog,
            store,
            user,
            rng: RngState::from_seed(options.seed),
            run: SoloRun::new(),
            events: EventBus::default(),
        };
        session.seed_rival_listings()?;
        Ok(session)
    }

    /// A second account that puts a couple of cards up for sale, so the
    /// marketplace has something to browse.
    fn seed_rival_listings(&mut self) -> anyhow::Result<()> {
        let rival = self.store.create_account("rival", RIVAL_BALANCE);
        let service = booster_service(&self.store, &self.catalog, &self.config);
        let tier = parse_booster_type("common")?;
        let opening = service
            .buy_and_open(rival, tier, &mut self.rng, Utc::now(), &mut self.events)
            .context("open rival booster")?;
        let market = Marketplace::new(&self.store);
        for (idx, opened) in opening.cards.iter().take(2).enumerate() {
            let price = 150 + 50 * idx as u64;
            market
                .list(rival, opened.card.id, price, &mut self.events)
                .context("list rival card")?;
        }
        // startup noise is not interesting to the player
        self.events.drain().for_each(drop);
        Ok(())
    }

    fn prompt(&self) -> String {
        if self.run.phase() == SoloPhase::InProgress {
            format!(
                "solo L{} hp{}",
                self.run.state().level,
                self.run.state().lives
            )
        } else {
            "cardforge".to_string()
        }
    }

    fn execute(&mut self, cmd: &str, args: &[&str]) -> anyhow::Result<()> {
        match cmd {
            "balance" | "b" => self.print_balance(),
            "config" => self.print_config(),
            "buy" => self.buy(args),
            "bulk" => self.bulk(args),
            "open" => self.open(args),
            "redeem" => self.redeem(args),
            "spin" => self.spin(),
            "cards" | "c" => self.print_cards(),
            "train" => self.train(args),
            "mint" => self.mint(args),
            "sell" => self.sell(args),
            "unlist" => self.unlist(args),
            "market" | "m" => self.print_market(),
            "purchase" => self.purchase(args),
            "solo" => self.solo(args),
            other => bail!("unknown command {other}, try help"),
        }
    }

    fn print_balance(&self) -> anyhow::Result<()> {
        let account = self.store.account(self.user)?;
        println!("tokens: {}", account.token_balance);
        println!(
            "boosters: common {} rare {} epic {} legendary {}",
            account.boosters.common,
            account.boosters.rare,
            account.boosters.epic,
            account.boosters.legendary
        );
        println!("cards: {}", account.cards.len());
        Ok(())
    }

    fn print_config(&self) -> anyhow::Result<()> {
        let config = booster_service(&self.store, &self.catalog, &self.config).config();
        let json = serde_json::to_string_pretty(&config).context("encode booster config")?;
        println!("{json}");
        Ok(())
    }

    fn buy(&mut self, args: &[&str]) -> anyhow::Result<()> {
        let name = arg(args, 0, "tier")?;
        let opening = booster_service(&self.store, &self.catalog, &self.config)
            .buy_and_open_named(self.user, name, &mut self.rng, Utc::now(), &mut self.events)
            .map_err(|err| anyhow::anyhow!("[{}] {err}", err.kind().status_code()))?;
        print_opening(&opening);
        Ok(())
    }

    fn bulk(&mut self, args: &[&str]) -> anyhow::Result<()> {
        let tier = parse_booster_type(arg(args, 0, "tier")?)?;
        let quantity: u32 = parse_arg(args, 1, "quantity")?;
        let owned = booster_service(&self.store, &self.catalog, &self.config)
            .buy_boosters(self.user, tier, quantity, &mut self.events)?;
        println!("{tier} boosters owned: {owned}");
        Ok(())
    }

    fn open(&mut self, args: &[&str]) -> anyhow::Result<()> {
        let tier = parse_booster_type(arg(args, 0, "tier")?)?;
        let opening = booster_service(&self.store, &self.catalog, &self.config)
            .open_booster(self.user, tier, &mut self.rng, Utc::now(), &mut self.events)?;
        print_opening(&opening);
        Ok(())
    }

    fn redeem(&mut self, args: &[&str]) -> anyhow::Result<()> {
        let tier = parse_booster_type(arg(args, 0, "tier")?)?;
        let quantity: u32 = parse_arg(args, 1, "quantity")?;
        let claim = BoosterPurchaseClaim {
            transaction: arg(args, 2, "transaction")?,
            tier,
            quantity,
        };
        let owned = booster_service(&self.store, &self.catalog, &self.config)
            .redeem_purchase(self.user, &claim, &AcceptAllVerifier, &mut self.events)?;
        println!("{tier} boosters owned: {owned}");
        Ok(())
    }

    fn spin(&mut self) -> anyhow::Result<()> {
        let machine = SlotMachine::new(&self.store, &self.config.slot_machine);
        let play = machine.play(
            self.user,
            &mut self.rng,
            Local::now().naive_local(),
            &mut self.events,
        )?;
        let paid = if play.free_play {
            "free play".to_string()
        } else {
            format!("paid {}", play.cost)
        };
        let result = match play.outcome {
            SlotOutcome::Booster { tier } => format!("won a {tier} booster"),
            SlotOutcome::Tokens { amount } => format!("won {amount} tokens"),
            SlotOutcome::Lose => "nothing this time".to_string(),
        };
        println!("{paid}: {result} (balance {})", play.balance);
        Ok(())
    }

    fn my_cards(&self) -> anyhow::Result<Vec<OwnedCard>> {
        let mut cards = self.store.cards_of(self.user)?;
        cards.sort_by_key(|card| card.acquired_at);
        Ok(cards)
    }

    fn card_at(&self, args: &[&str], idx: usize) -> anyhow::Result<OwnedCard> {
        let position: usize = parse_arg(args, idx, "card")?;
        let cards = self.my_cards()?;
        cards
            .get(position)
            .cloned()
            .with_context(|| format!("no card #{position}, you own {}", cards.len()))
    }

    fn stats_of(&self, card: &OwnedCard) -> CardStats {
        self.catalog
            .template(&card.template_id)
            .map(|template| card.effective_stats(template))
            .unwrap_or_default()
    }

    fn describe(&self, card: &OwnedCard) -> String {
        let name = self
            .catalog
            .template(&card.template_id)
            .map(|template| format!("{} ({})", template.name, template.rarity))
            .unwrap_or_else(|| card.template_id.clone());
        let stats = self.stats_of(card);
        let listing = match card.price {
            Some(price) if card.for_sale => format!(" [listed {price}]"),
            _ => String::new(),
        };
        format!(
            "{name} lv{} atk {} def {} mag {} spd {}{listing}",
            card.level, stats.attack, stats.defense, stats.magic, stats.speed
        )
    }

    fn print_cards(&self) -> anyhow::Result<()> {
        let cards = self.my_cards()?;
        if cards.is_empty() {
            println!("no cards yet");
        }
        for (idx, card) in cards.iter().enumerate() {
            println!("{idx:>3}: {}", self.describe(card));
        }
        Ok(())
    }

    fn train(&mut self, args: &[&str]) -> anyhow::Result<()> {
        let mut card = self.card_at(args, 0)?;
        let xp: u32 = parse_arg(args, 1, "xp")?;
        let gained = card.add_experience(xp);
        self.store.update_card(&card)?;
        println!("+{gained} levels: {}", self.describe(&card));
        Ok(())
    }

    fn mint(&mut self, args: &[&str]) -> anyhow::Result<()> {
        let mut card = self.card_at(args, 0)?;
        let token = arg(args, 1, "token")?;
        if !card.assign_token(token) {
            bail!("card already minted as {}", card.token_id.unwrap_or_default());
        }
        self.store.update_card(&card)?;
        println!("minted {}", self.describe(&card));
        Ok(())
    }

    fn sell(&mut self, args: &[&str]) -> anyhow::Result<()> {
        let card = self.card_at(args, 0)?;
        let price: u64 = parse_arg(args, 1, "price")?;
        Marketplace::new(&self.store).list(self.user, card.id, price, &mut self.events)?;
        Ok(())
    }

    fn unlist(&mut self, args: &[&str]) -> anyhow::Result<()> {
        let card = self.card_at(args, 0)?;
        Marketplace::new(&self.store).unlist(self.user, card.id, &mut self.events)?;
        Ok(())
    }

    fn print_market(&self) -> anyhow::Result<()> {
        let listings = Marketplace::new(&self.store).listings();
        if listings.is_empty() {
            println!("nothing listed");
        }
        for (idx, card) in listings.iter().enumerate() {
            let owner = if card.owner == self.user { " (yours)" } else { "" };
            println!("{idx:>3}: {}{owner}", self.describe(card));
        }
        Ok(())
    }

    fn purchase(&mut self, args: &[&str]) -> anyhow::Result<()> {
        let position: usize = parse_arg(args, 0, "listing")?;
        let market = Marketplace::new(&self.store);
        let listing = market
            .listings()
            .get(position)
            .cloned()
            .with_context(|| format!("no listing #{position}"))?;
        let sale = market.buy(self.user, listing.id, &mut self.events)?;
        println!("bought {}", self.describe(&sale.card));
        Ok(())
    }

    fn solo(&mut self, args: &[&str]) -> anyhow::Result<()> {
        let sub = arg(args, 0, "solo command")?;
        let rest = &args[1..];
        match sub {
            "start" => {
                self.run.start(&self.config.solo, &mut self.events)?;
            }
            "next" | "n" => {
                let event =
                    self.run
                        .next_level(&self.config.solo, &mut self.rng, &mut self.events)?;
                println!("{}", describe_event(event));
            }
            "open" => self.resolve(SoloAction::OpenChest)?,
            "endure" => self.resolve(SoloAction::EndureTrap)?,
            "choose" => {
                let option: usize = parse_arg(rest, 0, "option")?;
                self.resolve(SoloAction::Choose(option))?;
            }
            "fight" => {
                let team = self.pick_team(rest)?;
                self.resolve(SoloAction::Fight(team))?;
            }
            "retreat" => self.run.retreat(&mut self.events)?,
            "finish" => {
                let settlement = self.run.settle(&self.store, self.user)?;
                println!(
                    "reached level {}, defeated {} enemies",
                    settlement.summary.level, settlement.summary.enemies_defeated
                );
                println!(
                    "credited {} tokens, boosters {:?}, {} chests left locked (balance {})",
                    settlement.tokens_credited,
                    settlement.boosters,
                    settlement.unopened_chests,
                    settlement.balance
                );
            }
            other => bail!("unknown solo command {other}"),
        }
        Ok(())
    }

    /// Explicit card indices, or the strongest cards by attack + defense.
    fn pick_team(&self, args: &[&str]) -> anyhow::Result<Vec<CardStats>> {
        let cards = self.my_cards()?;
        if args.is_empty() {
            let mut stats: Vec<CardStats> = cards.iter().map(|card| self.stats_of(card)).collect();
            stats.sort_by_key(|stats| std::cmp::Reverse(stats.attack + stats.defense));
            stats.truncate(TEAM_SIZE);
            return Ok(stats);
        }
        args.iter()
            .map(|value| -> anyhow::Result<CardStats> {
                let idx: usize = value
                    .parse()
                    .with_context(|| format!("invalid card index {value}"))?;
                let card = cards
                    .get(idx)
                    .with_context(|| format!("no card #{idx}"))?;
                Ok(self.stats_of(card))
            })
            .collect()
    }

    fn resolve(&mut self, action: SoloAction) -> anyhow::Result<()> {
        let resolution = self.run.resolve(action, &mut self.rng, &mut self.events)?;
        match resolution.detail {
            ResolutionDetail::Chest { rarity } => println!("stashed a {rarity} chest"),
            ResolutionDetail::Combat { outcome, reward } => println!(
                "team {} vs enemy {:.1}: {}",
                outcome.team_power,
                outcome.enemy_power,
                if outcome.victory {
                    format!("victory, +{reward} tokens")
                } else {
                    "defeat".to_string()
                }
            ),
            ResolutionDetail::Trap { outcome } => {
                if outcome.avoided {
                    println!("dodged the trap");
                } else {
                    println!("the trap hits for {}", outcome.damage);
                }
            }
            ResolutionDetail::Choice { option, outcome } => println!(
                "option {option}: +{} tokens +{} keys +{} lives, {} damage",
                outcome.rewards.tokens,
                outcome.rewards.keys,
                outcome.rewards.lives,
                outcome.damage
            ),
        }
        println!("lives {} ({:?})", resolution.lives, resolution.phase);
        Ok(())
    }
}

fn arg<'a>(args: &[&'a str], idx: usize, name: &str) -> anyhow::Result<&'a str> {
    args.get(idx)
        .copied()
        .with_context(|| format!("missing {name}"))
}

fn parse_arg<T>(args: &[&str], idx: usize, name: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = arg(args, idx, name)?;
    raw.parse()
        .with_context(|| format!("invalid {name} {raw}"))
}

/// Borrows only the tables, leaving the session's rng and event bus free.
fn booster_service<'a>(
    store: &'a MemoryStore,
    catalog: &'a MemoryCatalog,
    config: &'a GameConfig,
) -> BoosterService<'a, MemoryStore, MemoryCatalog> {
    BoosterService::new(store, catalog, &config.rarities, &config.boosters)
}

fn print_opening(opening: &BoosterOpening) {
    println!("{} booster:", opening.tier);
    for opened in &opening.cards {
        let fallback = if opened.rolled != opened.template.rarity {
            format!(" (rolled {})", opened.rolled)
        } else {
            String::new()
        };
        println!(
            "  {} [{}]{fallback}",
            opened.template.name, opened.template.rarity
        );
    }
    println!("balance: {}", opening.balance);
}

fn describe_event(event: &SoloEvent) -> String {
    match event {
        SoloEvent::Chest { rarity } => format!("a {rarity} chest (open)"),
        SoloEvent::Enemy { enemy, reward } => format!(
            "{} attacks: atk {} def {}, power {:.1}, bounty {reward} (fight)",
            enemy.name,
            enemy.attack,
            enemy.defense,
            enemy.power()
        ),
        SoloEvent::Trap { trap } => {
            let odds = if trap.avoidable {
                format!("{:.0}% to dodge", trap.avoid_chance * 100.0)
            } else {
                "unavoidable".to_string()
            };
            format!("{}: {} damage, {odds} (endure)", trap.name, trap.damage)
        }
        SoloEvent::Choice { choice } => {
            let mut text = format!("{} (choose)", choice.prompt);
            for (idx, option) in choice.options.iter().enumerate() {
                text.push_str(&format!("\n  {idx}: {}", option.label));
                if let Some(risk) = option.risk {
                    text.push_str(&format!(
                        " ({:.0}% risk of {} damage)",
                        risk.probability * 100.0,
                        risk.damage
                    ));
                }
            }
            text
        }
    }
}

fn drain_events(events: &mut EventBus) {
    for event in events.drain() {
        println!("event: {}", format_event(&event));
    }
}

fn format_event(event: &Event) -> String {
    match event {
        Event::BoostersBought {
            tier,
            quantity,
            cost,
            balance,
        } => format!("bought {quantity} {tier} booster(s) for {cost}, balance {balance}"),
        Event::BoosterOpened {
            tier,
            rarities,
            fallbacks,
        } => format!("opened {tier} booster: {rarities:?}, {fallbacks} fallback(s)"),
        Event::SlotPlayed {
            outcome,
            free_play,
            balance,
        } => format!("slot {outcome:?} free={free_play} balance {balance}"),
        Event::CardListed { card, price } => format!("listed {card} for {price}"),
        Event::CardUnlisted { card } => format!("unlisted {card}"),
        Event::CardSold {
            card,
            price,
            buyer_balance,
        } => format!("sold {card} for {price}, buyer balance {buyer_balance}"),
        Event::SoloStarted { lives } => format!("solo run started with {lives} lives"),
        Event::SoloEncounter { level, kind } => format!("level {level}: {kind:?}"),
        Event::SoloDamaged { amount, lives } => format!("took {amount} damage, {lives} lives left"),
        Event::SoloEnded {
            phase,
            level,
            tokens,
        } => format!("run ended {phase:?} at level {level} with {tokens} tokens"),
    }
}
