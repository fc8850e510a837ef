use anyhow::{bail, Context};
use serde::Serialize;
use std::path::PathBuf;
use unboxer_core::{
    format_display_name, format_money, rarity_label, AccountId, Event, EventBus, FundsLedger,
    MemoryExperience, MemoryInventory, MemoryLedger, MemoryNotifier, MemoryProgressStore,
    PowerupDef, ProgressionTracker, ResolvedOutcome, RngState, Services, Settlement, SpinError, SpinMachine,
    SpinPhase, WearCode,
};
use unboxer_data::{load_assets, DirCatalogStore};

const DEFAULT_BALANCE: f64 = 100.0;
const SKIP_AFTER_MS: u64 = 1_000;

#[derive(Debug, Clone)]
struct CliOptions {
    assets: PathBuf,
    case_id: Option<String>,
    count: u32,
    seed: Option<u64>,
    balance: f64,
    skip: bool,
    sell: bool,
    json: bool,
    list: bool,
}

fn parse_cli_options(args: &[String]) -> CliOptions {
    let mut options = CliOptions {
        assets: PathBuf::from("assets"),
        case_id: None,
        count: 1,
        seed: None,
        balance: DEFAULT_BALANCE,
        skip: false,
        sell: false,
        json: false,
        list: false,
    };
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--skip" => options.skip = true,
            "--sell" => options.sell = true,
            "--json" => options.json = true,
            "--list" => options.list = true,
            "--assets" => {
                if let Some(value) = args.get(idx + 1) {
                    options.assets = PathBuf::from(value);
                    idx += 1;
                }
            }
            "--case" | "-c" => {
                if let Some(value) = args.get(idx + 1) {
                    options.case_id = Some(value.clone());
                    idx += 1;
                }
            }
            "--count" | "-n" => {
                if let Some(value) = args.get(idx + 1) {
                    options.count = value.parse::<u32>().unwrap_or(1);
                    idx += 1;
                }
            }
            "--seed" => {
                if let Some(value) = args.get(idx + 1) {
                    options.seed = value.parse::<u64>().ok();
                    idx += 1;
                }
            }
            "--balance" => {
                if let Some(value) = args.get(idx + 1) {
                    options.balance = value.parse::<f64>().unwrap_or(DEFAULT_BALANCE);
                    idx += 1;
                }
            }
            other => log::warn!("ignoring argument {other}"),
        }
        idx += 1;
    }
    options
}

/// In-memory account for one simulator run.
struct Session {
    account: AccountId,
    ledger: MemoryLedger,
    inventory: MemoryInventory,
    progress: MemoryProgressStore,
    experience: MemoryExperience,
    notifier: MemoryNotifier,
}

impl Session {
    fn new(balance: f64) -> Self {
        let account = AccountId::new("local");
        Self {
            ledger: MemoryLedger::with_balance(&account, balance),
            inventory: MemoryInventory::new(),
            progress: MemoryProgressStore::new(),
            experience: MemoryExperience::new(),
            notifier: MemoryNotifier::new(),
            account,
        }
    }

    fn services(&mut self) -> Services<'_> {
        Services {
            account: &self.account,
            ledger: &mut self.ledger,
            inventory: &mut self.inventory,
            progress: &mut self.progress,
            experience: &mut self.experience,
            notifier: &mut self.notifier,
        }
    }

    fn balance(&self) -> f64 {
        self.ledger.peek(&self.account)
    }
}

#[derive(Debug, Serialize)]
struct OpenReport<'a> {
    case_id: &'a str,
    display_name: String,
    skipped: bool,
    xp_gained: u64,
    level_up: Option<u32>,
    completed: Vec<&'a str>,
    outcome: &'a ResolvedOutcome,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_cli_options(&args);
    if let Err(err) = run(&options) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(options: &CliOptions) -> anyhow::Result<()> {
    let assets = load_assets(&options.assets)
        .with_context(|| format!("load assets from {}", options.assets.display()))?;
    if options.list {
        for case in &assets.cases {
            println!("{:<40} {:>10}  {}", case.id, format_money(case.price), case.name);
        }
        println!();
        for powerup in &assets.settings.powerups {
            println!("{}", format_powerup_line(powerup));
        }
        return Ok(());
    }

    let case_id = match (&options.case_id, assets.cases.first()) {
        (Some(id), _) => id.clone(),
        (None, Some(case)) => case.id.clone(),
        (None, None) => bail!("no cases in {}", options.assets.display()),
    };

    let rng = match options.seed {
        Some(seed) => RngState::from_seed(seed),
        None => RngState::from_entropy(),
    };
    log::info!("seed {}", rng.seed());

    let settings = &assets.settings;
    let mut machine = SpinMachine::new(assets.engine(), settings.spin.clone(), rng)
        .with_xp_rule(settings.xp.clone());
    let mut store = DirCatalogStore::new(&options.assets);
    machine
        .load_catalog(&mut store, &case_id)
        .with_context(|| format!("load case {case_id}"))?;

    let mut session = Session::new(options.balance);
    let mut tracker =
        ProgressionTracker::load(assets.goals.clone(), settings.level.clone(), &mut session.services())
            .context("load progression")?;
    let mut events = EventBus::default();

    let price = machine.catalog().map(|case| case.price).unwrap_or(0.0);
    let mut now_ms = 0u64;
    let mut opened = 0u32;
    let mut value = 0.0;
    for _ in 0..options.count {
        match machine.open(now_ms, &mut session.services(), &mut events) {
            Ok(()) => {}
            Err(err @ SpinError::InsufficientFunds { .. }) => {
                println!("stopped: {err}");
                break;
            }
            Err(err) => return Err(err).context("open case"),
        }
        let settlement = reveal(
            &mut machine,
            &mut now_ms,
            options.skip,
            &mut session,
            &mut tracker,
            &mut events,
        )?;
        opened += 1;
        value += settlement.outcome.final_price;
        report(&settlement, options.json)?;
        flush_events(&mut events, options.json);
    }

    if options.sell {
        sell_all(&mut session, &mut tracker, &mut events)?;
        flush_events(&mut events, options.json);
    }

    if !options.json {
        let level = tracker.level();
        println!();
        println!("opened   {opened}");
        println!("spent    {}", format_money(price * f64::from(opened)));
        println!("value    {}", format_money(value));
        println!("balance  {}", format_money(session.balance()));
        println!(
            "level    {} ({}/{} xp)",
            level.level, level.current_xp, level.xp_to_next_level
        );
        for (def, state) in tracker.goals() {
            let mark = if state.completed { "x" } else { " " };
            println!("[{mark}] {:<28} {}", def.title, def.progress_label(state));
        }
    }
    Ok(())
}

/// Sells the whole inventory at its rolled prices.
fn sell_all(
    session: &mut Session,
    tracker: &mut ProgressionTracker,
    events: &mut EventBus,
) -> anyhow::Result<()> {
    let (count, total) = {
        let items = session.inventory.items(&session.account);
        let total: f64 = items.iter().map(|item| item.final_price).sum();
        (items.len() as u32, total)
    };
    if count == 0 {
        return Ok(());
    }
    let balance = session
        .ledger
        .credit(&session.account, total)
        .context("credit sale")?;
    session.inventory.take_all(&session.account);
    events.push(Event::ItemsSold { count });
    log::info!("sold {count} items for {total:.2}, balance {balance:.2}");
    let update = tracker.handle_items_sold(count, &mut session.services());
    let level_up = update.level_up();
    for completion in update.completions {
        events.push(Event::GoalCompleted {
            id: completion.id,
            category: completion.category,
        });
    }
    if let Some(level) = level_up {
        events.push(Event::LevelUp { level });
    }
    for failure in &update.failures {
        log::warn!("progress not saved after sale: {failure}");
    }
    Ok(())
}

fn flush_events(events: &mut EventBus, json: bool) {
    for event in events.drain() {
        if json {
            continue;
        }
        if let Some(line) = format_event(&event) {
            println!("  {line}");
        }
    }
}

/// Advances the simulated clock tick by tick until the reveal settles.
fn reveal(
    machine: &mut SpinMachine,
    now_ms: &mut u64,
    skip: bool,
    session: &mut Session,
    tracker: &mut ProgressionTracker,
    events: &mut EventBus,
) -> anyhow::Result<Settlement> {
    let started = *now_ms;
    let step = machine.config().tick_interval_ms.max(1);
    let mut ticks = 0u64;
    loop {
        let next = *now_ms + step;
        ticks += machine.ticks_between(*now_ms, next);
        *now_ms = next;
        if skip && machine.phase() == SpinPhase::Rolling
            && *now_ms - started >= SKIP_AFTER_MS
        {
            machine.skip(*now_ms, events).context("skip")?;
        }
        if let Some(settlement) = machine.poll(*now_ms, &mut session.services(), tracker, events) {
            log::debug!("settled after {}ms and {ticks} ticks", *now_ms - started);
            return Ok(settlement);
        }
        if !machine.is_locked() {
            bail!("reveal ended without a settlement");
        }
    }
}

fn report(settlement: &Settlement, json: bool) -> anyhow::Result<()> {
    let outcome = &settlement.outcome;
    if json {
        let report = OpenReport {
            case_id: &settlement.case_id,
            display_name: format_display_name(outcome),
            skipped: settlement.skipped,
            xp_gained: settlement.xp_gained,
            level_up: settlement.level_up,
            completed: settlement
                .completions
                .iter()
                .map(|completion| completion.id.as_str())
                .collect(),
            outcome,
        };
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    println!("{}", format_outcome_line(outcome));
    for failure in &settlement.failures {
        println!("  warning: {failure}");
    }
    Ok(())
}

fn format_outcome_line(outcome: &ResolvedOutcome) -> String {
    let mut line = format!(
        "{} [{}] {}",
        format_display_name(outcome),
        rarity_label(&outcome.rarity),
        outcome.wear_label
    );
    if outcome.wear_code != WearCode::NoWear {
        line.push_str(&format!(" {}", outcome.float_value));
    }
    if let Some(index) = outcome.pattern_index {
        line.push_str(&format!(" #{index}"));
    }
    if let Some(tag) = &outcome.pattern_tag {
        line.push_str(&format!(" <{tag}>"));
    }
    line.push_str(&format!(" {}", format_money(outcome.final_price)));
    line
}

fn format_powerup_line(powerup: &PowerupDef) -> String {
    format!(
        "{:<40} {:>9}s  click x{} passive x{}",
        powerup.name,
        powerup.duration_ms / 1000,
        powerup.click_mult,
        powerup.passive_mult
    )
}

fn format_event(event: &Event) -> Option<String> {
    match event {
        Event::ExperienceGained { amount, total } => Some(format!("+{amount} xp ({total} total)")),
        Event::LevelUp { level } => Some(format!("level up: {level}")),
        Event::GoalCompleted { id, category } => Some(format!("{category:?} completed: {id}")),
        Event::RollSkipped { remaining_ms } => Some(format!("skipped with {remaining_ms}ms left")),
        Event::ItemsSold { count } => Some(format!("sold {count} items")),
        _ => None,
    }
}
