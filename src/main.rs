use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use retro_session::config::AppConfig;
use retro_session::db::Database;
use retro_session::models::*;
use retro_session::store::SessionStore;

#[derive(Parser)]
#[command(name = "retro")]
#[command(about = "Facilitate a team retrospective, one step at a time")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct GlobalArgs {
    /// Snapshot database path (overrides config and RETRO_DATABASE)
    #[arg(long, global = true)]
    db: Option<std::path::PathBuf>,

    /// Storage key of the session (overrides config and RETRO_STORAGE_KEY)
    #[arg(long, global = true)]
    key: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current step and session progress
    Status,
    /// Jump to a step (icebreaker, lastRetro, realRetro, topics, checkout)
    Step { step: RetroStep },
    /// Continue to the next step
    Next,
    /// Go back to the previous step
    Back,
    /// Record the icebreaker answer
    Icebreaker { response: String },
    /// List last retro's action items
    Prior,
    /// Manage retro cards
    #[command(subcommand)]
    Card(CardCommand),
    /// Put every card under one topic
    Sort { topic: String },
    /// Show cards grouped by topic with their votes
    Topics,
    /// Spend one vote on a topic
    Vote { topic: String },
    /// Manage action items
    #[command(subcommand)]
    Action(ActionCommand),
    /// Show the checkout summary
    Summary,
    /// Discard the session and start over
    #[command(alias = "restart")]
    Reset,
    /// List stored session snapshots
    Snapshots,
}

#[derive(Subcommand)]
enum CardCommand {
    /// Add a card (good, bad or change)
    Add {
        category: CardCategory,
        content: String,
    },
    /// Change a card's text
    Edit { id: String, content: String },
    /// Delete a card
    Remove { id: String },
    /// List cards, optionally for one category
    List { category: Option<CardCategory> },
}

#[derive(Subcommand)]
enum ActionCommand {
    /// Add an action item for a topic
    Add { topic: String, content: String },
    /// Change an action item's text
    Edit { id: String, content: String },
    /// Delete an action item
    Remove { id: String },
    /// List action items
    List,
}

/// Initialize tracing on stderr so stdout carries only command output.
/// `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, load_error) = match AppConfig::try_load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    config.apply_env();

    init_tracing(&config.log_filter);
    if let Some(e) = load_error {
        tracing::warn!("Failed to load config, using defaults: {:#}", e);
    }

    if let Some(path) = cli.global.db {
        config.database_path = Some(path);
    }
    if let Some(key) = cli.global.key {
        config.storage_key = key;
    }

    let db = match &config.database_path {
        Some(path) => Database::open(path)?,
        None => Database::open_default()?,
    };
    db.migrate()?;

    let mut store = SessionStore::open_with_key(db, config.storage_key.clone());
    let out = Output { json: cli.global.json };

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => print_status(&store, &out)?,
        Commands::Step { step } => {
            store.set_step(step);
            print_status(&store, &out)?;
        }
        Commands::Next => {
            store.set_step(store.current_step().next());
            print_status(&store, &out)?;
        }
        Commands::Back => {
            store.set_step(store.current_step().previous());
            print_status(&store, &out)?;
        }
        Commands::Icebreaker { response } => {
            store.set_icebreaker_response(&response)?;
            out.line(&format!("Your response: \"{}\"", store.icebreaker_response()));
        }
        Commands::Prior => out.items(store.prior_action_items())?,
        Commands::Card(cmd) => run_card(&mut store, cmd, &out)?,
        Commands::Sort { topic } => {
            let count = store.assign_topic_to_all(&topic)?;
            out.line(&format!("Sorted {} cards under {:?}", count, topic.trim()));
        }
        Commands::Topics => print_topics(&store, &out)?,
        Commands::Vote { topic } => {
            if store.vote_for_topic(&topic)? {
                out.line(&format!(
                    "Voted for {:?} ({}/{} votes left)",
                    topic.trim(),
                    store.available_votes(),
                    VOTE_BUDGET
                ));
            } else {
                out.line("No votes left");
            }
        }
        Commands::Action(cmd) => run_action(&mut store, cmd, &out)?,
        Commands::Summary => print_summary(&store, &out)?,
        Commands::Reset => {
            store.reset_session();
            out.line("Started a new retrospective");
        }
        Commands::Snapshots => {
            for record in store.storage().list_snapshots()? {
                out.line(&format!(
                    "{}  {} bytes  {}",
                    record.key,
                    record.size,
                    record.updated_at.to_rfc3339()
                ));
            }
        }
    }

    Ok(())
}

fn run_card(store: &mut SessionStore<Database>, cmd: CardCommand, out: &Output) -> Result<()> {
    match cmd {
        CardCommand::Add { category, content } => {
            let card = store.add_card(CreateCardInput { content, category })?;
            out.value(&card, &card.id)?;
        }
        CardCommand::Edit { id, content } => {
            let input = UpdateCardInput {
                content: Some(content),
            };
            match store.update_card(&id, input)? {
                Some(card) => out.value(&card, &card.id)?,
                None => out.line(&format!("No card {}", id)),
            }
        }
        CardCommand::Remove { id } => {
            if !store.remove_card(&id) {
                out.line(&format!("No card {}", id));
            }
        }
        CardCommand::List { category } => {
            let cards: Vec<&Card> = match category {
                Some(category) => store.session().cards_in(category).collect(),
                None => store.cards().iter().collect(),
            };
            if out.json {
                out.print_json(&cards)?;
            } else {
                for card in cards {
                    out.line(&format_card(card));
                }
            }
        }
    }
    Ok(())
}

fn run_action(store: &mut SessionStore<Database>, cmd: ActionCommand, out: &Output) -> Result<()> {
    match cmd {
        ActionCommand::Add { topic, content } => {
            let item = store.add_action_item(CreateActionItemInput { content, topic })?;
            out.value(&item, &item.id)?;
        }
        ActionCommand::Edit { id, content } => {
            let input = UpdateActionItemInput {
                content: Some(content),
            };
            match store.update_action_item(&id, input)? {
                Some(item) => out.value(&item, &item.id)?,
                None => out.line(&format!("No action item {}", id)),
            }
        }
        ActionCommand::Remove { id } => {
            if !store.remove_action_item(&id) {
                out.line(&format!("No action item {}", id));
            }
        }
        ActionCommand::List => out.items(store.action_items())?,
    }
    Ok(())
}

fn print_status(store: &SessionStore<Database>, out: &Output) -> Result<()> {
    let current = store.current_step();
    if out.json {
        return out.print_json(&serde_json::json!({
            "currentStep": current,
            "availableVotes": store.available_votes(),
            "summary": store.summary(),
        }));
    }

    let progress: Vec<String> = RetroStep::ALL
        .iter()
        .map(|step| {
            if *step == current {
                format!("[{}]", step.label())
            } else {
                step.label().to_string()
            }
        })
        .collect();
    out.line(&progress.join(" > "));
    out.line(&format!(
        "Step {}/{}, {} cards, {}/{} votes left, {} action items",
        current.index() + 1,
        RetroStep::ALL.len(),
        store.cards().len(),
        store.available_votes(),
        VOTE_BUDGET,
        store.action_items().len()
    ));
    Ok(())
}

fn print_topics(store: &SessionStore<Database>, out: &Output) -> Result<()> {
    let groups = store.topic_groups();
    if out.json {
        return out.print_json(&groups);
    }

    if groups.is_empty() {
        out.line("No topics yet. Sort the cards first.");
    }
    for group in groups {
        out.line(&format!("{} ({} votes)", group.topic, group.votes));
        for card in &group.cards {
            out.line(&format!("  {}", format_card(card)));
        }
    }
    out.line(&format!("{}/{} votes left", store.available_votes(), VOTE_BUDGET));
    Ok(())
}

fn print_summary(store: &SessionStore<Database>, out: &Output) -> Result<()> {
    let summary = store.summary();
    if out.json {
        return out.print_json(&summary);
    }

    out.line(&format!("Cards shared:     {}", summary.total_cards));
    out.line(&format!("Topics discussed: {}", summary.topics_count));
    out.line(&format!("Votes cast:       {}", summary.total_votes));
    out.line(&format!("Action items:     {}", summary.total_action_items));
    for item in store.action_items() {
        out.line(&format!("  - [{}] {}", item.topic, item.content));
    }
    Ok(())
}

fn format_card(card: &Card) -> String {
    match &card.topic {
        Some(topic) => format!("{} [{}] {} ({})", card.id, card.category, card.content, topic),
        None => format!("{} [{}] {}", card.id, card.category, card.content),
    }
}

struct Output {
    json: bool,
}

impl Output {
    fn line(&self, text: &str) {
        if !self.json {
            println!("{}", text);
        }
    }

    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print `value` as JSON, or just its id in text mode.
    fn value<T: Serialize>(&self, value: &T, id: &str) -> Result<()> {
        if self.json {
            self.print_json(value)
        } else {
            println!("{}", id);
            Ok(())
        }
    }

    fn items(&self, items: &[ActionItem]) -> Result<()> {
        if self.json {
            return self.print_json(items);
        }
        for item in items {
            println!("{}  [{}] {}", item.id, item.topic, item.content);
        }
        Ok(())
    }
}
