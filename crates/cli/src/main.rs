//! NovaState CLI - economy and citizen-score operations
//!
//! Usage:
//! ```bash
//! novastate init
//! novastate user add 1 alice
//! novastate route --app FLIRTMARKET --kind TIP --user 1 --performer 2 --gross 100
//! novastate event 1 vote_cast --source senate
//! novastate quests ensure 1
//! novastate quests submit 1 <quest-uuid> --kind tx_ref --proof "TX_..."
//! novastate hitl decide <quest-uuid> --admin 9 --decision approved
//! novastate credit profile 1
//! novastate treasury summary
//! novastate report --kind leaderboard --format markdown
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

mod commands;
mod db;

use commands::{audit, credit, quests, treasury};

/// NovaState - citizen-scored virtual state economy core
#[derive(Parser)]
#[command(name = "novastate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Database file path
    #[arg(long, env = "NOVA_DB", default_value = "data/novastate.db", global = true)]
    pub db: PathBuf,

    /// Audit log directory
    #[arg(long, env = "NOVA_AUDIT_DIR", default_value = "data/audit", global = true)]
    pub audit_dir: PathBuf,

    /// User id whose account acts as the state treasury
    #[arg(long, env = "NCR_TREASURY_USER_ID", default_value_t = 1_000_000, global = true)]
    pub treasury_user: i64,

    /// Daily ceiling on NCR minted by quests
    #[arg(long, env = "TREASURY_DAILY_LIMIT", default_value = "1000", global = true)]
    pub daily_limit: Decimal,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and seed the treasury user
    Init {
        /// Drop an existing database first
        #[arg(long)]
        force: bool,
    },

    /// Show database status
    Status,

    /// User management (identity collaborator)
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Route a revenue event through the treasury
    Route {
        /// Source app (e.g. FLIRTMARKET)
        #[arg(long)]
        app: String,
        /// Revenue kind (e.g. TIP)
        #[arg(long)]
        kind: String,
        /// Paying user id
        #[arg(long)]
        user: i64,
        /// Receiving performer id
        #[arg(long)]
        performer: Option<i64>,
        /// Gross amount in NCR
        #[arg(long)]
        gross: Decimal,
        /// Caller reference id for idempotent replays
        #[arg(long)]
        reference: Option<String>,
        /// Caller reference type
        #[arg(long, default_value = "external")]
        reference_type: String,
    },

    /// Feed a behavior event into the credit engine
    Event {
        /// Citizen id
        user: i64,
        /// Event type (e.g. vote_cast, tip_sent)
        event_type: String,
        /// Source app
        #[arg(long, default_value = "cli")]
        source: String,
        /// Caller event id for idempotent replays
        #[arg(long)]
        event_id: Option<String>,
    },

    /// Fund a citizen's NCR account from the external on-ramp
    Fund {
        /// Citizen id
        user: i64,
        /// Amount in NCR
        amount: Decimal,
    },

    /// Daily quest lifecycle
    Quests {
        #[command(subcommand)]
        action: QuestAction,
    },

    /// Human review of borderline quests
    Hitl {
        #[command(subcommand)]
        action: HitlAction,
    },

    /// Credit profile, history, leaderboard, stats
    Credit {
        #[command(subcommand)]
        action: CreditAction,
    },

    /// Treasury summaries and flows
    Treasury {
        #[command(subcommand)]
        action: TreasuryAction,
    },

    /// Moderator risk flags
    Flag {
        #[command(subcommand)]
        action: FlagAction,
    },

    /// Inspect the JSONL audit trail
    Audit {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Filter by action name
        #[arg(long)]
        action: Option<String>,
    },

    /// Export a report
    Report {
        #[arg(long, default_value = "leaderboard")]
        kind: ReportKind,
        #[arg(long, default_value = "markdown")]
        format: ReportFormat,
        /// Output file path (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum UserAction {
    /// Register a user row
    Add {
        id: i64,
        username: String,
        #[arg(long, default_value = "citizen")]
        role: String,
    },
}

#[derive(Subcommand)]
pub enum QuestAction {
    /// Assign (or return) today's three quests
    Ensure { user: i64 },
    /// Show today's quests
    Today { user: i64 },
    /// Submit proof for a quest
    Submit {
        user: i64,
        quest_uuid: String,
        /// Proof kind: text, url, image_ref, tx_ref
        #[arg(long)]
        kind: String,
        /// Proof reference (text, url, or id)
        #[arg(long)]
        proof: String,
        /// Quality score from an external scorer, 0..=100
        #[arg(long)]
        ai_score: Option<f64>,
    },
    /// Expire overdue quests
    Expire,
}

#[derive(Subcommand)]
pub enum HitlAction {
    /// List quests waiting for review
    Queue {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Decide one quest
    Decide {
        quest_uuid: String,
        #[arg(long)]
        admin: i64,
        /// approved or rejected
        #[arg(long)]
        decision: String,
        #[arg(long)]
        reason: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CreditAction {
    /// Show a citizen's credit profile
    Profile { user: i64 },
    /// Paged score-change history
    History {
        user: i64,
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = 20)]
        per_page: i64,
    },
    /// Top citizens by NovaCredit
    Leaderboard {
        /// Restrict to one tier
        #[arg(long)]
        tier: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Aggregate stats (admin)
    Stats,
}

#[derive(Subcommand)]
pub enum TreasuryAction {
    /// Headline treasury numbers
    Summary,
    /// Pool balances
    Pools,
    /// Flow history
    Flows {
        /// 24h, 7d, 30d, or all
        #[arg(long, default_value = "7d")]
        range: String,
        #[arg(long)]
        app: Option<String>,
        #[arg(long)]
        kind: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = 20)]
        per_page: i64,
    },
}

#[derive(Subcommand)]
pub enum FlagAction {
    /// Raise a risk flag on a citizen
    Add {
        user: i64,
        #[arg(long)]
        flag_type: String,
        /// low, medium, high, critical
        #[arg(long)]
        severity: String,
        #[arg(long)]
        description: String,
        /// Moderator user id
        #[arg(long)]
        by: Option<i64>,
    },
    /// Resolve an active flag
    Resolve {
        id: i64,
        #[arg(long)]
        resolution: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ReportKind {
    Leaderboard,
    Flows,
    Stats,
    Treasury,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ReportFormat {
    Csv,
    Json,
    Markdown,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Init { force } => db::init(&cli, *force).await,
        Commands::Status => db::status(&cli).await,
        Commands::User { action } => db::user(&cli, action).await,
        Commands::Route {
            app,
            kind,
            user,
            performer,
            gross,
            reference,
            reference_type,
        } => {
            treasury::route(
                &cli,
                app,
                kind,
                *user,
                *performer,
                *gross,
                reference.as_deref(),
                reference_type,
            )
            .await
        }
        Commands::Event {
            user,
            event_type,
            source,
            event_id,
        } => credit::event(&cli, *user, event_type, source, event_id.as_deref()).await,
        Commands::Fund { user, amount } => credit::fund(&cli, *user, *amount).await,
        Commands::Quests { action } => quests::run(&cli, action).await,
        Commands::Hitl { action } => quests::hitl(&cli, action).await,
        Commands::Credit { action } => credit::run(&cli, action).await,
        Commands::Treasury { action } => treasury::run(&cli, action).await,
        Commands::Flag { action } => credit::flag(&cli, action).await,
        Commands::Audit { from, to, action } => {
            audit::run(&cli, from.as_deref(), to.as_deref(), action.as_deref()).await
        }
        Commands::Report {
            kind,
            format,
            output,
        } => audit::report(&cli, *kind, *format, output.as_deref()).await,
    }
}
