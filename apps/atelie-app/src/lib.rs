//! # Atelie App Library
//!
//! Command host for the Atelie workshop backend. The front-end talks to
//! it over stdin/stdout, one JSON line per command.
//!
//! ## Module Organization
//! ```text
//! atelie_app/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── invoke.rs       ◄─── JSON-lines request loop
//! ├── notifier.rs     ◄─── Result → notice, logging
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState + exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── session.rs  ◄─── Acting account
//! │   ├── ledger.rs   ◄─── In-memory order list
//! │   └── config.rs   ◄─── Configuration state
//! ├── commands/
//! │   ├── mod.rs      ◄─── Dispatch table
//! │   ├── stock.rs    ◄─── Stock CRUD and counter sale
//! │   ├── order.rs    ◄─── Quotes and orders
//! │   ├── pricing.rs  ◄─── Pricing calculator
//! │   ├── material.rs ◄─── Material catalog
//! │   ├── format.rs   ◄─── Display helpers
//! │   └── config.rs   ◄─── Configuration retrieval
//! └── error.rs        ◄─── API and startup errors
//! ```
//!
//! ## State Management
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    AppState                                             │
//! │                                                                         │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────────┐   │
//! │  │    DbState       │ │   OrderLedger    │ │    ConfigState       │   │
//! │  │                  │ │                  │ │                      │   │
//! │  │  • Database pool │ │  • Loaded orders │ │  • Store name        │   │
//! │  │  • Repositories  │ │  • Upsert/remove │ │  • Page size         │   │
//! │  └──────────────────┘ └──────────────────┘ └──────────────────────┘   │
//! │                       ┌──────────────────┐                             │
//! │                       │   SessionState   │                             │
//! │                       │  • Account id    │                             │
//! │                       └──────────────────┘                             │
//! │                                                                         │
//! │  Commands borrow only the pieces they need.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod invoke;
pub mod notifier;
pub mod state;

use std::path::PathBuf;
use std::process::ExitCode;

use atelie_db::Database;
use tracing::info;
use tracing_subscriber::EnvFilter;

use error::StartupError;
use invoke::Response;
use state::{AppState, ConfigState, DbState, OrderLedger, SessionState};

/// Runs the host until stdin closes.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Host Startup                                      │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter, to stderr                     │
/// │     • Default: info,atelie=debug,sqlx=warn; RUST_LOG overrides          │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • defaults ◄ atelie.toml ◄ ATELIE_* env vars                        │
/// │     • no account id ──► fatal                                           │
/// │                                                                         │
/// │  3. Connect to Database ──────────────────────────────────────────────► │
/// │     • pool size and timeout from config                                 │
/// │     • SQLite with WAL mode, pending migrations applied                  │
/// │     • ping + migration check; failure ──► fatal                         │
/// │                                                                         │
/// │  4. Serve stdin/stdout ───────────────────────────────────────────────► │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// A fatal error is written to stdout as a blocking notice and the
/// process exits non-zero.
pub fn run() -> ExitCode {
    init_tracing();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => return fatal(&StartupError::Io(e)),
    };

    match runtime.block_on(start(config_path)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fatal(&e),
    }
}

/// Loads configuration, opens the database and serves stdin/stdout.
pub async fn start(config_path: Option<PathBuf>) -> Result<(), StartupError> {
    info!("Starting Atelie host");

    let config = ConfigState::load(config_path)?;
    let account = config.account()?;
    let db_path = config.resolve_database_path()?;
    info!(?db_path, account = %account, "Database path determined");

    let db = Database::new(config.db_config(db_path)).await?;
    db.ping().await?;
    let migrations = db.migration_status().await?;
    if !migrations.is_current() {
        return Err(StartupError::SchemaBehind {
            applied: migrations.applied,
            embedded: migrations.embedded,
        });
    }
    info!(applied = migrations.applied, "Database connected and schema current");

    let state = AppState {
        db: DbState::new(db),
        session: SessionState::new(account),
        ledger: OrderLedger::new(),
        config,
    };

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    invoke::serve(&state, stdin, tokio::io::stdout()).await?;

    state.db.inner().close().await;
    Ok(())
}

fn fatal(err: &StartupError) -> ExitCode {
    let response = Response::fatal(err.to_string());
    match serde_json::to_string(&response) {
        Ok(line) => println!("{}", line),
        Err(_) => eprintln!("{}", err),
    }
    ExitCode::FAILURE
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=atelie=trace` - Show trace for atelie crates only
/// - Default: `info,atelie=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,atelie=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
