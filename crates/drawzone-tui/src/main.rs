// drawzone entry point.
//
// Startup sequence (interactive mode):
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Access gate
// 4. Open database
// 5. Create mpsc channels and the application state
// 6. Spawn app logic task
// 7. Run the TUI until the user quits
// 8. Cleanup on exit

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{error, info};

use drawzone_core::access::authorize;
use drawzone_core::config;
use drawzone_core::db::Database;
use drawzone_tui::{app, cli, tui};

#[derive(Parser)]
#[command(name = "drawzone", about = "Lottery draw history with zone-group verdicts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the interactive dashboard (default)
    Tui,

    /// List the available periods, newest first
    List,

    /// Print the classified draws of a period
    Show {
        /// Period resource name, e.g. lottery_2024.json; newest when omitted
        period: Option<String>,
    },

    /// Merge draws from a JSON or CSV file into the data directory
    Import {
        /// File to read
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("drawzone starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: source={}, {} zone groups",
        config.data.build_source().describe(),
        config.groups.len()
    );

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => run_dashboard(config).await,
        Command::List => {
            let source = config.data.build_source();
            println!("{}", cli::list(source.as_ref()).await?);
            Ok(())
        }
        Command::Show { period } => {
            let source = config.data.build_source();
            println!(
                "{}",
                cli::show(source.as_ref(), &config.groups, period.as_deref()).await?
            );
            Ok(())
        }
        Command::Import { file } => {
            println!("{}", cli::import(&config, &file)?);
            Ok(())
        }
    }
}

async fn run_dashboard(config: config::Config) -> anyhow::Result<()> {
    // 3. Access gate
    let user = match authorize(config.access.as_ref(), config.credentials.current_user()) {
        Ok(user) => user,
        Err(e) => {
            error!("Access refused: {}", e);
            eprintln!("drawzone: access refused: {e}");
            eprintln!("Set [user] email in config/credentials.toml to an allowed account.");
            std::process::exit(2);
        }
    };
    info!("Signed in as {}", user.label());

    // 4. Open database
    let db = Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path.display());

    // 5. Create mpsc channels and the application state
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);
    let (load_tx, load_rx) = mpsc::channel(16);

    let source = config.data.build_source();
    let app_state = app::AppState::new(&config, user, source, Arc::new(db), load_tx);

    // 6. Spawn app logic task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, load_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    // 7. Run the TUI event loop until the user quits
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {}", e);
    }

    // 8. Cleanup: wait for app task to finish (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("drawzone shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("drawzone.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("drawzone=info,drawzone_core=info,drawzone_tui=info,warn")
        }))
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
