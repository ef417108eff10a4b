// Main entry point
use clap::Parser;
use colored::Colorize;
use research_wizard::application::wizard::{Completion, Wizard};
use research_wizard::infrastructure;
use research_wizard::infrastructure::config::load_config;
use research_wizard::interfaces::cli::Cli;
use research_wizard::presentation::theme::Theme;
use research_wizard::presentation::view::format_stage;
use research_wizard::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup graceful shutdown handler
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("Failed to listen for shutdown signal: {}", e);
        } else {
            eprintln!("\nInterrupted, shutting down...");
            let _ = shutdown_tx.send(());
        }
    });

    let cli = Cli::parse();
    let config = load_config()?;

    if config.logging.enable {
        init_logging(&config.logging)?;
    }

    if cli.generate_config {
        infrastructure::config::generate_config_sample()?;
        return Ok(());
    }
    if cli.edit_config {
        if let Some(config_path) = infrastructure::config::get_config_path() {
            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
            let config_path_clone = config_path.clone();
            tokio::task::spawn_blocking(move || {
                std::process::Command::new(editor)
                    .arg(&config_path_clone)
                    .status()
            })
            .await??;
        } else {
            eprintln!("{}", "Config file not found".red());
        }
        return Ok(());
    }

    let db_path = infrastructure::config::get_database_path(&config);
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let db_conn = infrastructure::storage::sqlite::init_database(&db_path).await?;
    let state = AppState::new(db_conn, config.clone())?;

    if cli.status {
        print_status(&state).await?;
        return Ok(());
    }

    let mut wizard = state.wizard().await;

    if let Some(subject) = &cli.subject {
        let selection = wizard.select_subject(subject)?;
        if selection.cache_hit {
            eprintln!("{}", format!("Restored cached research for {}", selection.key).cyan());
        }
    }
    if let Some(stage) = cli.stage {
        wizard.set_stage(stage);
    }

    if cli.run {
        let stage = wizard.current_stage();
        tokio::select! {
            result = wizard.run_stage(stage, state.research.as_ref(), state.quotes.as_ref()) => {
                report_completion(&result?);
            }
            _ = &mut shutdown_rx => {
                eprintln!("Run interrupted");
                return Ok(());
            }
        }
    }

    if cli.advance {
        if let Err(e) = wizard.advance_stage() {
            eprintln!("{}", e.to_string().yellow());
        }
    }

    // Advancing may land on the strategy stage, so check for an owed run last
    if let Some(request) = wizard.take_auto_run() {
        tokio::select! {
            outcome = request.execute(state.research.as_ref(), state.quotes.as_ref()) => {
                let completion = wizard.complete(outcome).await;
                report_completion(&completion);
            }
            _ = &mut shutdown_rx => {
                eprintln!("Strategy run interrupted");
                return Ok(());
            }
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&json_view(&wizard))?);
    } else {
        let theme_name = cli.theme.as_deref().unwrap_or(config.theme.as_str());
        let theme = Theme::from_name(theme_name);
        print!("{}", format_stage(&wizard, &theme, config.enable_emoji));
    }

    Ok(())
}

fn report_completion(completion: &Completion) {
    match completion {
        Completion::Applied | Completion::Cached => {}
        Completion::AppliedInBackground => {
            eprintln!("{}", "Result saved for a subject that is no longer active".cyan());
        }
        Completion::Unpersisted(e) => {
            eprintln!("{}", format!("Result shown but not saved: {}", e).yellow());
        }
        Completion::Failed(e) => {
            eprintln!("{}", format!("Stage failed: {}", e).red());
        }
    }
}

fn json_view(wizard: &Wizard) -> serde_json::Value {
    serde_json::json!({
        "view": wizard.view(),
        "record": wizard.record(),
        "marketScan": wizard.market_scan(),
        "dayTrading": wizard.day_trading(),
    })
}

/// Initialize logging with path and level configuration
fn init_logging(logging: &infrastructure::config::Logging) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    let level = match logging.level.as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARN" => "warn",
        "ERROR" => "error",
        _ => "warn",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if let Some(path) = &logging.path {
        if !path.is_empty() {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .init();
            return Ok(());
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

async fn print_status(state: &AppState) -> anyhow::Result<()> {
    println!("{}", "wizard status".green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let cache = &state.config.cache;
    let db_path = infrastructure::config::get_database_path(&state.config);
    println!("Database: {}", db_path.display());
    println!(
        "Windows: prune {}s · subject {}s · scan {}s",
        cache.prune_window_secs, cache.subject_window_secs, cache.scan_window_secs
    );
    if cache.windows_disagree() {
        println!(
            "{}",
            "Note: scans stay fresh longer than the load-time prune keeps them".yellow()
        );
    }

    let wizard = state.wizard().await;
    let store = wizard.store();
    let now = store.now_millis();
    println!("Namespace: {} ({} entries)", store.namespace(), store.len());

    let mut entries: Vec<_> = store.entries().iter().collect();
    entries.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
    for (key, entry) in entries {
        println!(
            "  {:<20} {:<12} {}s old",
            key.as_str(),
            entry.state.kind(),
            entry.age_millis(now) / 1000
        );
    }

    let orphaned: Vec<String> = state
        .blobs
        .namespaces()
        .await?
        .into_iter()
        .map(|(name, _)| name)
        .filter(|name| name != store.namespace())
        .collect();
    if !orphaned.is_empty() {
        println!("Orphaned namespaces: {}", orphaned.join(", "));
    }

    println!(
        "Config: {}",
        infrastructure::config::get_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "Not found".to_string())
    );
    println!(
        "Spool: {}",
        infrastructure::config::get_spool_dir(&state.config).display()
    );

    Ok(())
}
