use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use client::App;
use client::http::HttpBackend;
use client::router::{NavigationOutcome, Route};
use client::util::sanitize;
use shared::config::load_config;
use shared::types::{AliasType, PostAlias, PutAlias};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "alias-client.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the navigation guards for a location and print where they lead
    Navigate { location: String },
    /// Print the alias list
    List {
        #[arg(long)]
        category: Option<AliasType>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Create an alias
    Add {
        name: String,
        #[arg(value_name = "TYPE")]
        kind: AliasType,
        content: String,
    },
    /// Change an alias's content or type
    Edit {
        name: String,
        #[arg(long)]
        content: Option<String>,
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<AliasType>,
    },
    /// Delete an alias
    Remove { name: String },
    /// Show who the stored token belongs to
    Whoami,
    /// Forget the stored token
    SignOut,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = load_config(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("Invalid log level")?;
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app = Arc::new(App::from_config(config));

    #[cfg(unix)]
    spawn_reload_on_hangup(app.clone(), args.config.clone())?;

    let ok = run(&app, args.command).await;

    app.expire_notifications().await;
    for notification in app.notifications.drain() {
        println!("[{}] {}", notification.kind, notification.message);
    }

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Re-read the config file on SIGHUP for as long as the command runs.
#[cfg(unix)]
fn spawn_reload_on_hangup(app: Arc<App<HttpBackend>>, path: String) -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup()).context("Failed to listen for SIGHUP")?;
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            info!("SIGHUP received, reloading {}", path);
            if let Err(e) = app.reload_config(&path).await {
                warn!("Config reload failed: {}", e);
            }
        }
    });
    Ok(())
}

/// Enter `route`, printing where the guards sent us instead if refused.
async fn enter(app: &App<HttpBackend>, route: &Route) -> bool {
    match app.enter(route).await {
        Ok(()) => true,
        Err(outcome) => {
            println!("Cannot open {}: {}", route, outcome);
            false
        }
    }
}

async fn run(app: &App<HttpBackend>, command: Command) -> bool {
    match command {
        Command::Navigate { location } => {
            let outcome = app.resolve(&location).await;
            println!("{}", outcome);
            matches!(outcome, NavigationOutcome::Proceed(_))
        }

        Command::List { category, search } => {
            if !enter(app, &Route::Home).await {
                return false;
            }

            app.aliases.fetch().await;
            let aliases = match search.as_deref() {
                Some(query) => app.aliases.search(query),
                None => app.aliases.list(),
            };

            for alias in aliases
                .iter()
                .filter(|a| category.is_none_or(|c| a.kind == c))
            {
                println!(
                    "{}\t{}\t{}",
                    alias.name,
                    alias.kind.label(),
                    sanitize(&alias.content)
                );
            }
            true
        }

        Command::Add {
            name,
            kind,
            content,
        } => {
            if !enter(app, &Route::Create).await {
                return false;
            }
            app.aliases
                .add(PostAlias::new(name, kind, content))
                .await
                .is_ok()
        }

        Command::Edit {
            name,
            content,
            kind,
        } => {
            let route = Route::Edit { name: name.clone() };
            if !enter(app, &route).await {
                return false;
            }

            app.aliases.fetch().await;
            app.aliases
                .edit(&name, PutAlias { content, kind })
                .await
                .is_ok()
        }

        Command::Remove { name } => {
            if !enter(app, &Route::Home).await {
                return false;
            }
            app.aliases.remove(&name).await.is_ok()
        }

        Command::Whoami => {
            if !enter(app, &Route::Home).await {
                return false;
            }

            let session = app.session.snapshot();
            println!("{}", session.username);
            for permission in &session.permissions {
                println!("  {}", permission);
            }
            true
        }

        Command::SignOut => {
            app.sign_out().await;
            info!("Token removed");
            println!("{}", app.resolve(&Route::SignedOut.path()).await);
            true
        }
    }
}
