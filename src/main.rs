use std::rc::Rc;

use clap::Parser;
use clinicrm::config::{ClientConfig, parse_ordering};
use clinicrm::net::api::HttpClinicApi;
use clinicrm::shell::{Shell, ShellError, Step};
use clinicrm::state::query_cache::QueryCache;
use clinicrm::state::session::SessionStore;
use clinicrm::util::toast::ToastQueue;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "clinicrm", about = "Clinic CRM terminal client")]
struct Cli {
    /// Backend base URL.
    #[arg(long, env = "CLINIC_API_URL")]
    api_url: Option<String>,

    /// `last-settled` or `last-issued`.
    #[arg(long, env = "CLINIC_MUTATION_ORDERING")]
    ordering: Option<String>,

    /// Run these commands (separated by `;`) instead of reading stdin.
    #[arg(long, short = 'c')]
    commands: Option<String>,
}

fn init_tracing() -> Result<(), ShellError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("clinicrm=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| ShellError::Logging(e.to_string()))
}

fn load_config(cli: &Cli) -> Result<ClientConfig, ShellError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config.api_url = url.trim_end_matches('/').to_owned();
    }
    if cli.ordering.is_some() {
        config.ordering = parse_ordering(cli.ordering.as_deref())?;
    }
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ShellError> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing()?;
    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!(error = %e, "ignoring unreadable .env");
        }
    }

    let config = load_config(&cli)?;
    tracing::info!(api_url = %config.api_url, ordering = ?config.ordering, "clinicrm starting");

    let api = Rc::new(HttpClinicApi::new(&config)?);
    let toasts = ToastQueue::new();
    let store = SessionStore::new(api, Rc::new(QueryCache::new()), Rc::new(toasts.clone()), config.ordering);
    let mut shell = Shell::new(store, toasts, &config.login_path, &config.home_path);

    let mut stdout = tokio::io::stdout();
    print(&mut stdout, &shell.start().await).await?;

    if let Some(script) = &cli.commands {
        for line in script.split(';') {
            if run(&mut shell, &mut stdout, line).await? {
                break;
            }
        }
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if run(&mut shell, &mut stdout, &line).await? {
            break;
        }
    }
    tracing::info!("clinicrm exiting");
    Ok(())
}

/// Run one line; returns `true` when the shell should exit.
async fn run(shell: &mut Shell, stdout: &mut tokio::io::Stdout, line: &str) -> Result<bool, ShellError> {
    match shell.run_line(line).await {
        Step::Continue(text) => {
            print(stdout, &text).await?;
            Ok(false)
        }
        Step::Quit => Ok(true),
    }
}

async fn print(stdout: &mut tokio::io::Stdout, text: &str) -> Result<(), ShellError> {
    if text.is_empty() {
        return Ok(());
    }
    stdout.write_all(text.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}
