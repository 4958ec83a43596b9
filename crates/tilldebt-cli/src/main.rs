//! `tilldebt`: terminal UI for Till Debt Do Us Part.
//!
//! # Usage
//!
//! ```
//! tilldebt --url http://localhost:8080 --user alice@example.com --password secret
//! tilldebt --signup --user alice@example.com --password secret
//! tilldebt --config ~/.config/tilldebt/config.toml
//! ```

mod app;
mod client;
mod ui;

use std::{io, time::Duration};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use client::{ApiClient, ApiConfig};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;

const DEFAULT_URL: &str = "http://localhost:8080";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tilldebt", about = "Track your debts and watch them shrink")]
struct Args {
  /// Path to a TOML config file (url, username, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the server (default: http://localhost:8080).
  #[arg(long, env = "TILLDEBT_URL")]
  url: Option<String>,

  /// Account email.
  #[arg(long, env = "TILLDEBT_USER")]
  user: Option<String>,

  /// Account password (plaintext).
  #[arg(long, env = "TILLDEBT_PASSWORD")]
  password: Option<String>,

  /// Create the account before signing in.
  #[arg(long)]
  signup: bool,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  username: String,
  #[serde(default)]
  password: String,
}

/// CLI flags override the config file, which overrides defaults.
fn resolve(args: &Args, file: &ConfigFile) -> ApiConfig {
  let pick = |flag: &Option<String>, from_file: &str| {
    flag
      .clone()
      .or_else(|| (!from_file.is_empty()).then(|| from_file.to_owned()))
  };
  ApiConfig {
    base_url: pick(&args.url, &file.url).unwrap_or_else(|| DEFAULT_URL.to_string()),
    username: pick(&args.user, &file.username).unwrap_or_default(),
    password: pick(&args.password, &file.password).unwrap_or_default(),
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let api_config = resolve(&args, &file_cfg);
  if api_config.username.is_empty() {
    anyhow::bail!("no account given; pass --user/--password or set them in the config file");
  }

  let client = ApiClient::new(api_config).context("building HTTP client")?;
  if args.signup {
    client.signup().await.context("signing up")?;
  }

  let mut app = App::new(client);
  app.start().await.context("signing in")?;

  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(Event::Key(key)) = maybe_event
      && key.kind == KeyEventKind::Press
      && !app.handle_key(key).await?
    {
      break;
    }
  }

  Ok(())
}
