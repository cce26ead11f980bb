//! Infinipedia terminal browser.
//!
//! A vim-style terminal interface for an encyclopedia that writes every
//! article on demand.
//!
//! # Headless Mode
//!
//! Run with `--headless` for a line-driven interface suitable for scripts:
//!
//! ```bash
//! echo "Sentient Moss" | cargo run -p infinipedia -- --headless
//! ```

mod app;
mod events;
mod headless;
mod ui;

use std::fs::File;
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use infinipedia_core::{
    ArticleStyle, ClaudeCompletion, CompletionService, DisabledImages, Encyclopedia, EncyclopediaConfig,
    HttpImageService, ImageService, Settings, SettingsStore,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use app::App;
use events::{handle_event, EventResult};
use ui::render::render;

/// Infinipedia - the encyclopedia that writes itself
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Run with a line-driven text interface instead of the TUI
    #[arg(long)]
    headless: bool,

    /// In headless mode, keep the current page written to this HTML file
    #[arg(long, value_name = "PATH")]
    html: Option<PathBuf>,

    /// Path to the settings file (overrides INFINIPEDIA_SETTINGS)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Seed for the random draws (ambox, chaos, red links)
    #[arg(long)]
    seed: Option<u64>,

    /// Article style for this run: normal, modern or alien
    #[arg(long)]
    style: Option<ArticleStyle>,

    /// Number of body sections per article
    #[arg(long)]
    sections: Option<u32>,

    /// Model override (overrides INFINIPEDIA_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Log file used in TUI mode
    #[arg(long, default_value = "infinipedia.log")]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_tracing(&args)?;

    if std::env::var("ANTHROPIC_API_KEY").is_err() {
        eprintln!("Error: ANTHROPIC_API_KEY environment variable not set.");
        eprintln!("Please set it in .env file or with: export ANTHROPIC_API_KEY=your_key_here");
        std::process::exit(1);
    }

    let (session, images, store) = build_session(&args).await?;

    if args.headless {
        return headless::run_headless(session, images, store, args.html).await;
    }

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, App::new(session, images, store)).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    Ok(())
}

/// Log to stderr in headless mode and to a file under the TUI.
fn init_tracing(args: &Args) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if args.headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .init();
    } else {
        let file = File::create(&args.log_file)
            .with_context(|| format!("creating log file {}", args.log_file.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

async fn build_session(
    args: &Args,
) -> anyhow::Result<(Encyclopedia, Arc<dyn ImageService>, SettingsStore)> {
    let mut config = EncyclopediaConfig::from_env();
    if let Some(model) = &args.model {
        config = config.with_model(model.clone());
    }

    let completion = ClaudeCompletion::from_env(config.model.as_deref())
        .context("creating completion service")?;

    let images: Arc<dyn ImageService> = match HttpImageService::from_env() {
        Some(service) => Arc::new(service),
        None => {
            warn!("IMAGE_API_KEY not set, image generation disabled");
            Arc::new(DisabledImages)
        }
    };

    let store = match &args.settings {
        Some(path) => SettingsStore::new(path.clone()),
        None => SettingsStore::from_env(),
    };

    let defaults = Settings::new(config.default_sections);
    let mut settings = match store.load(defaults).await {
        Ok(settings) => settings,
        Err(e) => {
            warn!(error = %e, path = %store.path().display(), "Could not read settings, using defaults");
            defaults
        }
    };
    if let Some(style) = args.style {
        settings = settings.with_style(style);
    }
    if let Some(sections) = args.sections {
        settings = settings.with_sections(sections);
    }
    info!(style = %settings.article_style, sections = settings.number_of_sections, "Starting session");

    let service: Arc<dyn CompletionService> = Arc::new(completion);
    let session = match args.seed {
        Some(seed) => Encyclopedia::with_seed(service, config, seed),
        None => Encyclopedia::new(service, config),
    }
    .with_settings(settings);

    Ok((session, images, store))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| render(f, &mut app))?;

        // Results from image and cohesion tasks
        app.drain_background();

        if let Some(action) = app.take_pending() {
            app.announce(&action);
            terminal.draw(|f| render(f, &mut app))?;
            app.perform(action).await;
        }

        if event::poll(Duration::from_millis(100))? {
            let ev = event::read()?;
            if handle_event(&mut app, ev) == EventResult::Quit {
                return Ok(());
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
