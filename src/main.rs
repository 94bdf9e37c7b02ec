use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use link_tracker::api::{self, AppState};
use link_tracker::{ClickChannel, ClickEvent, Element, LinkTracker, MouseButton, Page, Settings};

#[derive(Parser, Debug)]
#[command(name = "link-tracker")]
#[command(about = "Classify, rewrite and report link clicks on HTML pages")]
struct Cli {
    /// Settings file (TOML); built-in defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate a left click on every anchor and print the tracked events
    Scan {
        page: PathBuf,
        /// URL the page was loaded from
        #[arg(long)]
        url: String,
        /// Report the events to the collector
        #[arg(long)]
        send: bool,
    },
    /// Classify a single click on the first anchor matching a CSS selector
    Click {
        page: PathBuf,
        #[arg(long)]
        url: String,
        #[arg(long)]
        selector: String,
        #[arg(long, value_enum, default_value = "primary")]
        button: ButtonArg,
        #[arg(long)]
        send: bool,
    },
    /// Run document-ready initialization and list anchors opened in a new tab
    Rewrite {
        page: PathBuf,
        #[arg(long)]
        url: String,
    },
    /// Run a local collector that accepts tracked events
    Serve,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ButtonArg {
    Primary,
    Middle,
    Secondary,
}

impl From<ButtonArg> for MouseButton {
    fn from(arg: ButtonArg) -> Self {
        match arg {
            ButtonArg::Primary => MouseButton::Primary,
            ButtonArg::Middle => MouseButton::Auxiliary,
            ButtonArg::Secondary => MouseButton::Secondary,
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<Arc<Settings>> {
    let settings = match path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    Ok(Arc::new(settings))
}

fn load_page(path: &Path, url: &str) -> Result<Page> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read page {}", path.display()))?;
    Page::parse(&html, url)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Command::Scan { page, url, send } => scan(settings, &page, &url, send).await,
        Command::Click {
            page,
            url,
            selector,
            button,
            send,
        } => click(settings, &page, &url, &selector, button.into(), send).await,
        Command::Rewrite { page, url } => rewrite(settings, &page, &url),
        Command::Serve => serve(settings).await,
    }
}

async fn scan(settings: Arc<Settings>, path: &Path, url: &str, send: bool) -> Result<()> {
    let page = load_page(path, url)?;
    let tracker = LinkTracker::for_page(settings, &page)?;

    let anchors = page.anchors();
    let events: Vec<_> = anchors
        .iter()
        .filter_map(|anchor| tracker.classify(&ClickEvent::left(*anchor)))
        .collect();

    for event in &events {
        println!("{}", serde_json::to_string(event)?);
    }
    log::info!("{} of {} anchor(s) tracked", events.len(), anchors.len());

    if send {
        let reporter = tracker.reporter();
        let handles = events.into_iter().map(|event| reporter.send(event));
        let results = futures::future::join_all(handles).await;
        let failed = results
            .into_iter()
            .filter(|r| !matches!(r, Ok(Ok(()))))
            .count();
        log::info!("Reported to {} ({} failed)", reporter.endpoint(), failed);
    }

    Ok(())
}

async fn click(
    settings: Arc<Settings>,
    path: &Path,
    url: &str,
    selector: &str,
    button: MouseButton,
    send: bool,
) -> Result<()> {
    let page = load_page(path, url)?;
    let tracker = LinkTracker::for_page(settings, &page)?;
    let anchor = page.find_anchor(selector)?;

    let channel = match button {
        MouseButton::Primary => ClickChannel::Click,
        _ => ClickChannel::AuxClick,
    };
    let event = ClickEvent {
        channel,
        button,
        target: anchor,
    };

    if !send {
        match tracker.classify(&event) {
            Some(link_event) => println!("{}", serde_json::to_string_pretty(&link_event)?),
            None => println!("Click not tracked"),
        }
        return Ok(());
    }

    match tracker.handle_click(&event) {
        Some(handle) => handle.await.context("Report task panicked")?,
        None => {
            println!("Click not tracked");
            Ok(())
        }
    }
}

fn rewrite(settings: Arc<Settings>, path: &Path, url: &str) -> Result<()> {
    let mut page = load_page(path, url)?;
    let tracker = LinkTracker::for_page(settings, &page)?;

    tracker.on_document_ready(&mut page);

    for anchor in page.rewritten_anchors() {
        println!("target=_blank  {}", anchor.attr("href").unwrap_or_default());
    }
    Ok(())
}

async fn serve(settings: Arc<Settings>) -> Result<()> {
    let state = web::Data::new(AppState::default());

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .context("PORT must be a valid number")?;

    let endpoint = match url::Url::parse(&settings.endpoint) {
        Ok(absolute) => absolute.path().to_string(),
        Err(_) => settings.endpoint.clone(),
    };

    log::info!("Starting link collector at http://{}:{}{}", host, port, endpoint);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .configure(api::configure(endpoint.clone()))
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
