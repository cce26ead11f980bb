//! Headless mode for the encyclopedia.
//!
//! A line-oriented interface for scripts and automated testing. Lines
//! starting with `#` are commands; anything else is looked up as a topic.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use infinipedia_core::headless::HELP;
use infinipedia_core::render::html::to_document;
use infinipedia_core::{Encyclopedia, HeadlessBrowser, ImageService, Reply, SettingsStore};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

pub async fn run_headless(
    session: Encyclopedia,
    images: Arc<dyn ImageService>,
    store: SettingsStore,
    html: Option<PathBuf>,
) -> anyhow::Result<()> {
    let settings = *session.settings();
    let mut browser = HeadlessBrowser::new(session, images).with_settings_store(store);
    let mut stdout = tokio::io::stdout();

    let mut banner = vec![
        "=== Infinipedia Headless Mode ===".to_string(),
        format!(
            "Style: {}, sections: {}",
            settings.article_style, settings.number_of_sections
        ),
        String::new(),
    ];
    banner.extend(HELP.iter().map(|s| s.to_string()));
    banner.push(String::new());
    banner.push("Enter a topic or command (one per line):".to_string());
    write_lines(&mut stdout, &banner).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match browser.execute(&line).await {
            Reply::Quit => {
                write_lines(&mut stdout, &["Goodbye!".to_string()]).await?;
                break;
            }
            Reply::Lines(output) => {
                write_lines(&mut stdout, &output).await?;
            }
        }
        if let Some(path) = &html {
            write_html(&browser, path).await;
        }
    }

    info!(
        articles = browser.session().history().len(),
        "Headless session finished"
    );
    Ok(())
}

/// Write the page on screen to `path`.
async fn write_html(browser: &HeadlessBrowser, path: &Path) {
    let Some((page, images)) = browser.page() else {
        return;
    };
    let document = to_document(page, images, browser.session().settings().dark_mode);
    if let Err(e) = tokio::fs::write(path, document).await {
        warn!(error = %e, path = %path.display(), "Failed to write HTML");
    }
}

async fn write_lines(stdout: &mut tokio::io::Stdout, lines: &[String]) -> std::io::Result<()> {
    for line in lines {
        stdout.write_all(line.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }
    stdout.flush().await
}
