//! Integration tests that call the real Claude API.
//!
//! These tests require ANTHROPIC_API_KEY to be set (via .env file or environment).
//! Run with: `cargo test -p infinipedia-core --test api_integration -- --ignored`

use infinipedia_core::pipeline::PipelineError;
use infinipedia_core::{
    ArticleStyle, ClaudeCompletion, Encyclopedia, EncyclopediaConfig, Navigation,
};
use std::sync::Arc;

/// Load environment variables from .env file
fn setup() {
    let _ = dotenvy::dotenv();
}

/// Check if API key is available
fn has_api_key() -> bool {
    std::env::var("ANTHROPIC_API_KEY").is_ok()
}

fn session() -> Encyclopedia {
    let config = EncyclopediaConfig::from_env();
    let service = ClaudeCompletion::from_env(config.model.as_deref())
        .expect("Failed to create completion service");
    Encyclopedia::with_seed(Arc::new(service), config.deterministic(), 7)
}

#[tokio::test]
#[ignore] // Run with: cargo test -p infinipedia-core --test api_integration -- --ignored
async fn test_generates_article_with_closing_sections() {
    setup();
    if !has_api_key() {
        eprintln!("Skipping test: ANTHROPIC_API_KEY not set");
        return;
    }

    let mut session = session();
    let nav = session
        .run_to_completion("The Clockwork City of Aethel", None)
        .await
        .expect("Article should generate");

    let page = nav.page().expect("Expected a page");
    println!("Title: {}", page.article.title);
    println!("Sections: {}", page.article.sections.len());

    assert!(!page.article.title.is_empty());
    assert!(page.article.has_closing_sections());
    assert!(!page.rendered.links().is_empty(), "Articles should be densely linked");
}

#[tokio::test]
#[ignore]
async fn test_follow_link_runs_cohesion_check() {
    setup();
    if !has_api_key() {
        eprintln!("Skipping test: ANTHROPIC_API_KEY not set");
        return;
    }

    let mut session = session();
    let nav = session
        .run_to_completion("Sentient Moss", None)
        .await
        .expect("Article should generate");
    let label = nav.page().expect("Expected a page").rendered.links()[0].label.clone();

    let followed = session
        .follow_link_to_completion(&label, None)
        .await
        .expect("Linked article should generate");

    match followed {
        Navigation::Page { page, .. } => println!("Followed '{label}' to '{}'", page.article.title),
        Navigation::SelfLink => println!("'{label}' was a self link"),
        Navigation::Ignored => panic!("Link label should not be blank"),
    }
    assert_eq!(session.history().len(), 2);
}

#[tokio::test]
#[ignore]
async fn test_modern_style_refuses_fantasy() {
    setup();
    if !has_api_key() {
        eprintln!("Skipping test: ANTHROPIC_API_KEY not set");
        return;
    }

    let mut session = session();
    session.set_style(ArticleStyle::Modern);

    match session.run("The Gingerbread People", None).await {
        Err(PipelineError::Refused(message)) => println!("Refused: {message}"),
        Ok(nav) => println!(
            "Model wrote an article anyway: {:?}",
            nav.page().map(|p| &p.article.title)
        ),
        Err(e) => panic!("Unexpected failure: {e}"),
    }
}

#[tokio::test]
#[ignore]
async fn test_random_topics() {
    setup();
    if !has_api_key() {
        eprintln!("Skipping test: ANTHROPIC_API_KEY not set");
        return;
    }

    let topics = session().random_topics().await;
    println!("Topics: {topics:?}");
    assert!(!topics.is_empty());
}
