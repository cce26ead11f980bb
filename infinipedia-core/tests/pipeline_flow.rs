//! End-to-end flows through the session using scripted services.
//!
//! No network access; every completion comes from `MockCompletion`.

use infinipedia_core::history::HistoryState;
use infinipedia_core::images::{fill_all, ImageState};
use infinipedia_core::render::html::{to_document, to_html};
use infinipedia_core::testing::{article_json, category_json, refusal_json};
use infinipedia_core::{
    ArticleStyle, Encyclopedia, EncyclopediaConfig, MockCompletion, MockImages, Navigation,
    PipelineError, PipelineState, Renderer, Settings, SettingsStore, TaxonRank,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

fn deterministic() -> EncyclopediaConfig {
    EncyclopediaConfig::new().deterministic()
}

// =============================================================================
// GENERATION
// =============================================================================

#[tokio::test]
async fn test_builtin_article_makes_no_calls() {
    let mock = Arc::new(MockCompletion::failing());
    let mut session = Encyclopedia::with_seed(mock.clone(), deterministic(), 1);

    let nav = session.run_to_completion("  InFiNiPeDiA ", None).await.unwrap();
    let page = nav.page().expect("built-in page");

    assert_eq!(page.article.title, "Infinipedia");
    assert_eq!(mock.call_count(), 0);
    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn test_refusal_leaves_history_unchanged() {
    let mock = Arc::new(MockCompletion::new([
        category_json("Fictional Location"),
        article_json("Keon"),
        category_json("Fauna"),
        refusal_json("The topic 'Sky-Whales' is too fantastical for the 'Modern Age' style."),
    ]));
    let mut session = Encyclopedia::with_seed(mock.clone(), deterministic(), 1);

    session.run("Keon", None).await.unwrap();
    let before = session.history_state();

    session.set_style(ArticleStyle::Modern);
    let err = session.run("Sky-Whales", None).await.unwrap_err();

    assert!(matches!(err, PipelineError::Refused(_)));
    assert_eq!(
        err.user_message("Sky-Whales"),
        "The topic 'Sky-Whales' is too fantastical for the 'Modern Age' style."
    );
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history_state(), before);
    assert_eq!(session.current().unwrap().title, "Keon");
    assert_eq!(session.state(), PipelineState::Error);
}

#[tokio::test]
async fn test_modern_prompt_rules() {
    let mock = Arc::new(MockCompletion::new([category_json("Mythical Creature"), article_json("Bat")]));
    let config = deterministic().with_chaos_chance(1.0);
    let mut session = Encyclopedia::with_seed(mock.clone(), config, 1);
    session.set_style(ArticleStyle::Modern);

    session.run("Bat", None).await.unwrap();

    let request = &mock.requests()[1];
    let system = request.system().unwrap();
    assert!(system.contains("STRICT GUIDELINES FOR 'MODERN AGE' MODE"));
    assert!(system.contains("The `infobox.classification` field must be null."));
    // Chaos is only ever drawn for the normal style.
    assert!(!request.last_user().unwrap().contains("CHAOS"));
}

#[tokio::test]
async fn test_chaos_and_ambox_flags_reach_prompt() {
    let mock = Arc::new(MockCompletion::new([category_json("Food"), article_json("Gloomfruit")]));
    let config = deterministic().with_chaos_chance(1.0).with_ambox_chance(1.0);
    let mut session = Encyclopedia::with_seed(mock.clone(), config, 1);

    session.run("Gloomfruit", None).await.unwrap();

    let user = mock.requests()[1].last_user().unwrap().to_string();
    assert!(user.contains("CHAOS article"));
    assert!(user.contains("There is a 100% chance"));
}

#[tokio::test]
async fn test_classification_failure_uses_default_category() {
    let mock = Arc::new(MockCompletion::new(["garbage".to_string(), article_json("Moss")]));
    let mut session = Encyclopedia::with_seed(mock.clone(), deterministic(), 1);

    session.run("Moss", None).await.unwrap();

    assert!(mock.requests()[1]
        .last_user()
        .unwrap()
        .contains("- Category: \"General Topic\""));
}

// =============================================================================
// LINKS
// =============================================================================

#[tokio::test]
async fn test_taxon_link_bypasses_classification() {
    let mock = Arc::new(MockCompletion::new([
        article_json("Glimmeridae"),
        r#"{"isRelevant": true, "suggestedTopic": null}"#.to_string(),
    ]));
    let mut session = Encyclopedia::with_seed(mock.clone(), deterministic(), 1);
    session.run("Infinipedia", None).await.unwrap();

    let nav = session
        .follow_link_to_completion("Glimmeridae", Some(TaxonRank::Family))
        .await
        .unwrap();

    assert!(nav.page().is_some());
    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].last_user().unwrap().contains("- Category: \"Fictional Taxon\""));
    assert!(requests[0]
        .system()
        .unwrap()
        .contains("ONLY include these ranks: [\"Kingdom\",\"Phylum\",\"Class\",\"Order\"]"));
}

#[tokio::test]
async fn test_cohesion_failure_shows_no_notice() {
    let mock = Arc::new(MockCompletion::new([category_json("Food"), article_json("Keon")]));
    let mut session = Encyclopedia::with_seed(mock.clone(), deterministic(), 1);
    session.run("Infinipedia", None).await.unwrap();

    // The cohesion call finds no scripted reply and fails.
    let nav = session.follow_link_to_completion("Keon", None).await.unwrap();
    let page = nav.page().unwrap();

    assert_eq!(mock.call_count(), 3);
    assert!(page.rendered.links().iter().all(|l| l.label != "Oops"));
    let body = to_html(&page.rendered, &Default::default());
    assert!(!body.contains("cohesion-check"));
    assert!(!body.contains("Did you mean"));
    assert_eq!(session.state(), PipelineState::Rendered);
}

#[tokio::test]
async fn test_background_cohesion_request() {
    let mock = Arc::new(MockCompletion::new([
        category_json("Food"),
        article_json("Keon"),
        r#"{"isRelevant": false, "suggestedTopic": "The Librarians"}"#.to_string(),
    ]));
    let mut session = Encyclopedia::with_seed(mock.clone(), deterministic(), 1);
    session.run("Infinipedia", None).await.unwrap();

    let Navigation::Page { page, cohesion } = session.follow_link("Keon", None).await.unwrap() else {
        panic!("expected a page");
    };
    let request = cohesion.expect("link from an article carries a cohesion check");
    assert_eq!(request.generation, page.generation);

    let outcome = tokio::spawn(request.run()).await.unwrap();
    assert_eq!(outcome.generation, session.generation());
    assert_eq!(outcome.result.suggestion(), Some("The Librarians"));
}

// =============================================================================
// HISTORY
// =============================================================================

#[tokio::test]
async fn test_history_navigation() {
    let mock = Arc::new(MockCompletion::new([
        category_json("Food"),
        article_json("A"),
        category_json("Food"),
        article_json("B"),
        category_json("Food"),
        article_json("C"),
    ]));
    let mut session = Encyclopedia::with_seed(mock.clone(), deterministic(), 1);

    session.run("A", None).await.unwrap();
    session.run("B", None).await.unwrap();
    assert_eq!(session.back().unwrap().article.title, "A");
    assert_eq!(
        session.history_state(),
        HistoryState {
            can_go_back: false,
            can_go_forward: true
        }
    );

    session.run("C", None).await.unwrap();
    assert_eq!(session.history().len(), 2);
    assert!(session.forward().is_none());
    assert_eq!(session.back().unwrap().article.title, "A");
}

// =============================================================================
// RENDERING
// =============================================================================

#[tokio::test]
async fn test_red_link_extremes() {
    let article = infinipedia_core::builtin::infinipedia_article();

    let all_red = Renderer::new(1.0).render(&article, &mut StdRng::seed_from_u64(1));
    assert!(all_red.links().iter().all(|l| l.red));

    let none_red = Renderer::new(0.0).render(&article, &mut StdRng::seed_from_u64(1));
    assert!(none_red.links().iter().all(|l| !l.red));
}

#[tokio::test]
async fn test_images_fill_independently() {
    let article = infinipedia_core::builtin::infinipedia_article();
    let page = Renderer::new(0.0).render(&article, &mut StdRng::seed_from_u64(1));

    let failing = Arc::new(MockImages::new().failing_on("library"));
    let states = fill_all(failing, &page.images).await;
    assert_eq!(states.get(0), &ImageState::Failed);
    assert!(to_document(&page, &states, false).contains("Image failed to load."));
}

// =============================================================================
// SETTINGS
// =============================================================================

#[tokio::test]
async fn test_settings_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::new(dir.path().join("settings.json"));

    let settings = Settings::new(4).with_style(ArticleStyle::Alien).with_sections(6);
    store.save(&settings).await.unwrap();

    let loaded = store.load(Settings::new(4)).await.unwrap();
    assert_eq!(loaded, settings);

    let mock = Arc::new(MockCompletion::new([category_json("Food"), article_json("Poris")]));
    let mut session =
        Encyclopedia::with_seed(mock.clone(), deterministic(), 1).with_settings(loaded);
    session.run("Poris", None).await.unwrap();

    let request = &mock.requests()[1];
    assert!(request.system().unwrap().starts_with("You are an extraterrestrial intelligence"));
    assert!(request.last_user().unwrap().contains("Number of body sections to create: 6"));
}
