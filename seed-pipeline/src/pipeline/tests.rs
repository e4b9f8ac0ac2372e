use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use common::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        document::{DocumentStore, StoreProvider},
    },
    utils::config::SeedTarget,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{config::SeedConfig, SeedPipeline, SeedTuning, DEFAULT_SEED_VERSION};
use crate::{
    confirmation::ConfirmationProvider,
    result::SeedResult,
    source::{LoadError, SeedBundle},
    unit::SeedUnit,
};

struct MockConfirmation {
    answer: bool,
    prompts: Mutex<Vec<String>>,
}

impl MockConfirmation {
    fn new(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        })
    }

    async fn prompt_count(&self) -> usize {
        self.prompts.lock().await.len()
    }
}

#[async_trait]
impl ConfirmationProvider for MockConfirmation {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().await.push(prompt.to_string());
        self.answer
    }
}

struct MockProvider {
    store: Option<Arc<SurrealDbClient>>,
    connects: AtomicUsize,
}

impl MockProvider {
    async fn memory() -> Arc<Self> {
        let database = Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory("test_ns", &database)
            .await
            .expect("Failed to start in-memory surrealdb");
        Arc::new(Self {
            store: Some(Arc::new(db)),
            connects: AtomicUsize::new(0),
        })
    }

    fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            store: None,
            connects: AtomicUsize::new(0),
        })
    }

    fn db(&self) -> &SurrealDbClient {
        self.store.as_deref().expect("provider has a store")
    }

    fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreProvider for MockProvider {
    async fn connect(&self) -> Result<Arc<dyn DocumentStore>, AppError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match &self.store {
            Some(store) => Ok(store.clone()),
            None => Err(AppError::InternalError("connection refused".into())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Stamped {
    #[serde(rename = "seedVersion")]
    seed_version: String,
}

fn config(target: SeedTarget) -> SeedConfig {
    let mut config = SeedConfig::for_target(target);
    config.tuning = SeedTuning::for_target(target).without_delay();
    config
}

fn pipeline(
    config: SeedConfig,
    provider: &Arc<MockProvider>,
    confirmation: &Arc<MockConfirmation>,
) -> SeedPipeline {
    SeedPipeline::new(config, provider.clone(), confirmation.clone())
}

fn load_error(collections: &[&str], message: &str) -> LoadError {
    LoadError {
        collections: collections.iter().map(ToString::to_string).collect(),
        message: message.to_string(),
    }
}

fn site_bundle() -> SeedBundle {
    SeedBundle::from_units(vec![
        SeedUnit::collection(
            "pages",
            vec![
                json!({"id": "home", "title": "Home"}),
                json!({"id": "about", "title": "About"}),
            ],
        ),
        SeedUnit::document("config", "site", json!({"title": "Site"})).with_label("site config"),
        SeedUnit::collection("demo", vec![json!({"id": "sample", "title": "Sample"})]),
    ])
}

#[tokio::test]
async fn production_without_confirmation_writes_nothing() {
    let provider = MockProvider::memory().await;
    let confirmation = MockConfirmation::new(false);
    let pipeline = pipeline(config(SeedTarget::Production), &provider, &confirmation);

    let result = pipeline.run(site_bundle()).await;

    assert!(matches!(result, Err(AppError::ConfirmationDenied)));
    assert_eq!(confirmation.prompt_count().await, 1);
    assert_eq!(provider.connect_count(), 0);
    assert_eq!(provider.db().count_documents("pages").await.expect("count"), 0);
}

#[tokio::test]
async fn production_proceeds_once_operator_accepts() {
    let provider = MockProvider::memory().await;
    let confirmation = MockConfirmation::new(true);
    let pipeline = pipeline(config(SeedTarget::Production), &provider, &confirmation);

    let summary = pipeline.run(site_bundle()).await.expect("seed run");

    assert_eq!(confirmation.prompt_count().await, 1);
    assert_eq!(summary.successful_records, 4);
    assert_eq!(provider.db().count_documents("pages").await.expect("count"), 2);
}

#[tokio::test]
async fn confirm_flag_skips_the_prompt() {
    let provider = MockProvider::memory().await;
    let confirmation = MockConfirmation::new(false);
    let mut config = config(SeedTarget::Production);
    config.confirmed = true;
    let pipeline = pipeline(config, &provider, &confirmation);

    let summary = pipeline.run(site_bundle()).await.expect("seed run");

    assert_eq!(confirmation.prompt_count().await, 0);
    assert_eq!(summary.failed_records, 0);
}

#[tokio::test]
async fn emulator_never_prompts() {
    let provider = MockProvider::memory().await;
    let confirmation = MockConfirmation::new(false);
    let pipeline = pipeline(config(SeedTarget::Emulator), &provider, &confirmation);

    pipeline.run(site_bundle()).await.expect("seed run");

    assert_eq!(confirmation.prompt_count().await, 0);
    assert_eq!(provider.connect_count(), 1);
}

#[tokio::test]
async fn unreachable_store_fails_the_run() {
    let provider = MockProvider::unreachable();
    let confirmation = MockConfirmation::new(true);
    let pipeline = pipeline(config(SeedTarget::Emulator), &provider, &confirmation);

    let result = pipeline.run(site_bundle()).await;

    match result {
        Err(AppError::StoreInitialization(message)) => {
            assert!(message.contains("connection refused"), "{message}");
        }
        other => panic!("expected store initialization error, got {other:?}"),
    }
}

#[tokio::test]
async fn units_run_in_order_and_filters_apply() {
    let provider = MockProvider::memory().await;
    let confirmation = MockConfirmation::new(true);
    let mut config = config(SeedTarget::Emulator);
    config.options.exclude_collections.insert("demo".into());
    let pipeline = pipeline(config, &provider, &confirmation);

    let summary = pipeline.run(site_bundle()).await.expect("seed run");

    let names: Vec<&str> = summary
        .collections
        .iter()
        .map(|result| result.collection_name.as_str())
        .collect();
    assert_eq!(names, vec!["pages", "config"]);
    assert_eq!(summary.total_collections, 2);
    assert_eq!(provider.db().count_documents("demo").await.expect("count"), 0);
}

#[tokio::test]
async fn only_collections_restricts_the_run() {
    let provider = MockProvider::memory().await;
    let confirmation = MockConfirmation::new(true);
    let mut config = config(SeedTarget::Emulator);
    config.options.only_collections = Some(["config".to_string()].into_iter().collect());
    let pipeline = pipeline(config, &provider, &confirmation);

    let summary = pipeline.run(site_bundle()).await.expect("seed run");

    assert_eq!(summary.total_collections, 1);
    assert_eq!(summary.total_records, 1);
    assert_eq!(provider.db().count_documents("pages").await.expect("count"), 0);
    assert_eq!(provider.db().count_documents("config").await.expect("count"), 1);
}

#[tokio::test]
async fn summary_adds_up_and_counts_load_errors_as_fatal() {
    let provider = MockProvider::memory().await;
    let confirmation = MockConfirmation::new(true);
    let mut config = config(SeedTarget::Emulator);
    config.options.validate_data = true;
    let pipeline = pipeline(config, &provider, &confirmation);

    let mut bundle = SeedBundle::from_units(vec![
        SeedUnit::collection(
            "posts",
            vec![
                json!({"id": "first", "title": "First"}),
                json!({"body": "no identifying key"}),
                json!({"id": "third"}),
            ],
        ),
        SeedUnit::document("config", "footer", json!("not an object")),
    ]);
    bundle.load_errors.push(load_error(&["navigation"], "navigation.json: expected an array"));

    let summary = pipeline.run(bundle).await.expect("seed run");

    assert_eq!(summary.total_collections, 2);
    assert_eq!(summary.total_records, 4);
    assert_eq!(summary.successful_records, 2);
    assert_eq!(summary.failed_records, 2);
    assert_eq!(
        summary.successful_records + summary.failed_records,
        summary.total_records
    );
    assert_eq!(summary.load_errors.len(), 1);
    assert_eq!(summary.fatal_units, 1);
    assert!(summary.has_fatal_failures());
}

#[tokio::test]
async fn load_errors_of_excluded_collections_are_not_fatal() {
    let provider = MockProvider::memory().await;
    let confirmation = MockConfirmation::new(true);
    let mut config = config(SeedTarget::Emulator);
    config.options.exclude_collections.insert("demo".into());
    let pipeline = pipeline(config, &provider, &confirmation);

    let mut bundle = site_bundle();
    bundle.load_errors.push(load_error(&["demo"], "demo.json: expected value at line 1"));

    let summary = pipeline.run(bundle).await.expect("seed run");

    assert!(summary.load_errors.is_empty());
    assert_eq!(summary.fatal_units, 0);
    assert!(!summary.has_fatal_failures());
}

#[tokio::test]
async fn load_errors_outside_only_collections_are_not_fatal() {
    let provider = MockProvider::memory().await;
    let confirmation = MockConfirmation::new(true);
    let mut config = config(SeedTarget::Emulator);
    config.options.only_collections = Some(["pages".to_string()].into_iter().collect());
    let pipeline = pipeline(config, &provider, &confirmation);

    let mut bundle = site_bundle();
    bundle.load_errors.push(load_error(&["navigation"], "navigation.json: missing"));
    bundle.load_errors.push(load_error(&["pages", "menus"], "site.json: expected an object"));
    bundle.load_errors.push(load_error(&[], "keyed.json: expected an object"));

    let summary = pipeline.run(bundle).await.expect("seed run");

    assert_eq!(
        summary.load_errors,
        vec![
            "site.json: expected an object".to_string(),
            "keyed.json: expected an object".to_string(),
        ]
    );
    assert_eq!(summary.fatal_units, 2);
    assert!(summary.has_fatal_failures());
}

#[tokio::test]
async fn seed_version_prefers_override_then_bundle() {
    let bundle_with_version = || {
        let mut bundle = SeedBundle::from_units(vec![SeedUnit::collection(
            "pages",
            vec![json!({"id": "home", "title": "Home"})],
        )]);
        bundle.seed_version = Some("2.0.0".into());
        bundle
    };
    let confirmation = MockConfirmation::new(true);

    let provider = MockProvider::memory().await;
    pipeline(config(SeedTarget::Emulator), &provider, &confirmation)
        .run(bundle_with_version())
        .await
        .expect("seed run");
    let stamped: Option<Stamped> = provider
        .db()
        .fetch_document("pages", "home")
        .await
        .expect("fetch");
    assert_eq!(stamped.map(|doc| doc.seed_version), Some("2.0.0".into()));

    let provider = MockProvider::memory().await;
    let mut overridden = config(SeedTarget::Emulator);
    overridden.options.seed_version = Some("3.1.0".into());
    pipeline(overridden, &provider, &confirmation)
        .run(bundle_with_version())
        .await
        .expect("seed run");
    let stamped: Option<Stamped> = provider
        .db()
        .fetch_document("pages", "home")
        .await
        .expect("fetch");
    assert_eq!(stamped.map(|doc| doc.seed_version), Some("3.1.0".into()));

    let provider = MockProvider::memory().await;
    pipeline(config(SeedTarget::Emulator), &provider, &confirmation)
        .run(SeedBundle::from_units(vec![SeedUnit::collection(
            "pages",
            vec![json!({"id": "home"})],
        )]))
        .await
        .expect("seed run");
    let stamped: Option<Stamped> = provider
        .db()
        .fetch_document("pages", "home")
        .await
        .expect("fetch");
    assert_eq!(
        stamped.map(|doc| doc.seed_version),
        Some(DEFAULT_SEED_VERSION.to_string())
    );
}

#[tokio::test]
async fn progress_callback_sees_each_unit_as_it_finishes() {
    let provider = MockProvider::memory().await;
    let confirmation = MockConfirmation::new(true);
    let pipeline = pipeline(config(SeedTarget::Emulator), &provider, &confirmation);

    let mut seen = Vec::new();
    let summary = pipeline
        .run_with_progress(site_bundle(), &mut |result: &SeedResult| {
            seen.push(result.collection_name.clone());
        })
        .await
        .expect("seed run");

    assert_eq!(seen, vec!["pages", "config", "demo"]);
    assert_eq!(seen.len(), summary.collections.len());
}

#[tokio::test]
async fn empty_bundle_yields_an_empty_summary() {
    let provider = MockProvider::memory().await;
    let confirmation = MockConfirmation::new(true);
    let pipeline = pipeline(config(SeedTarget::Emulator), &provider, &confirmation);

    let summary = pipeline.run(SeedBundle::default()).await.expect("seed run");

    assert_eq!(summary.total_collections, 0);
    assert_eq!(summary.total_records, 0);
    assert!(!summary.has_fatal_failures());
}
