//! End-to-end conversations through the router and orchestrator with stubbed
//! collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use lexicon_chat::{ChatError, ChatOrchestrator, IntentRouter, Reply, RouteError};
use lexicon_client::{
    CatalogClient, CatalogError, HistoryEntry, LlmClassification, LlmClient, LlmError,
};
use lexicon_core::config::{ChatConfig, LexiconConfig};
use lexicon_core::types::{AssetRecord, ChartType, Intent, IntentKind, TermRecord};

// ---- Stubs ----

/// Catalog answering every call with the same canned result.
struct StubCatalog {
    term: Result<TermRecord, CatalogError>,
    assets: Result<Vec<AssetRecord>, CatalogError>,
    terms: Result<Vec<TermRecord>, CatalogError>,
    calls: AtomicUsize,
    keys: Mutex<Vec<String>>,
}

impl StubCatalog {
    fn live() -> Self {
        Self {
            term: Ok(cac_term()),
            assets: Ok(vec![
                asset("instacart_orders", "Table", "redshift"),
                asset("Marketing Spend", "TableauDashboard", "tableau"),
            ]),
            terms: Ok(vec![cac_term()]),
            calls: AtomicUsize::new(0),
            keys: Mutex::new(Vec::new()),
        }
    }

    fn failing(err: CatalogError) -> Self {
        Self {
            term: Err(err.clone()),
            assets: Err(err.clone()),
            terms: Err(err),
            calls: AtomicUsize::new(0),
            keys: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, key: &str) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().unwrap().push(key.to_string());
    }
}

#[async_trait]
impl CatalogClient for StubCatalog {
    async fn search_term(&self, name: &str) -> Result<TermRecord, CatalogError> {
        self.record(name);
        self.term.clone()
    }

    async fn find_assets_for_term(&self, term: &str) -> Result<Vec<AssetRecord>, CatalogError> {
        self.record(term);
        self.assets.clone()
    }

    async fn list_all_terms(&self) -> Result<Vec<TermRecord>, CatalogError> {
        self.record("*");
        self.terms.clone()
    }
}

struct StubLlm {
    calls: AtomicUsize,
}

impl StubLlm {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LlmClient for StubLlm {
    async fn classify_intent(
        &self,
        _utterance: &str,
        _history: &[HistoryEntry],
    ) -> Result<LlmClassification, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LlmError::Unavailable("connection refused".to_string()))
    }

    async fn rephrase(&self, _answer: &str, _utterance: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LlmError::Unavailable("connection refused".to_string()))
    }
}

fn cac_term() -> TermRecord {
    TermRecord {
        id: "cac-live".to_string(),
        name: "Customer Acquisition Cost".to_string(),
        description: "Total sales and marketing spend divided by new customers won.".to_string(),
        category: "Marketing".to_string(),
        owners: vec!["growth-team".to_string()],
        certificate_status: Some("VERIFIED".to_string()),
        abbreviation: Some("CAC".to_string()),
        ..TermRecord::default()
    }
}

fn asset(name: &str, asset_type: &str, connector: &str) -> AssetRecord {
    AssetRecord {
        id: format!("{}-id", name),
        name: name.to_string(),
        asset_type: asset_type.to_string(),
        connector: connector.to_string(),
        ..AssetRecord::default()
    }
}

fn router(catalog: Arc<StubCatalog>, llm: Arc<StubLlm>) -> IntentRouter {
    IntentRouter::new(catalog, llm, &LexiconConfig::default())
}

// ---- Router scenarios ----

#[tokio::test]
async fn test_define_renders_live_description_verbatim() {
    let catalog = Arc::new(StubCatalog::live());
    let llm = Arc::new(StubLlm::new());
    let router = router(catalog.clone(), llm.clone());

    let outcome = router
        .route("Define Customer Acquisition Cost", None, &[])
        .await;

    assert_eq!(
        outcome.intent,
        Intent::DefineTerm {
            term: "Customer Acquisition Cost".to_string()
        }
    );
    assert!(!outcome.reply.is_fallback());
    assert!(outcome
        .text
        .contains("Total sales and marketing spend divided by new customers won."));
    assert!(outcome.degradations.is_empty());
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_assets_not_found_falls_back_to_sample_assets() {
    let catalog = Arc::new(StubCatalog::failing(CatalogError::NotFound(
        "Net Collection Rate".to_string(),
    )));
    let router = router(catalog.clone(), Arc::new(StubLlm::new()));

    let outcome = router
        .route("Which assets use Net Collection Rate", None, &[])
        .await;

    assert_eq!(outcome.intent.kind(), IntentKind::FindAssetsByTerm);
    assert_eq!(outcome.intent.term(), Some("Net Collection Rate"));
    match &outcome.reply {
        Reply::Assets { term, assets } => {
            assert_eq!(term, "Net Collection Rate");
            assert!(assets.is_fallback());
            assert_eq!(assets.data().len(), 40);
        }
        other => panic!("expected asset reply, got {:?}", other),
    }
    assert_eq!(
        outcome.degradations,
        vec![RouteError::CatalogNotFound("Net Collection Rate".to_string())]
    );
    assert!(outcome.text.contains("Showing sample data instead."));
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_bar_chart_by_connector_type() {
    let catalog = Arc::new(StubCatalog::live());
    let router = router(catalog.clone(), Arc::new(StubLlm::new()));

    let outcome = router
        .route(
            "bar chart by connector type of assets that use Annual Revenue",
            None,
            &[],
        )
        .await;

    match &outcome.intent {
        Intent::RequestChart(request) => {
            assert_eq!(request.term, "Annual Revenue");
            assert_eq!(request.chart_type, Some(ChartType::Bar));
            assert_eq!(request.category_field, "connector type");
        }
        other => panic!("expected chart intent, got {:?}", other),
    }
    match &outcome.reply {
        Reply::Chart { chart, .. } => {
            assert!(!chart.is_fallback());
            assert_eq!(chart.data().chart_type, ChartType::Bar);
            assert_eq!(chart.data().total, 2);
        }
        other => panic!("expected chart reply, got {:?}", other),
    }
    assert_eq!(
        catalog.keys.lock().unwrap().as_slice(),
        ["Annual Revenue".to_string()]
    );
}

#[tokio::test]
async fn test_gibberish_with_llm_unavailable_asks_for_clarification() {
    let catalog = Arc::new(StubCatalog::live());
    let llm = Arc::new(StubLlm::new());
    let router = router(catalog.clone(), llm.clone());

    let outcome = router.route("asdfasdf", None, &[]).await;

    assert_eq!(outcome.intent, Intent::Unknown);
    assert!(matches!(outcome.reply, Reply::Clarify { ref candidates } if candidates.is_empty()));
    assert!(outcome.text.contains("You can ask me to"));
    assert!(outcome
        .degradations
        .contains(&RouteError::IntentUnresolved("asdfasdf".to_string())));
    assert!(outcome
        .degradations
        .iter()
        .any(|d| matches!(d, RouteError::LlmUnavailable(_))));
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_service_unavailable_still_returns_records() {
    let catalog = Arc::new(StubCatalog::failing(CatalogError::ServiceUnavailable(
        "connection refused".to_string(),
    )));
    let router = router(catalog, Arc::new(StubLlm::new()));

    for utterance in [
        "define CAC",
        "which assets use CAC",
        "list all terms",
        "pie chart of assets using Annual Revenue by owner",
    ] {
        let outcome = router.route(utterance, None, &[]).await;
        assert!(outcome.reply.is_fallback(), "{} should fall back", utterance);
        let records = match &outcome.reply {
            Reply::Definition { terms, .. } => terms.data().len(),
            Reply::Assets { assets, .. } => assets.data().len(),
            Reply::Terms(terms) => terms.data().len(),
            Reply::Chart { chart, .. } => chart.data().rows.len(),
            Reply::Clarify { .. } => 0,
        };
        assert!(records >= 1, "{} returned no records", utterance);
        assert!(outcome.text.contains("The catalog is unavailable"));
    }
}

#[tokio::test]
async fn test_same_input_same_outcome() {
    let catalog = Arc::new(StubCatalog::failing(CatalogError::NotFound(
        "Net Collection Rate".to_string(),
    )));
    let router = router(catalog, Arc::new(StubLlm::new()));

    let first = router
        .route("Which assets use Net Collection Rate", None, &[])
        .await;
    let second = router
        .route("Which assets use Net Collection Rate", None, &[])
        .await;
    assert_eq!(first, second);
}

// ---- Orchestrator scenarios ----

#[tokio::test]
async fn test_follow_up_inherits_prior_term() {
    let catalog = Arc::new(StubCatalog::live());
    let orch = ChatOrchestrator::new(
        router(catalog.clone(), Arc::new(StubLlm::new())),
        ChatConfig::default(),
    );

    let (first, sid) = orch
        .handle_message("Which assets use Annual Revenue?", None)
        .await
        .unwrap();
    assert_eq!(first.intent, IntentKind::FindAssetsByTerm);
    assert!(!first.fallback);

    let (second, same) = orch
        .handle_message("what about that?", Some(sid))
        .await
        .unwrap();
    assert_eq!(same, sid);
    assert_eq!(second.intent, IntentKind::FindAssetsByTerm);
    assert!(second.answer.contains("using 'Annual Revenue'"));
    assert_eq!(
        catalog.keys.lock().unwrap().as_slice(),
        ["Annual Revenue".to_string(), "Annual Revenue".to_string()]
    );

    let history = orch.get_history(sid).unwrap();
    assert_eq!(history.len(), 4);
}

#[tokio::test]
async fn test_fallback_flag_reaches_chat_response() {
    let catalog = Arc::new(StubCatalog::failing(CatalogError::Unauthorized(
        "HTTP 401".to_string(),
    )));
    let orch = ChatOrchestrator::new(
        router(catalog, Arc::new(StubLlm::new())),
        ChatConfig::default(),
    );

    let (response, _) = orch.handle_message("define CAC", None).await.unwrap();
    assert_eq!(response.intent, IntentKind::DefineTerm);
    assert!(response.fallback);
    assert!(response.answer.contains("Customer Acquisition Cost"));
    assert!(!response.suggestions.is_empty());
}

#[tokio::test]
async fn test_rejected_messages_touch_nothing() {
    let catalog = Arc::new(StubCatalog::live());
    let orch = ChatOrchestrator::new(
        router(catalog.clone(), Arc::new(StubLlm::new())),
        ChatConfig::default(),
    );

    assert!(matches!(
        orch.handle_message("  ", None).await,
        Err(ChatError::EmptyMessage)
    ));
    assert!(matches!(
        orch.handle_message(&"x".repeat(2001), None).await,
        Err(ChatError::MessageTooLong(2000))
    ));
    assert!(orch.list_sessions().is_empty());
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
}
