//! Intent routing.
//!
//! Classifies an utterance with the ordered rule table (falling back to
//! the LLM only when no rule matches), dispatches the intent to exactly one
//! catalog call, and renders the result. Collaborator failures never escape:
//! they become fallback data or a clarification prompt.

use std::sync::Arc;

use tracing::{debug, info, warn};

use lexicon_client::{CatalogClient, CatalogError, HistoryEntry, LlmClient};
use lexicon_core::config::LexiconConfig;
use lexicon_core::types::{ChartRequest, Intent, IntentKind};

use crate::chart::build_chart;
use crate::context::FollowUpResolver;
use crate::error::RouteError;
use crate::extract::{
    category_field, chart_type_hint, clean_term, closest_terms, is_subject_missing, lookup_key,
    strip_group_clause,
};
use crate::fallback;
use crate::formatter::ResponseFormatter;
use crate::rules::RuleSet;
use crate::types::{Reply, Sourced, TurnOutcome};

const DEFAULT_CATEGORY_FIELD: &str = "connector";

/// Maps one utterance to one intent and one handler result.
pub struct IntentRouter {
    rules: RuleSet,
    resolver: FollowUpResolver,
    formatter: ResponseFormatter,
    catalog: Arc<dyn CatalogClient>,
    llm: Arc<dyn LlmClient>,
    confidence_threshold: f32,
    history_window: usize,
    max_candidates: usize,
    enhance_responses: bool,
}

impl IntentRouter {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        llm: Arc<dyn LlmClient>,
        config: &LexiconConfig,
    ) -> Self {
        Self {
            rules: RuleSet::new(),
            resolver: FollowUpResolver,
            formatter: ResponseFormatter::default(),
            catalog,
            llm,
            confidence_threshold: config.llm.confidence_threshold,
            history_window: config.llm.history_window,
            max_candidates: config.chat.max_clarify_candidates,
            enhance_responses: config.llm.enhance_responses,
        }
    }

    /// Number of prior turns sent to the LLM classifier.
    pub fn history_window(&self) -> usize {
        self.history_window
    }

    /// Follow-up suggestions for a routed intent.
    pub fn suggestions(&self, intent: &Intent) -> Vec<String> {
        self.formatter.suggestions(intent)
    }

    /// Classify with the rule table only.
    ///
    /// Runs the raw utterance first, then the utterance with its first
    /// pronoun replaced by the prior term.
    pub fn classify(&self, utterance: &str, prior: Option<&Intent>) -> Option<Intent> {
        let prior_kind = prior.map(Intent::kind);
        let prior_term = prior.and_then(Intent::term);

        if let Some(m) = self.rules.match_utterance(utterance, prior_kind, prior_term) {
            if let Some(intent) = self.build_intent(m.kind, m.term, utterance, prior, m.follow_up) {
                return Some(intent);
            }
        }

        let rewritten = self.resolver.resolve(utterance, prior_term)?;
        debug!(rewritten = %rewritten, "Retrying rules with prior term substituted");
        let m = self.rules.match_utterance(&rewritten, prior_kind, prior_term)?;
        self.build_intent(m.kind, m.term, &rewritten, prior, m.follow_up)
    }

    /// Route one utterance to completion.
    ///
    /// Makes at most one catalog call and at most one LLM call.
    pub async fn route(
        &self,
        utterance: &str,
        prior: Option<&Intent>,
        history: &[HistoryEntry],
    ) -> TurnOutcome {
        let mut degradations = Vec::new();
        let mut llm_consulted = false;

        let classified = match self.classify(utterance, prior) {
            Some(intent) => Some(intent),
            None => {
                llm_consulted = true;
                self.classify_with_llm(utterance, prior, history, &mut degradations)
                    .await
            }
        };

        let (intent, reply) = match classified {
            Some(intent) => {
                let reply = self.dispatch(&intent, &mut degradations).await;
                (intent, reply)
            }
            None => self.unresolved(utterance, &mut degradations).await,
        };

        let mut text = self.formatter.render(&reply);

        if self.enhance_responses && !llm_consulted && !reply.is_fallback() {
            match self.llm.rephrase(&text, utterance).await {
                Ok(rephrased) if !rephrased.trim().is_empty() => text = rephrased,
                Ok(_) => debug!("LLM returned an empty rephrasing, keeping original text"),
                Err(e) => {
                    warn!(error = %e, "Response rephrasing failed, keeping original text");
                    degradations.push(RouteError::from(e));
                }
            }
        }

        TurnOutcome {
            intent,
            reply,
            text,
            degradations,
        }
    }

    // -- Classification --

    fn build_intent(
        &self,
        kind: IntentKind,
        term: Option<String>,
        utterance: &str,
        prior: Option<&Intent>,
        follow_up: bool,
    ) -> Option<Intent> {
        match kind {
            IntentKind::DefineTerm => Some(Intent::DefineTerm { term: term? }),
            IntentKind::FindAssetsByTerm => Some(Intent::FindAssetsByTerm { term: term? }),
            IntentKind::ListTerms => Some(Intent::ListTerms),
            IntentKind::RequestChart => {
                let stripped = strip_group_clause(&term?);
                let term = if is_subject_missing(&stripped) {
                    prior.and_then(Intent::term)?.to_string()
                } else {
                    stripped
                };

                // A follow-up keeps the previous chart's shape unless restated
                let previous = match prior {
                    Some(Intent::RequestChart(req)) if follow_up => Some(req),
                    _ => None,
                };
                let chart_type =
                    chart_type_hint(utterance).or_else(|| previous.and_then(|r| r.chart_type));
                let category_field = category_field(utterance)
                    .or_else(|| previous.map(|r| r.category_field.clone()))
                    .unwrap_or_else(|| DEFAULT_CATEGORY_FIELD.to_string());

                Some(Intent::RequestChart(ChartRequest {
                    term,
                    chart_type,
                    category_field,
                }))
            }
            IntentKind::Clarify | IntentKind::Unknown => None,
        }
    }

    async fn classify_with_llm(
        &self,
        utterance: &str,
        prior: Option<&Intent>,
        history: &[HistoryEntry],
        degradations: &mut Vec<RouteError>,
    ) -> Option<Intent> {
        let classification = match self.llm.classify_intent(utterance, history).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "LLM classification unavailable, continuing with patterns only");
                degradations.push(RouteError::from(e));
                return None;
            }
        };

        // NaN never reaches the threshold
        let accepted = classification.confidence >= self.confidence_threshold;
        if !accepted {
            debug!(
                intent = %classification.intent,
                confidence = classification.confidence,
                "LLM classification below threshold, ignoring"
            );
            return None;
        }

        let term = classification
            .term
            .as_deref()
            .map(clean_term)
            .filter(|t| !is_subject_missing(t))
            .or_else(|| prior.and_then(Intent::term).map(str::to_string));

        let intent = self.build_intent(classification.intent, term, utterance, prior, false);
        if let Some(ref intent) = intent {
            info!(
                intent = %intent.kind(),
                confidence = classification.confidence,
                "Utterance classified by LLM"
            );
        }
        intent
    }

    async fn unresolved(
        &self,
        utterance: &str,
        degradations: &mut Vec<RouteError>,
    ) -> (Intent, Reply) {
        degradations.push(RouteError::IntentUnresolved(utterance.trim().to_string()));

        let names = match self.catalog.list_all_terms().await {
            Ok(terms) => terms.into_iter().map(|t| t.name).collect(),
            Err(e) => {
                log_catalog_failure(&e, "glossary");
                degradations.push(RouteError::from(e));
                fallback::term_names()
            }
        };

        let candidates = closest_terms(utterance, &names, self.max_candidates);
        debug!(candidates = candidates.len(), "Computed clarification candidates");

        let intent = if candidates.is_empty() {
            Intent::Unknown
        } else {
            Intent::Clarify {
                candidates: candidates.clone(),
            }
        };
        (intent, Reply::Clarify { candidates })
    }

    // -- Dispatch --

    async fn dispatch(&self, intent: &Intent, degradations: &mut Vec<RouteError>) -> Reply {
        match intent {
            Intent::DefineTerm { term } => {
                let result = self
                    .catalog
                    .search_term(&lookup_key(term))
                    .await
                    .map(|record| vec![record]);
                Reply::Definition {
                    requested: term.clone(),
                    terms: sourced(result, term, || fallback::terms_for(term), degradations),
                }
            }
            Intent::FindAssetsByTerm { term } => {
                let result = self.catalog.find_assets_for_term(&lookup_key(term)).await;
                Reply::Assets {
                    term: term.clone(),
                    assets: sourced(result, term, fallback::assets, degradations),
                }
            }
            Intent::ListTerms => {
                let result = self.catalog.list_all_terms().await;
                Reply::Terms(sourced(result, "glossary", fallback::terms, degradations))
            }
            Intent::RequestChart(request) => {
                let result = self
                    .catalog
                    .find_assets_for_term(&lookup_key(&request.term))
                    .await
                    .map(|assets| build_chart(request, &assets));
                Reply::Chart {
                    term: request.term.clone(),
                    chart: sourced(
                        result,
                        &request.term,
                        || build_chart(request, &fallback::assets()),
                        degradations,
                    ),
                }
            }
            Intent::Clarify { candidates } => Reply::Clarify {
                candidates: candidates.clone(),
            },
            Intent::Unknown => Reply::Clarify {
                candidates: Vec::new(),
            },
        }
    }
}

/// Tag a catalog result, substituting sample data on failure.
fn sourced<T>(
    result: Result<T, CatalogError>,
    subject: &str,
    fallback: impl FnOnce() -> T,
    degradations: &mut Vec<RouteError>,
) -> Sourced<T> {
    match result {
        Ok(data) => Sourced::Live(data),
        Err(e) => {
            log_catalog_failure(&e, subject);
            let reason = RouteError::from(e);
            degradations.push(reason.clone());
            Sourced::Fallback {
                data: fallback(),
                reason,
            }
        }
    }
}

fn log_catalog_failure(err: &CatalogError, subject: &str) {
    match err {
        CatalogError::Unauthorized(_) => {
            warn!(error = %err, subject = %subject, "Catalog rejected credentials, using fallback data")
        }
        CatalogError::ServiceUnavailable(_) => {
            warn!(error = %err, subject = %subject, "Catalog unavailable, using fallback data")
        }
        CatalogError::NotFound(_) => {
            warn!(error = %err, subject = %subject, "Not found in catalog, using fallback data")
        }
    }
}
