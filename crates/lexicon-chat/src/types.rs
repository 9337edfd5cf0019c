//! Chat-layer types: routed replies, sessions, and transcript records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lexicon_client::HistoryEntry;
use lexicon_core::types::{AssetRecord, Intent, IntentKind, TermRecord};

use crate::chart::ChartSpec;
use crate::error::RouteError;

// =============================================================================
// Handler results
// =============================================================================

/// A handler result tagged with where its data came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Sourced<T> {
    /// Returned by the live catalog.
    Live(T),
    /// Substituted from the built-in sample data after a catalog failure.
    Fallback { data: T, reason: RouteError },
}

impl<T> Sourced<T> {
    pub fn data(&self) -> &T {
        match self {
            Sourced::Live(data) | Sourced::Fallback { data, .. } => data,
        }
    }

    pub fn into_data(self) -> T {
        match self {
            Sourced::Live(data) | Sourced::Fallback { data, .. } => data,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Sourced::Fallback { .. })
    }

    pub fn reason(&self) -> Option<&RouteError> {
        match self {
            Sourced::Live(_) => None,
            Sourced::Fallback { reason, .. } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        match self {
            Sourced::Live(data) => Sourced::Live(f(data)),
            Sourced::Fallback { data, reason } => Sourced::Fallback {
                data: f(data),
                reason,
            },
        }
    }
}

/// Structured result of dispatching one intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Definition {
        requested: String,
        terms: Sourced<Vec<TermRecord>>,
    },
    Assets {
        term: String,
        assets: Sourced<Vec<AssetRecord>>,
    },
    Terms(Sourced<Vec<TermRecord>>),
    Chart {
        term: String,
        chart: Sourced<ChartSpec>,
    },
    /// Close term names to offer back; empty for the generic help prompt.
    Clarify { candidates: Vec<String> },
}

impl Reply {
    pub fn is_fallback(&self) -> bool {
        match self {
            Reply::Definition { terms, .. } => terms.is_fallback(),
            Reply::Assets { assets, .. } => assets.is_fallback(),
            Reply::Terms(terms) => terms.is_fallback(),
            Reply::Chart { chart, .. } => chart.is_fallback(),
            Reply::Clarify { .. } => false,
        }
    }
}

/// Everything the router produced for one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub intent: Intent,
    pub reply: Reply,
    /// Rendered answer text.
    pub text: String,
    /// Recovered failures, in the order they happened.
    pub degradations: Vec<RouteError>,
}

// =============================================================================
// UI boundary
// =============================================================================

/// A response from the chat engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub intent: IntentKind,
    /// True when the answer was built from sample data.
    pub fallback: bool,
    pub suggestions: Vec<String>,
}

/// A stored chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    /// "user" or "assistant"
    pub role: String,
    pub content: String,
    pub intent: Option<IntentKind>,
    pub created_at: i64,
}

/// Summary of a chat session for listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSessionSummary {
    pub id: Uuid,
    pub started_at: String,
    pub last_message_at: String,
    pub message_count: u32,
}

// =============================================================================
// Session state
// =============================================================================

/// One recorded exchange.
#[derive(Debug, Clone)]
pub struct Turn {
    pub utterance: String,
    pub response: String,
    pub intent: IntentKind,
    pub term: Option<String>,
}

/// Rolling conversation context for follow-up resolution.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub recent_turns: Vec<Turn>,
    /// Last term any turn resolved.
    pub active_term: Option<String>,
    /// Last intent that carried a term.
    pub active_intent: Option<Intent>,
}

impl SessionContext {
    /// The intent follow-ups resolve against.
    pub fn prior(&self) -> Option<&Intent> {
        self.active_intent.as_ref()
    }

    /// The last `window` turns, oldest first, for LLM classification.
    pub fn history(&self, window: usize) -> Vec<HistoryEntry> {
        let skip = self.recent_turns.len().saturating_sub(window);
        self.recent_turns
            .iter()
            .skip(skip)
            .map(|turn| HistoryEntry {
                utterance: turn.utterance.clone(),
                intent: turn.intent,
                term: turn.term.clone(),
            })
            .collect()
    }
}

/// A live conversation session.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    pub id: Uuid,
    pub started_at: i64,
    pub last_message_at: i64,
    pub context: SessionContext,
    pub message_count: u32,
}
