//! Conversational interface for Lexicon.
//!
//! Classifies glossary questions, routes them to the data catalog with
//! sample-data fallback, and renders markdown replies within chat sessions.

pub mod chart;
pub mod context;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod formatter;
pub mod orchestrator;
pub mod router;
pub mod rules;
pub mod types;

pub use chart::{build_chart, select_chart_type, ChartRow, ChartSpec, DataShape, GroupDimension};
pub use context::{ConversationManager, FollowUpResolver};
pub use error::{ChatError, RouteError};
pub use formatter::ResponseFormatter;
pub use orchestrator::ChatOrchestrator;
pub use router::IntentRouter;
pub use rules::{Rule, RuleMatch, RuleSet, RuleTarget};
pub use types::{
    ChatMessage, ChatResponse, ChatSessionSummary, ConversationSession, Reply, SessionContext,
    Sourced, Turn, TurnOutcome,
};
