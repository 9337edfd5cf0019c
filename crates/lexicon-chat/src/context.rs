//! Conversation context management.
//!
//! Tracks session state, maintains a rolling context window,
//! and rewrites follow-up utterances using the prior turn's term.

use chrono::Local;
use regex::{NoExpand, Regex};
use std::sync::LazyLock;
use uuid::Uuid;

use crate::types::{ConversationSession, SessionContext, Turn, TurnOutcome};

// =============================================================================
// ConversationManager
// =============================================================================

/// Manages conversation sessions and their context windows.
pub struct ConversationManager {
    /// Maximum number of recent turns to keep in context.
    pub context_turns: usize,
    /// Session timeout in minutes.
    pub session_timeout_minutes: u32,
}

impl ConversationManager {
    pub fn new(context_turns: usize, session_timeout_minutes: u32) -> Self {
        Self {
            context_turns,
            session_timeout_minutes,
        }
    }

    /// Create a fresh conversation session.
    pub fn create_session(&self) -> ConversationSession {
        let now = Local::now().timestamp();
        ConversationSession {
            id: Uuid::new_v4(),
            started_at: now,
            last_message_at: now,
            context: SessionContext::default(),
            message_count: 0,
        }
    }

    /// Check whether a session has expired based on the configured timeout.
    pub fn is_expired(&self, session: &ConversationSession) -> bool {
        let now = Local::now().timestamp();
        let timeout_secs = i64::from(self.session_timeout_minutes) * 60;
        now - session.last_message_at > timeout_secs
    }

    /// Record a routed turn.
    ///
    /// Appends the turn, trims the window to `context_turns`, and moves the
    /// active term and intent forward when the turn resolved a term.
    pub fn update_session(
        &self,
        session: &mut ConversationSession,
        utterance: &str,
        outcome: &TurnOutcome,
    ) {
        session.last_message_at = Local::now().timestamp();
        session.message_count += 1;

        let term = outcome.intent.term().map(str::to_string);
        session.context.recent_turns.push(Turn {
            utterance: utterance.to_string(),
            response: outcome.text.clone(),
            intent: outcome.intent.kind(),
            term: term.clone(),
        });

        while session.context.recent_turns.len() > self.context_turns {
            session.context.recent_turns.remove(0);
        }

        if let Some(term) = term {
            session.context.active_term = Some(term);
            session.context.active_intent = Some(outcome.intent.clone());
        }
    }
}

// =============================================================================
// FollowUpResolver
// =============================================================================

static PRONOUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:the\s+same\s+term|this\s+term|that\s+term|it|that|this|them)\b")
        .expect("Invalid pronoun regex")
});

/// Rewrites utterances that refer back to the prior turn's subject.
pub struct FollowUpResolver;

impl FollowUpResolver {
    /// Substitute the first pronoun reference with `prior_term`.
    ///
    /// Returns `None` when there is no prior term or nothing to substitute.
    pub fn resolve(&self, utterance: &str, prior_term: Option<&str>) -> Option<String> {
        let term = prior_term?;
        if !PRONOUN_RE.is_match(utterance) {
            return None;
        }
        Some(PRONOUN_RE.replace(utterance, NoExpand(term)).into_owned())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Reply;
    use lexicon_core::types::{Intent, IntentKind};

    fn make_manager() -> ConversationManager {
        ConversationManager::new(5, 30)
    }

    fn make_outcome(intent: Intent, text: &str) -> TurnOutcome {
        TurnOutcome {
            intent,
            reply: Reply::Clarify { candidates: vec![] },
            text: text.to_string(),
            degradations: vec![],
        }
    }

    fn define(term: &str) -> Intent {
        Intent::DefineTerm {
            term: term.to_string(),
        }
    }

    // ---- Session creation ----

    #[test]
    fn test_create_session_has_uuid() {
        let session = make_manager().create_session();
        assert_ne!(session.id, Uuid::nil());
    }

    #[test]
    fn test_create_session_timestamps() {
        let session = make_manager().create_session();
        let now = Local::now().timestamp();
        assert!((session.started_at - now).abs() < 2);
        assert!((session.last_message_at - now).abs() < 2);
    }

    #[test]
    fn test_create_session_empty_context() {
        let session = make_manager().create_session();
        assert_eq!(session.message_count, 0);
        assert!(session.context.recent_turns.is_empty());
        assert!(session.context.active_term.is_none());
        assert!(session.context.prior().is_none());
    }

    // ---- Session expiry ----

    #[test]
    fn test_session_not_expired() {
        let mgr = make_manager();
        let session = mgr.create_session();
        assert!(!mgr.is_expired(&session));
    }

    #[test]
    fn test_session_expired() {
        let mgr = make_manager();
        let mut session = mgr.create_session();
        session.last_message_at = Local::now().timestamp() - 31 * 60;
        assert!(mgr.is_expired(&session));
    }

    #[test]
    fn test_session_exactly_at_timeout() {
        let mgr = make_manager();
        let mut session = mgr.create_session();
        // Exactly 30 minutes ago is not expired: > is strict
        session.last_message_at = Local::now().timestamp() - 30 * 60;
        assert!(!mgr.is_expired(&session));
    }

    // ---- Session update ----

    #[test]
    fn test_update_session_records_turn() {
        let mgr = make_manager();
        let mut session = mgr.create_session();
        mgr.update_session(&mut session, "define CAC", &make_outcome(define("CAC"), "answer"));
        assert_eq!(session.message_count, 1);
        let turn = &session.context.recent_turns[0];
        assert_eq!(turn.utterance, "define CAC");
        assert_eq!(turn.response, "answer");
        assert_eq!(turn.intent, IntentKind::DefineTerm);
        assert_eq!(turn.term.as_deref(), Some("CAC"));
    }

    #[test]
    fn test_update_session_trims_context_window() {
        let mgr = ConversationManager::new(3, 30);
        let mut session = mgr.create_session();
        for i in 0..5 {
            let outcome = make_outcome(define(&format!("term {}", i)), "answer");
            mgr.update_session(&mut session, &format!("query {}", i), &outcome);
        }
        assert_eq!(session.context.recent_turns.len(), 3);
        assert_eq!(session.context.recent_turns[2].utterance, "query 4");
        assert_eq!(session.message_count, 5);
    }

    #[test]
    fn test_update_session_sets_active_intent() {
        let mgr = make_manager();
        let mut session = mgr.create_session();
        let intent = Intent::FindAssetsByTerm {
            term: "Annual Revenue".to_string(),
        };
        mgr.update_session(&mut session, "which assets use Annual Revenue", &make_outcome(intent.clone(), ""));
        assert_eq!(session.context.active_term.as_deref(), Some("Annual Revenue"));
        assert_eq!(session.context.prior(), Some(&intent));
    }

    #[test]
    fn test_termless_turn_keeps_active_intent() {
        let mgr = make_manager();
        let mut session = mgr.create_session();
        mgr.update_session(&mut session, "define CAC", &make_outcome(define("CAC"), ""));
        mgr.update_session(&mut session, "list terms", &make_outcome(Intent::ListTerms, ""));
        assert_eq!(session.context.recent_turns.len(), 2);
        assert_eq!(session.context.prior(), Some(&define("CAC")));
    }

    // ---- Follow-up resolution ----

    #[test]
    fn test_resolve_substitutes_pronoun() {
        let resolver = FollowUpResolver;
        assert_eq!(
            resolver.resolve("is it certified", Some("Annual Revenue")),
            Some("is Annual Revenue certified".to_string())
        );
    }

    #[test]
    fn test_resolve_prefers_multiword_reference() {
        let resolver = FollowUpResolver;
        assert_eq!(
            resolver.resolve("who owns the same term", Some("CAC")),
            Some("who owns CAC".to_string())
        );
        assert_eq!(
            resolver.resolve("chart that term by owner", Some("CAC")),
            Some("chart CAC by owner".to_string())
        );
    }

    #[test]
    fn test_resolve_only_first_reference() {
        let resolver = FollowUpResolver;
        assert_eq!(
            resolver.resolve("that and this", Some("CAC")),
            Some("CAC and this".to_string())
        );
    }

    #[test]
    fn test_resolve_keeps_dollar_sign_in_term() {
        assert_eq!(
            FollowUpResolver.resolve("which assets use it", Some("$ARR")),
            Some("which assets use $ARR".to_string())
        );
        assert_eq!(
            FollowUpResolver.resolve("define that", Some("Cost ${1} $0")),
            Some("define Cost ${1} $0".to_string())
        );
    }

    #[test]
    fn test_resolve_without_prior_term() {
        assert_eq!(FollowUpResolver.resolve("what about that?", None), None);
    }

    #[test]
    fn test_resolve_without_pronoun() {
        assert_eq!(FollowUpResolver.resolve("define Annual Revenue", Some("CAC")), None);
    }

    #[test]
    fn test_resolve_ignores_pronoun_inside_words() {
        // "item" and "thistle" are not references
        assert_eq!(FollowUpResolver.resolve("item thistle", Some("CAC")), None);
    }
}
