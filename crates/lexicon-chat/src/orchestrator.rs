//! Chat orchestrator: central coordinator wiring sessions to the router.
//!
//! Validates messages, keeps per-session context and transcripts, and turns
//! routed outcomes into [`ChatResponse`]s.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Local, TimeZone};
use uuid::Uuid;

use lexicon_core::config::ChatConfig;

use crate::context::ConversationManager;
use crate::error::ChatError;
use crate::router::IntentRouter;
use crate::types::{ChatMessage, ChatResponse, ChatSessionSummary, ConversationSession};

/// Maximum message length in characters.
const MAX_MESSAGE_LENGTH: usize = 2000;

/// Central chat orchestrator that coordinates sessions, routing, and history.
pub struct ChatOrchestrator {
    router: IntentRouter,
    context_manager: ConversationManager,
    sessions: Mutex<HashMap<Uuid, ConversationSession>>,
    messages: Mutex<HashMap<Uuid, Vec<ChatMessage>>>,
    config: ChatConfig,
}

impl ChatOrchestrator {
    pub fn new(router: IntentRouter, config: ChatConfig) -> Self {
        let context_manager =
            ConversationManager::new(config.context_turns, config.session_timeout_minutes);

        Self {
            router,
            context_manager,
            sessions: Mutex::new(HashMap::new()),
            messages: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Handle an incoming chat message.
    ///
    /// Returns the response and the session ID (new or existing). The
    /// session lock is released before routing so no lock is held across
    /// collaborator calls.
    pub async fn handle_message(
        &self,
        message: &str,
        session_id: Option<Uuid>,
    ) -> Result<(ChatResponse, Uuid), ChatError> {
        if !self.config.enabled {
            return Err(ChatError::Disabled);
        }

        let utterance = message.trim();
        if utterance.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if utterance.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(ChatError::MessageTooLong(MAX_MESSAGE_LENGTH));
        }

        let sid = self.resolve_session(session_id);

        // Snapshot what the router needs from the session
        let (prior, history) = {
            let sessions = self
                .sessions
                .lock()
                .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))?;
            match sessions.get(&sid) {
                Some(session) => (
                    session.context.prior().cloned(),
                    session.context.history(self.router.history_window()),
                ),
                None => (None, Vec::new()),
            }
        };

        let outcome = self.router.route(utterance, prior.as_ref(), &history).await;
        tracing::debug!(
            session = %sid,
            intent = %outcome.intent.kind(),
            degradations = outcome.degradations.len(),
            "Turn routed"
        );

        let response = ChatResponse {
            answer: outcome.text.clone(),
            intent: outcome.intent.kind(),
            fallback: outcome.reply.is_fallback(),
            suggestions: self.router.suggestions(&outcome.intent),
        };

        // Store messages in history
        let now = Local::now().timestamp();
        {
            let mut msgs = self
                .messages
                .lock()
                .map_err(|e| ChatError::StorageError(format!("messages lock poisoned: {}", e)))?;
            let entry = msgs.entry(sid).or_default();
            entry.push(ChatMessage {
                id: Uuid::new_v4(),
                session_id: sid,
                role: "user".to_string(),
                content: utterance.to_string(),
                intent: None,
                created_at: now,
            });
            entry.push(ChatMessage {
                id: Uuid::new_v4(),
                session_id: sid,
                role: "assistant".to_string(),
                content: response.answer.clone(),
                intent: Some(response.intent),
                created_at: now,
            });
        }

        // Update session context
        {
            let mut sessions = self
                .sessions
                .lock()
                .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))?;
            if let Some(session) = sessions.get_mut(&sid) {
                self.context_manager
                    .update_session(session, utterance, &outcome);
            }
        }

        Ok((response, sid))
    }

    /// Get a session by ID.
    pub fn get_session(&self, session_id: Uuid) -> Option<ConversationSession> {
        self.sessions
            .lock()
            .ok()
            .and_then(|s| s.get(&session_id).cloned())
    }

    /// List all active sessions as summaries.
    pub fn list_sessions(&self) -> Vec<ChatSessionSummary> {
        let sessions = match self.sessions.lock() {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        let mut summaries: Vec<ChatSessionSummary> = sessions
            .values()
            .map(|s| ChatSessionSummary {
                id: s.id,
                started_at: format_epoch(s.started_at),
                last_message_at: format_epoch(s.last_message_at),
                message_count: s.message_count,
            })
            .collect();
        summaries.sort_by(|a, b| a.started_at.cmp(&b.started_at).then(a.id.cmp(&b.id)));
        summaries
    }

    /// Delete a session and its transcript.
    pub fn delete_session(&self, session_id: Uuid) -> Result<(), ChatError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))?;
        if sessions.remove(&session_id).is_some() {
            if let Ok(mut msgs) = self.messages.lock() {
                msgs.remove(&session_id);
            }
            Ok(())
        } else {
            Err(ChatError::SessionNotFound(session_id))
        }
    }

    /// Get message history for a session.
    pub fn get_history(&self, session_id: Uuid) -> Result<Vec<ChatMessage>, ChatError> {
        {
            let sessions = self
                .sessions
                .lock()
                .map_err(|e| ChatError::StorageError(format!("session lock poisoned: {}", e)))?;
            if !sessions.contains_key(&session_id) {
                return Err(ChatError::SessionNotFound(session_id));
            }
        }

        let msgs = self
            .messages
            .lock()
            .map_err(|e| ChatError::StorageError(format!("messages lock poisoned: {}", e)))?;
        Ok(msgs.get(&session_id).cloned().unwrap_or_default())
    }

    // -- Private helpers --

    /// Resolve or create a session ID.
    fn resolve_session(&self, requested: Option<Uuid>) -> Uuid {
        let mut sessions = match self.sessions.lock() {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Session lock poisoned: {}", e);
                return Uuid::new_v4();
            }
        };

        if let Some(sid) = requested {
            if let Some(session) = sessions.get(&sid) {
                if !self.context_manager.is_expired(session) {
                    return sid;
                }
                tracing::debug!(session = %sid, "Session expired, starting a new one");
                sessions.remove(&sid);
                if let Ok(mut msgs) = self.messages.lock() {
                    msgs.remove(&sid);
                }
            }
        }

        let session = self.context_manager.create_session();
        let sid = session.id;
        sessions.insert(sid, session);
        sid
    }
}

/// Format epoch seconds as ISO 8601 string.
fn format_epoch(epoch: i64) -> String {
    chrono::Local
        .timestamp_opt(epoch, 0)
        .single()
        .map(|dt: DateTime<Local>| dt.to_rfc3339())
        .unwrap_or_else(|| epoch.to_string())
}

// =============================================================================
// Tests
// =============================================================================
