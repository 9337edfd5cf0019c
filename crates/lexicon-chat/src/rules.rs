//! Ordered pattern rules for intent classification.
//!
//! Rules are plain data: a name, a target, and a regex with an optional
//! `term` capture group. The first rule that matches wins, so the most
//! specific patterns are declared first.

use regex::Regex;

use lexicon_core::types::IntentKind;

use crate::extract::{clean_term, is_subject_missing, ABBREVIATIONS};

/// What a matching rule classifies the utterance as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTarget {
    Intent(IntentKind),
    /// Reuse the prior turn's term-bearing intent with a new subject.
    PriorIntent,
}

/// One classification rule.
#[derive(Debug)]
pub struct Rule {
    pub name: &'static str,
    pub target: RuleTarget,
    pub regex: Regex,
}

/// Result of matching an utterance against the rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub rule: &'static str,
    pub kind: IntentKind,
    /// Cleaned subject, or the inherited prior term.
    pub term: Option<String>,
    /// Matched a rule that continues the prior intent.
    pub follow_up: bool,
}

/// The ordered rule table.
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

const TERM_TAIL: &str = r"(?P<term>[^?!]+?)\s*[?!.]*\s*$";

impl RuleSet {
    pub fn new() -> Self {
        use IntentKind::*;
        use RuleTarget::Intent as I;

        let phrase = |head: &str| format!("{head}{TERM_TAIL}");

        let abbreviations = ABBREVIATIONS
            .iter()
            .map(|(abbr, _)| *abbr)
            .collect::<Vec<_>>()
            .join("|");

        let rules: Vec<(&'static str, RuleTarget, String)> = vec![
            // ---- follow-up ----
            (
                "follow_up_what_about",
                RuleTarget::PriorIntent,
                phrase(r"(?i)^\s*(?:and\s+)?(?:what|how)\s+about\s+(?:the\s+)?"),
            ),
            // ---- chart ----
            (
                "chart_assets_using",
                I(RequestChart),
                phrase(
                    r"(?i)\b(?:chart|graph|plot|visuali[sz]e|visuali[sz]ation|histogram|diagram|breakdown)\b.*?\b(?:uses?|using|linked\s+to|tagged\s+with)\s+(?:the\s+term\s+)?",
                ),
            ),
            (
                "chart_for_term",
                I(RequestChart),
                phrase(
                    r"(?i)\b(?:chart|graph|plot|visuali[sz]e|visuali[sz]ation|histogram|diagram|breakdown)\b.*?\b(?:for|of|on)\s+(?:the\s+term\s+)?",
                ),
            ),
            (
                "chart_subject_first",
                I(RequestChart),
                r"(?i)\b(?:chart|graph|plot|visuali[sz]e)\s+(?:the\s+)?(?P<term>[^?!]+?)\s+(?:assets\s+)?by\s+[^?!]+?\s*[?!.]*\s*$"
                    .to_string(),
            ),
            (
                "chart_bare",
                I(RequestChart),
                phrase(r"(?i)^\s*(?:please\s+)?(?:chart|graph|plot|visuali[sz]e)\s+(?:the\s+)?"),
            ),
            // ---- list ----
            (
                "list_terms",
                I(ListTerms),
                r"(?i)\b(?:list|show|display|give|get)\s+(?:me\s+)?(?:all\s+)?(?:of\s+)?(?:the\s+)?(?:available\s+)?(?:glossary\s+|business\s+)?terms\b"
                    .to_string(),
            ),
            (
                "terms_available",
                I(ListTerms),
                r"(?i)\b(?:what|which)\s+(?:glossary\s+|business\s+)?terms\s+(?:are|do|exist)\b|\bwhat\s+are\s+(?:all\s+)?(?:the\s+)?(?:available\s+)?(?:glossary\s+)?terms\b|^\s*(?:all\s+)?(?:the\s+)?(?:glossary\s+)?terms\s*[?!.]*\s*$"
                    .to_string(),
            ),
            // ---- find assets ----
            (
                "which_assets_use",
                I(FindAssetsByTerm),
                phrase(
                    r"(?i)\b(?:which|what)\s+(?:data\s+)?assets\s+(?:use|uses|are\s+using|reference|references|are\s+linked\s+to|are\s+tagged\s+with|contain|have)\s+(?:the\s+term\s+|the\s+)?",
                ),
            ),
            (
                "where_used",
                I(FindAssetsByTerm),
                r"(?i)\bwhere\s+(?:is|are)\s+(?:the\s+term\s+|the\s+)?(?P<term>[^?!]+?)\s+used\b".to_string(),
            ),
            (
                "assets_for",
                I(FindAssetsByTerm),
                phrase(
                    r"(?i)\b(?:find|show|list|get|display)\s+(?:me\s+)?(?:all\s+)?(?:the\s+)?(?:data\s+)?assets\s+(?:for|using|that\s+use|which\s+use|linked\s+to|related\s+to|tagged\s+with|with|of)\s+(?:the\s+term\s+|the\s+)?",
                ),
            ),
            (
                "assets_linked",
                I(FindAssetsByTerm),
                phrase(
                    r"(?i)\bassets\s+(?:linked\s+to|related\s+to|tagged\s+with|for|using|that\s+use|which\s+use)\s+(?:the\s+term\s+|the\s+)?",
                ),
            ),
            (
                "bare_assets",
                I(FindAssetsByTerm),
                r"(?i)^\s*(?:and\s+)?(?:(?:show|list|find|get)\s+(?:me\s+)?)?(?:the\s+|its\s+|their\s+)?(?:linked\s+|related\s+)?assets\s*[?!.]*\s*$"
                    .to_string(),
            ),
            // ---- define ----
            (
                "define",
                I(DefineTerm),
                phrase(
                    r"(?i)\b(?:define|definition\s+of|meaning\s+of|tell\s+me\s+about|explain|describe)\s+(?:the\s+term\s+|the\s+)?",
                ),
            ),
            (
                "what_does_mean",
                I(DefineTerm),
                r"(?i)\bwhat\s+does\s+(?:the\s+term\s+|the\s+)?(?P<term>[^?!]+?)\s+(?:mean|stand\s+for)\b"
                    .to_string(),
            ),
            (
                "what_is",
                I(DefineTerm),
                phrase(r"(?i)\b(?:what\s+is|what's|whats|what\s+are)\s+(?:an?\s+|the\s+term\s+|the\s+)?"),
            ),
            // ---- bare abbreviation ----
            (
                "bare_abbreviation",
                I(DefineTerm),
                format!(r"(?i)^\s*(?P<term>{abbreviations})\s*[?!.]*\s*$"),
            ),
            // ---- terse follow-up ----
            (
                "follow_up_and",
                RuleTarget::PriorIntent,
                r"(?i)^\s*and\s+(?:the\s+)?(?P<term>[^?!]+?)\s*\?\s*$".to_string(),
            ),
        ];

        let rules = rules
            .into_iter()
            .map(|(name, target, pattern)| Rule {
                name,
                target,
                regex: Regex::new(&pattern).expect("Invalid rule regex"),
            })
            .collect();

        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Match an utterance against the table in declaration order.
    ///
    /// A rule whose term is absent or a bare pronoun inherits `prior_term`;
    /// without one, term-bearing rules are skipped and matching continues.
    pub fn match_utterance(
        &self,
        utterance: &str,
        prior_kind: Option<IntentKind>,
        prior_term: Option<&str>,
    ) -> Option<RuleMatch> {
        for rule in &self.rules {
            let Some(caps) = rule.regex.captures(utterance) else {
                continue;
            };

            let kind = match rule.target {
                RuleTarget::Intent(kind) => kind,
                RuleTarget::PriorIntent => prior_kind
                    .filter(|k| k.needs_term())
                    .unwrap_or(IntentKind::DefineTerm),
            };

            let captured = caps
                .name("term")
                .map(|m| clean_term(m.as_str()))
                .filter(|t| !is_subject_missing(t));

            let term = match captured {
                Some(term) => Some(term),
                None => prior_term.map(str::to_string),
            };

            if kind.needs_term() && term.is_none() {
                tracing::debug!(rule = rule.name, "Rule matched without a subject, skipping");
                continue;
            }

            tracing::debug!(rule = rule.name, intent = %kind, term = ?term, "Rule matched");
            return Some(RuleMatch {
                rule: rule.name,
                kind,
                term: if kind.needs_term() { term } else { None },
                follow_up: rule.target == RuleTarget::PriorIntent,
            });
        }
        None
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new()
    }
}
