use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Catalog records
// =============================================================================

/// A business glossary entry as returned by the catalog.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TermRecord {
    /// Opaque catalog key (GUID).
    pub id: String,
    pub name: String,
    pub description: String,
    /// Glossary category; empty when the term is uncategorised.
    pub category: String,
    /// Owner users followed by owner groups.
    pub owners: Vec<String>,
    pub certificate_status: Option<String>,
    pub abbreviation: Option<String>,
    pub examples: Vec<String>,
    pub qualified_name: Option<String>,
    pub popularity_score: Option<f64>,
    pub starred_count: Option<u32>,
}

/// A catalogued data object linked to a term.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    pub name: String,
    /// Catalog type name, e.g. `Table`, `TableauDashboard`.
    pub asset_type: String,
    /// Source connection or connector label; empty when unknown.
    pub connector: String,
    pub owners: Vec<String>,
    pub popularity_score: Option<f64>,
}

// =============================================================================
// Intents
// =============================================================================

/// Field-less intent discriminant shared by the rule table and the LLM boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    DefineTerm,
    FindAssetsByTerm,
    ListTerms,
    RequestChart,
    Clarify,
    Unknown,
}

impl IntentKind {
    /// Whether this intent needs a subject term to be dispatched.
    pub fn needs_term(self) -> bool {
        matches!(
            self,
            IntentKind::DefineTerm | IntentKind::FindAssetsByTerm | IntentKind::RequestChart
        )
    }

    /// Parse the labels used in LLM replies. Accepts both the snake_case
    /// names and the short labels (`define_term`, `find_assets`, ...).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "define_term" | "definition" | "define" => Some(IntentKind::DefineTerm),
            "find_assets_by_term" | "find_assets" | "asset_usage" => {
                Some(IntentKind::FindAssetsByTerm)
            }
            "list_terms" => Some(IntentKind::ListTerms),
            "request_chart" | "chart_request" | "analytical_chart" | "chart" => {
                Some(IntentKind::RequestChart)
            }
            "clarify" => Some(IntentKind::Clarify),
            "unknown" | "general_query" => Some(IntentKind::Unknown),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IntentKind::DefineTerm => "define_term",
            IntentKind::FindAssetsByTerm => "find_assets",
            IntentKind::ListTerms => "list_terms",
            IntentKind::RequestChart => "request_chart",
            IntentKind::Clarify => "clarify",
            IntentKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chart kinds the formatter can describe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Scatter,
    Histogram,
    Box,
}

impl ChartType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Scatter => "scatter",
            ChartType::Histogram => "histogram",
            ChartType::Box => "box",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a chart request extracted from an utterance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub term: String,
    /// Explicit chart keyword in the utterance, if any.
    pub chart_type: Option<ChartType>,
    /// Grouping dimension as the user phrased it, e.g. "connector type".
    pub category_field: String,
}

/// A classified utterance with its extracted parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    DefineTerm { term: String },
    FindAssetsByTerm { term: String },
    ListTerms,
    RequestChart(ChartRequest),
    /// Unresolved utterance with close term names to offer back.
    Clarify { candidates: Vec<String> },
    Unknown,
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::DefineTerm { .. } => IntentKind::DefineTerm,
            Intent::FindAssetsByTerm { .. } => IntentKind::FindAssetsByTerm,
            Intent::ListTerms => IntentKind::ListTerms,
            Intent::RequestChart(_) => IntentKind::RequestChart,
            Intent::Clarify { .. } => IntentKind::Clarify,
            Intent::Unknown => IntentKind::Unknown,
        }
    }

    /// Subject term carried by this intent, if any.
    pub fn term(&self) -> Option<&str> {
        match self {
            Intent::DefineTerm { term } | Intent::FindAssetsByTerm { term } => Some(term),
            Intent::RequestChart(req) => Some(&req.term),
            _ => None,
        }
    }
}
