//! Response formatting.
//!
//! Renders routed replies as markdown-style text. Output depends only on
//! the reply, so identical replies always render identically.

use std::collections::BTreeMap;

use lexicon_core::types::{AssetRecord, Intent, TermRecord};

use crate::chart::{ChartSpec, GroupDimension};
use crate::error::RouteError;
use crate::fallback;
use crate::types::{Reply, Sourced};

const NAME_WIDTH: usize = 50;
const TYPE_WIDTH: usize = 20;
const SOURCE_WIDTH: usize = 20;
const SUMMARY_WIDTH: usize = 80;

// =============================================================================
// ResponseFormatter
// =============================================================================

/// Turns handler results into display text and follow-up suggestions.
pub struct ResponseFormatter {
    /// Maximum number of terms shown by a term listing.
    pub list_limit: usize,
}

impl ResponseFormatter {
    pub fn new(list_limit: usize) -> Self {
        Self { list_limit }
    }

    /// Render a reply.
    pub fn render(&self, reply: &Reply) -> String {
        match reply {
            Reply::Definition { requested, terms } => self.render_definition(requested, terms),
            Reply::Assets { term, assets } => self.render_assets(term, assets),
            Reply::Terms(terms) => self.render_terms(terms),
            Reply::Chart { term, chart } => self.render_chart(term, chart),
            Reply::Clarify { candidates } => self.render_clarify(candidates),
        }
    }

    /// Suggested next questions for a classified intent.
    pub fn suggestions(&self, intent: &Intent) -> Vec<String> {
        match intent {
            Intent::DefineTerm { term } => vec![
                format!("Which assets use {}?", term),
                format!("Chart assets using {} by connector", term),
                "List all terms".to_string(),
            ],
            Intent::FindAssetsByTerm { term } => vec![
                format!("Define {}", term),
                format!("Chart assets using {} by connector", term),
            ],
            Intent::RequestChart(req) => {
                let other = match GroupDimension::from_field(&req.category_field) {
                    GroupDimension::Owner => "connector",
                    _ => "owner",
                };
                vec![
                    format!("Which assets use {}?", req.term),
                    format!("Chart assets using {} by {}", req.term, other),
                ]
            }
            Intent::ListTerms => vec![
                "Define Customer Acquisition Cost".to_string(),
                "Which assets use Annual Revenue?".to_string(),
            ],
            Intent::Clarify { candidates } => {
                candidates.iter().map(|c| format!("Define {}", c)).collect()
            }
            Intent::Unknown => vec![
                "List all terms".to_string(),
                "Define Customer Acquisition Cost".to_string(),
            ],
        }
    }

    // -- Definitions --

    fn render_definition(&self, requested: &str, terms: &Sourced<Vec<TermRecord>>) -> String {
        let mut out = String::new();

        if let Some(reason) = terms.reason() {
            out.push_str(&fallback_notice(reason));
            out.push_str("\n\n");
            if !terms.data().iter().any(|t| fallback::matches_term(t, requested)) {
                out.push_str(&format!(
                    "'{}' is not in the sample glossary. Sample entries:\n\n",
                    requested
                ));
            }
        }

        let cards: Vec<String> = terms.data().iter().map(|t| self.term_card(t)).collect();
        out.push_str(&cards.join("\n\n---\n\n"));

        if let [only] = terms.data().as_slice() {
            out.push_str("\n\n**You can also ask:**\n");
            let intent = Intent::DefineTerm {
                term: only.name.clone(),
            };
            for suggestion in self.suggestions(&intent) {
                out.push_str(&format!("- {}\n", suggestion));
            }
        }

        out.trim_end().to_string()
    }

    fn term_card(&self, term: &TermRecord) -> String {
        let mut out = format!("## {}\n\n", term.name);

        if term.description.trim().is_empty() {
            out.push_str("_No description available._\n\n");
        } else {
            out.push_str(&term.description);
            out.push_str("\n\n");
        }

        let category = if term.category.is_empty() {
            "Uncategorized"
        } else {
            term.category.as_str()
        };
        out.push_str(&format!("**Category:** {}\n", category));
        out.push_str(&format!(
            "**Certificate:** {}\n",
            term.certificate_status.as_deref().unwrap_or("None")
        ));
        if term.owners.is_empty() {
            out.push_str("**Owners:** No owners assigned\n");
        } else {
            out.push_str(&format!("**Owners:** {}\n", term.owners.join(", ")));
        }
        if let Some(abbr) = &term.abbreviation {
            out.push_str(&format!("**Abbreviation:** {}\n", abbr));
        }
        if let Some(score) = term.popularity_score {
            out.push_str(&format!("**Popularity score:** {:.2}\n", score));
        }
        if let Some(starred) = term.starred_count.filter(|n| *n > 0) {
            out.push_str(&format!("**Starred:** {} times\n", starred));
        }
        if !term.examples.is_empty() {
            out.push_str("**Examples:**\n");
            for example in &term.examples {
                out.push_str(&format!("- {}\n", example));
            }
        }
        if let Some(qn) = &term.qualified_name {
            out.push_str(&format!("\n**Technical reference:** `{}`\n", qn));
        }

        out.trim_end().to_string()
    }

    // -- Assets --

    fn render_assets(&self, term: &str, assets: &Sourced<Vec<AssetRecord>>) -> String {
        let mut out = String::new();
        if let Some(reason) = assets.reason() {
            out.push_str(&fallback_notice(reason));
            out.push_str("\n\n");
        }

        let list = assets.data();
        if list.is_empty() {
            out.push_str(&format!("No assets found using '{}'.", term));
            return out;
        }

        out.push_str(&format!(
            "Found {} asset{} using '{}':\n\n",
            list.len(),
            if list.len() == 1 { "" } else { "s" },
            term
        ));
        out.push_str(&asset_table(list));
        out.trim_end().to_string()
    }

    // -- Term listing --

    fn render_terms(&self, terms: &Sourced<Vec<TermRecord>>) -> String {
        let mut out = String::new();
        if let Some(reason) = terms.reason() {
            out.push_str(&fallback_notice(reason));
            out.push_str("\n\n");
        }

        let all = terms.data();
        if all.is_empty() {
            out.push_str("No glossary terms found in the catalog.");
            return out;
        }

        out.push_str(&format!("Glossary terms ({} total):\n", all.len()));

        let mut by_category: BTreeMap<&str, Vec<&TermRecord>> = BTreeMap::new();
        for term in all.iter().take(self.list_limit) {
            let category = if term.category.is_empty() {
                "Uncategorized"
            } else {
                term.category.as_str()
            };
            by_category.entry(category).or_default().push(term);
        }

        for (category, group) in by_category {
            out.push_str(&format!("\n### {}\n", category));
            for term in group {
                if term.description.trim().is_empty() {
                    out.push_str(&format!("- **{}**\n", term.name));
                } else {
                    out.push_str(&format!(
                        "- **{}**: {}\n",
                        term.name,
                        truncate(&term.description, SUMMARY_WIDTH)
                    ));
                }
            }
        }

        if all.len() > self.list_limit {
            out.push_str(&format!("\n... and {} more terms.\n", all.len() - self.list_limit));
        }
        out.push_str("\nTip: ask \"Define <term>\" for the full entry.");
        out
    }

    // -- Charts --

    fn render_chart(&self, term: &str, chart: &Sourced<ChartSpec>) -> String {
        let mut out = String::new();
        if let Some(reason) = chart.reason() {
            out.push_str(&fallback_notice(reason));
            out.push_str("\n\n");
        }

        let spec = chart.data();
        out.push_str(&format!(
            "## Assets using '{}' by {}\n\n",
            term,
            title_case(&spec.category_field)
        ));
        out.push_str(&format!("Chart type: {}\n", spec.chart_type));
        out.push_str(&format!("Total assets: {}\n", spec.total));

        if spec.rows.is_empty() {
            out.push_str("\nNo assets to chart.");
            return out;
        }

        out.push('\n');
        for row in &spec.rows {
            out.push_str(&format!(
                "- {}: {} assets ({:.1}%)\n",
                row.label, row.value, row.percentage
            ));
        }
        out.trim_end().to_string()
    }

    // -- Clarification --

    fn render_clarify(&self, candidates: &[String]) -> String {
        if candidates.is_empty() {
            return [
                "I'm not sure how to help with that. You can ask me to:",
                "- Define a term, e.g. \"Define Customer Acquisition Cost\"",
                "- List glossary terms, e.g. \"List all terms\"",
                "- Find assets, e.g. \"Which assets use Annual Revenue?\"",
                "- Chart assets, e.g. \"Bar chart by connector type of assets that use Annual Revenue\"",
            ]
            .join("\n");
        }

        let mut out = String::from("I'm not sure which term you mean. Did you mean one of these?\n");
        for candidate in candidates {
            out.push_str(&format!(
                "\n- Define {}\n- Which assets use {}?",
                candidate, candidate
            ));
        }
        out
    }
}

impl Default for ResponseFormatter {
    fn default() -> Self {
        Self::new(20)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn fallback_notice(reason: &RouteError) -> String {
    match reason {
        RouteError::CatalogNotFound(subject) => format!(
            "_'{}' was not found in the catalog. Showing sample data instead._",
            subject
        ),
        RouteError::CatalogUnavailable(detail) => format!(
            "_The catalog is unavailable ({}). Showing sample data instead._",
            detail
        ),
        other => format!("_Showing sample data ({})._", other),
    }
}

fn asset_table(assets: &[AssetRecord]) -> String {
    let mut table = String::from("| Name | Asset Type | Source |\n|------|------------|--------|\n");
    for asset in assets {
        let source = if asset.connector.is_empty() {
            "Unknown"
        } else {
            asset.connector.as_str()
        };
        table.push_str(&format!(
            "| {} | {} | {} |\n",
            truncate(&asset.name, NAME_WIDTH),
            truncate(&asset.asset_type, TYPE_WIDTH),
            truncate(source, SOURCE_WIDTH)
        ));
    }
    table
}

/// Keep the first `max` characters, marking a cut with "...".
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn title_case(field: &str) -> String {
    field
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
