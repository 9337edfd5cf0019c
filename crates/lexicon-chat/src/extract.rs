//! Parameter extraction from utterances.
//!
//! Term cleanup, abbreviation expansion, chart keyword hints, the "by ..."
//! grouping field, and keyword overlap against known term names.

use regex::Regex;
use std::sync::LazyLock;

use lexicon_core::types::ChartType;

/// Common glossary abbreviations and their full names.
pub static ABBREVIATIONS: &[(&str, &str)] = &[
    ("cac", "Customer Acquisition Cost"),
    ("ltv", "Lifetime Value"),
    ("cpa", "Cost Per Acquisition"),
    ("cpc", "Cost Per Click"),
    ("cpm", "Cost Per Mille"),
    ("roi", "Return On Investment"),
    ("kpi", "Key Performance Indicator"),
];

/// Words that stand in for a subject without naming one.
static SUBJECTLESS: &[&str] = &[
    "it", "that", "this", "them", "these", "those", "same", "the same", "the same term",
    "this term", "that term", "the term", "term", "terms", "asset", "assets", "data",
    "one", "that one", "this one",
];

// Stop words for keyword overlap
static STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "do", "does", "did",
    "i", "me", "my", "we", "our", "you", "your", "it", "its", "they", "them", "their",
    "what", "which", "who", "this", "that", "these", "those", "of", "in", "to", "for",
    "with", "on", "at", "from", "by", "about", "as", "and", "but", "or", "not", "no",
    "so", "if", "then", "than", "all", "any", "some", "how", "when", "where", "why",
    "show", "tell", "find", "list", "define", "explain", "describe", "please", "can",
    "could", "would", "term", "terms", "asset", "assets", "mean", "means", "meaning",
];

// Chart keyword hints, checked in order
static CHART_HINTS: LazyLock<Vec<(Regex, ChartType)>> = LazyLock::new(|| {
    let mk = |pat: &str| Regex::new(pat).expect("Invalid chart hint regex");
    vec![
        (mk(r"(?i)\b(?:box\s*plot|box\s+chart|quartiles?)\b"), ChartType::Box),
        (mk(r"(?i)\b(?:pie|donut|doughnut|share|proportions?)\b"), ChartType::Pie),
        (
            mk(r"(?i)\b(?:line\s+(?:chart|graph)|trends?|time\s+series|over\s+time)\b"),
            ChartType::Line,
        ),
        (mk(r"(?i)\b(?:scatter|correlations?)\b"), ChartType::Scatter),
        (mk(r"(?i)\b(?:histogram|distribution)\b"), ChartType::Histogram),
        (mk(r"(?i)\b(?:bar|column\s+chart)\b"), ChartType::Bar),
    ]
});

static GROUP_BY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bby\s+(?P<field>[^?!.]+?)(?:\s+(?:of|for|using|that|which|with|linked|in)\b|\s*[?!.]*\s*$)",
    )
    .expect("Invalid group-by regex")
});

static TRAILING_BY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+by\s+.*$").expect("Invalid trailing-by regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Normalise a captured term: trim, collapse whitespace, drop surrounding
/// quotes and trailing punctuation, and strip a leading article.
pub fn clean_term(raw: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(raw.trim(), " ");
    let mut term = collapsed
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim_end_matches(|c: char| matches!(c, '?' | '!' | '.' | ',' | ';' | ':'))
        .trim()
        .to_string();
    for article in ["the term ", "the ", "a ", "an "] {
        if term.len() > article.len() && term.to_lowercase().starts_with(article) {
            term = term[article.len()..].trim_start().to_string();
            break;
        }
    }
    term.trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .to_string()
}

/// True when a captured term does not actually name anything.
pub fn is_subject_missing(term: &str) -> bool {
    let lower = term.trim().to_lowercase();
    lower.is_empty() || SUBJECTLESS.contains(&lower.as_str())
}

/// Full name for a known abbreviation, e.g. "CAC" -> "Customer Acquisition Cost".
pub fn expand_abbreviation(term: &str) -> Option<&'static str> {
    let lower = term.trim().to_lowercase();
    ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| *abbr == lower)
        .map(|(_, full)| *full)
}

/// The name to send to the catalog for a user-supplied term.
pub fn lookup_key(term: &str) -> String {
    expand_abbreviation(term)
        .map(str::to_string)
        .unwrap_or_else(|| term.to_string())
}

/// Chart type explicitly named in the utterance, if any.
pub fn chart_type_hint(utterance: &str) -> Option<ChartType> {
    CHART_HINTS
        .iter()
        .find(|(re, _)| re.is_match(utterance))
        .map(|(_, chart_type)| *chart_type)
}

/// Grouping field from a "by ..." phrase, as the user wrote it.
pub fn category_field(utterance: &str) -> Option<String> {
    GROUP_BY_RE
        .captures(utterance)
        .and_then(|caps| caps.name("field"))
        .map(|m| clean_term(m.as_str()).to_lowercase())
        .filter(|f| !f.is_empty())
}

/// Remove a trailing "by ..." clause captured along with a chart term.
pub fn strip_group_clause(term: &str) -> String {
    clean_term(&TRAILING_BY_RE.replace(term, ""))
}

fn keywords(text: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.len() >= 3 && !STOP_WORDS.contains(&w.as_str()))
    {
        if let Some(full) = expand_abbreviation(&word) {
            for part in full.split_whitespace().map(str::to_lowercase) {
                if !words.contains(&part) {
                    words.push(part);
                }
            }
        }
        if !words.contains(&word) {
            words.push(word);
        }
    }
    words
}

/// Known term names ranked by keyword overlap with the utterance.
///
/// A keyword counts when it appears inside the lowercased name. Ties are
/// broken alphabetically; names with no overlap are dropped.
pub fn closest_terms(utterance: &str, names: &[String], limit: usize) -> Vec<String> {
    let words = keywords(utterance);
    if words.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, &String)> = names
        .iter()
        .map(|name| {
            let lower = name.to_lowercase();
            let score = words.iter().filter(|w| lower.contains(w.as_str())).count();
            (score, name)
        })
        .filter(|(score, _)| *score > 0)
        .collect();

    scored.sort_by(|(sa, na), (sb, nb)| sb.cmp(sa).then_with(|| na.cmp(nb)));

    let mut out: Vec<String> = Vec::new();
    for (_, name) in scored {
        if out.len() >= limit {
            break;
        }
        if !out.contains(name) {
            out.push(name.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    // ---- clean_term ----

    #[test]
    fn test_clean_term_trims_punctuation_and_whitespace() {
        assert_eq!(clean_term("  Annual   Revenue ?"), "Annual Revenue");
        assert_eq!(clean_term("Customer Acquisition Cost."), "Customer Acquisition Cost");
    }

    #[test]
    fn test_clean_term_strips_quotes_and_article() {
        assert_eq!(clean_term("\"Annual Revenue\""), "Annual Revenue");
        assert_eq!(clean_term("the term 'CAC'"), "CAC");
        assert_eq!(clean_term("the Net Collection Rate"), "Net Collection Rate");
    }

    #[test]
    fn test_clean_term_preserves_case() {
        assert_eq!(clean_term("customer LIFETIME value"), "customer LIFETIME value");
    }

    #[test]
    fn test_clean_term_keeps_lone_article_word() {
        // "the" alone is not stripped to an empty string
        assert_eq!(clean_term("the"), "the");
    }

    // ---- subjects ----

    #[test]
    fn test_subject_missing() {
        assert!(is_subject_missing(""));
        assert!(is_subject_missing("that"));
        assert!(is_subject_missing("This Term"));
        assert!(is_subject_missing("assets"));
        assert!(!is_subject_missing("Annual Revenue"));
        assert!(!is_subject_missing("marketing"));
    }

    // ---- abbreviations ----

    #[test]
    fn test_expand_abbreviation_case_insensitive() {
        assert_eq!(expand_abbreviation("CAC"), Some("Customer Acquisition Cost"));
        assert_eq!(expand_abbreviation(" roi "), Some("Return On Investment"));
        assert_eq!(expand_abbreviation("ARR"), None);
    }

    #[test]
    fn test_lookup_key() {
        assert_eq!(lookup_key("ltv"), "Lifetime Value");
        assert_eq!(lookup_key("Annual Revenue"), "Annual Revenue");
    }

    // ---- chart hints ----

    #[test]
    fn test_chart_type_hint_keywords() {
        assert_eq!(chart_type_hint("bar chart by owner"), Some(ChartType::Bar));
        assert_eq!(chart_type_hint("show a pie of CAC assets"), Some(ChartType::Pie));
        assert_eq!(chart_type_hint("plot the trend over time"), Some(ChartType::Line));
        assert_eq!(chart_type_hint("scatter plot"), Some(ChartType::Scatter));
        assert_eq!(chart_type_hint("distribution of sizes"), Some(ChartType::Histogram));
        assert_eq!(chart_type_hint("box plot please"), Some(ChartType::Box));
        assert_eq!(chart_type_hint("chart assets by owner"), None);
    }

    #[test]
    fn test_chart_type_hint_needs_word_boundary() {
        assert_eq!(chart_type_hint("chart of barcode assets"), None);
    }

    // ---- category field ----

    #[test]
    fn test_category_field_stops_at_of() {
        assert_eq!(
            category_field("bar chart by connector type of assets that use Annual Revenue"),
            Some("connector type".to_string())
        );
    }

    #[test]
    fn test_category_field_at_end() {
        assert_eq!(
            category_field("chart assets using CAC by Owner?"),
            Some("owner".to_string())
        );
        assert_eq!(category_field("chart assets using CAC"), None);
    }

    #[test]
    fn test_strip_group_clause() {
        assert_eq!(strip_group_clause("CAC by owner"), "CAC");
        assert_eq!(strip_group_clause("Annual Revenue"), "Annual Revenue");
    }

    // ---- keyword overlap ----

    #[test]
    fn test_closest_terms_ranks_by_overlap() {
        let known = names(&["Annual Revenue", "Revenue Growth Rate", "Customer Acquisition Cost"]);
        let out = closest_terms("annual revenue numbers", &known, 5);
        assert_eq!(out, vec!["Annual Revenue", "Revenue Growth Rate"]);
    }

    #[test]
    fn test_closest_terms_expands_abbreviations() {
        let known = names(&["Annual Revenue", "Customer Acquisition Cost"]);
        assert_eq!(closest_terms("cac numbers", &known, 5), vec!["Customer Acquisition Cost"]);
    }

    #[test]
    fn test_closest_terms_gibberish_is_empty() {
        let known = names(&["Annual Revenue", "Customer Acquisition Cost"]);
        assert!(closest_terms("asdfasdf", &known, 5).is_empty());
    }

    #[test]
    fn test_closest_terms_respects_limit_and_dedupes() {
        let known = names(&["Cost A", "Cost B", "Cost A", "Cost C"]);
        let out = closest_terms("cost", &known, 2);
        assert_eq!(out, vec!["Cost A", "Cost B"]);
    }

    #[test]
    fn test_closest_terms_zero_limit_is_empty() {
        let known = names(&["Cost A", "Cost B"]);
        assert!(closest_terms("cost", &known, 0).is_empty());
    }

    #[test]
    fn test_closest_terms_ignores_stop_words() {
        let known = names(&["The Whole Thing"]);
        assert!(closest_terms("what is the", &known, 5).is_empty());
    }
}
