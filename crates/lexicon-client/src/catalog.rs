//! Data-catalog client.
//!
//! Talks to an Atlan-style index-search endpoint
//! (`POST {base}/api/meta/search/indexsearch`) and maps the entity payloads
//! onto [`TermRecord`] and [`AssetRecord`]. Every operation issues exactly
//! one HTTP request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lexicon_core::config::CatalogConfig;
use lexicon_core::error::LexiconError;
use lexicon_core::types::{AssetRecord, TermRecord};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::CatalogError;

const SEARCH_PATH: &str = "/api/meta/search/indexsearch";
const TERM_SEARCH_SIZE: usize = 10;
const TERM_LIST_SIZE: usize = 100;

/// Attributes requested for every entity.
const ATTRIBUTES: &[&str] = &[
    "name",
    "displayName",
    "description",
    "userDescription",
    "longDescription",
    "qualifiedName",
    "certificateStatus",
    "ownerUsers",
    "ownerGroups",
    "assetTags",
    "termType",
    "anchor",
    "abbreviation",
    "examples",
    "popularityScore",
    "starredCount",
    "connectorName",
    "connectionName",
];

/// Operations the router needs from the catalog.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Look up a single glossary term by name. `NotFound` when nothing matches.
    async fn search_term(&self, name: &str) -> Result<TermRecord, CatalogError>;

    /// Assets linked to a term, keyed by term name or GUID.
    async fn find_assets_for_term(&self, term: &str) -> Result<Vec<AssetRecord>, CatalogError>;

    /// Every active glossary term, sorted by name.
    async fn list_all_terms(&self) -> Result<Vec<TermRecord>, CatalogError>;
}

/// Build the catalog collaborator for this process.
///
/// Without both a base URL and a token the catalog is treated as
/// unreachable and every call falls back.
pub fn build_catalog(config: &CatalogConfig) -> lexicon_core::Result<Arc<dyn CatalogClient>> {
    if config.is_configured() {
        Ok(Arc::new(HttpCatalogClient::new(config)?))
    } else {
        Ok(Arc::new(OfflineCatalog))
    }
}

/// Catalog that is never reachable.
pub struct OfflineCatalog;

#[async_trait]
impl CatalogClient for OfflineCatalog {
    async fn search_term(&self, _name: &str) -> Result<TermRecord, CatalogError> {
        Err(offline())
    }

    async fn find_assets_for_term(&self, _term: &str) -> Result<Vec<AssetRecord>, CatalogError> {
        Err(offline())
    }

    async fn list_all_terms(&self) -> Result<Vec<TermRecord>, CatalogError> {
        Err(offline())
    }
}

fn offline() -> CatalogError {
    CatalogError::ServiceUnavailable("catalog endpoint not configured".to_string())
}

// =============================================================================
// HTTP implementation
// =============================================================================

/// reqwest-backed catalog client.
pub struct HttpCatalogClient {
    client: reqwest::Client,
    search_url: String,
    api_token: String,
    asset_limit: usize,
}

impl HttpCatalogClient {
    pub fn new(config: &CatalogConfig) -> lexicon_core::Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| LexiconError::Http(e.to_string()))?;
        Ok(Self {
            client,
            search_url: format!("{}{}", config.base_url.trim_end_matches('/'), SEARCH_PATH),
            api_token: config.api_token.clone(),
            asset_limit: config.asset_limit,
        })
    }

    async fn search(&self, body: &Value, subject: &str) -> Result<Vec<Entity>, CatalogError> {
        let response = self
            .client
            .post(&self.search_url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if let Some(err) = status_error(status, subject) {
            return Err(err);
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::ServiceUnavailable(format!("malformed response: {}", e)))?;
        debug!(subject, entities = parsed.entities.len(), "Catalog search returned");
        Ok(parsed.entities)
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn search_term(&self, name: &str) -> Result<TermRecord, CatalogError> {
        let entities = self.search(&term_search_body(name), name).await?;
        let terms: Vec<TermRecord> = entities.into_iter().map(Entity::into_term).collect();
        rank_term_matches(name, terms)
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    async fn find_assets_for_term(&self, term: &str) -> Result<Vec<AssetRecord>, CatalogError> {
        let entities = self
            .search(&assets_for_term_body(term, self.asset_limit), term)
            .await?;
        let mut assets: Vec<AssetRecord> = entities.into_iter().map(Entity::into_asset).collect();
        assets.truncate(self.asset_limit);
        Ok(assets)
    }

    async fn list_all_terms(&self) -> Result<Vec<TermRecord>, CatalogError> {
        let entities = self.search(&list_terms_body(TERM_LIST_SIZE), "glossary").await?;
        let mut terms: Vec<TermRecord> = entities.into_iter().map(Entity::into_term).collect();
        terms.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(terms)
    }
}

/// Map a non-success status to the catalog error taxonomy.
fn status_error(status: StatusCode, subject: &str) -> Option<CatalogError> {
    if status.is_success() {
        return None;
    }
    Some(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            CatalogError::Unauthorized(format!("HTTP {}", status.as_u16()))
        }
        StatusCode::NOT_FOUND => CatalogError::NotFound(subject.to_string()),
        other => CatalogError::ServiceUnavailable(format!("HTTP {}", other.as_u16())),
    })
}

// =============================================================================
// Request bodies
// =============================================================================

fn active_glossary_filters() -> Value {
    json!([
        {"term": {"__state": "ACTIVE"}},
        {"term": {"__typeName.keyword": "AtlasGlossaryTerm"}}
    ])
}

fn term_search_body(name: &str) -> Value {
    json!({
        "dsl": {
            "query": {
                "bool": {
                    "must": active_glossary_filters(),
                    "should": [
                        {"term": {"name.keyword": name}},
                        {"term": {"displayName.keyword": name}},
                        {"match": {"name": {"query": name, "fuzziness": "AUTO"}}},
                        {"match": {"displayName": {"query": name, "fuzziness": "AUTO"}}},
                        {"wildcard": {"name": format!("*{}*", name)}}
                    ],
                    "minimum_should_match": 1
                }
            },
            "size": TERM_SEARCH_SIZE
        },
        "attributes": ATTRIBUTES
    })
}

fn assets_for_term_body(term: &str, limit: usize) -> Value {
    json!({
        "dsl": {
            "query": {
                "bool": {
                    "must": [{"term": {"__state": "ACTIVE"}}],
                    "should": [
                        {"term": {"__meaningNames": term}},
                        {"term": {"__meanings": term}}
                    ],
                    "minimum_should_match": 1
                }
            },
            "size": limit
        },
        "attributes": ATTRIBUTES
    })
}

fn list_terms_body(size: usize) -> Value {
    json!({
        "dsl": {
            "query": {"bool": {"must": active_glossary_filters()}},
            "size": size
        },
        "attributes": ATTRIBUTES
    })
}

// =============================================================================
// Result ranking
// =============================================================================

/// Order term hits the way a user expects: exact name first, then a match
/// ignoring a trailing "(ABBR)", then substring in either direction, then
/// the rest in catalog order.
pub fn rank_term_matches(query: &str, terms: Vec<TermRecord>) -> Vec<TermRecord> {
    let query = query.trim().to_lowercase();
    let rank = |term: &TermRecord| -> u8 {
        let name = term.name.to_lowercase();
        let bare = strip_parenthetical(&name);
        if name == query {
            0
        } else if bare == query {
            1
        } else if name.contains(&query) || query.contains(&name) {
            2
        } else {
            3
        }
    };
    let mut ranked: Vec<(u8, TermRecord)> = terms.into_iter().map(|t| (rank(&t), t)).collect();
    // Stable sort keeps catalog relevance order within a rank.
    ranked.sort_by_key(|(r, _)| *r);
    ranked.into_iter().map(|(_, t)| t).collect()
}

/// "Customer Acquisition Cost (CAC)" -> "Customer Acquisition Cost".
pub fn strip_parenthetical(name: &str) -> &str {
    match name.find(" (") {
        Some(idx) if name.trim_end().ends_with(')') => name[..idx].trim_end(),
        _ => name,
    }
}

// =============================================================================
// Response payloads
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    entities: Vec<Entity>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entity {
    #[serde(default)]
    guid: String,
    #[serde(default)]
    type_name: String,
    #[serde(default)]
    attributes: Attributes,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Attributes {
    name: Option<String>,
    display_name: Option<String>,
    description: Option<String>,
    user_description: Option<String>,
    long_description: Option<String>,
    qualified_name: Option<String>,
    certificate_status: Option<String>,
    owner_users: Option<Vec<Option<String>>>,
    owner_groups: Option<Vec<Option<String>>>,
    asset_tags: Option<Vec<Option<String>>>,
    term_type: Option<String>,
    anchor: Option<Value>,
    abbreviation: Option<String>,
    examples: Option<Vec<Option<String>>>,
    popularity_score: Option<f64>,
    starred_count: Option<u32>,
    connector_name: Option<String>,
    connection_name: Option<String>,
}

fn flatten(values: Option<Vec<Option<String>>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter(|v| !v.trim().is_empty())
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Entity {
    fn display_name(attrs: &Attributes) -> String {
        non_empty(attrs.display_name.clone())
            .or_else(|| non_empty(attrs.name.clone()))
            .unwrap_or_else(|| "Unknown".to_string())
    }

    fn into_term(self) -> TermRecord {
        let name = Self::display_name(&self.attributes);
        let a = self.attributes;
        let anchor_name = a.anchor.as_ref().and_then(|anchor| {
            anchor
                .get("displayText")
                .or_else(|| anchor.pointer("/attributes/name"))
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        let tags = flatten(a.asset_tags);
        let category = anchor_name
            .or_else(|| tags.first().cloned())
            .or_else(|| non_empty(a.term_type))
            .unwrap_or_default();
        let mut owners = flatten(a.owner_users);
        owners.extend(flatten(a.owner_groups));

        TermRecord {
            id: self.guid,
            name,
            description: non_empty(a.user_description)
                .or_else(|| non_empty(a.description))
                .or_else(|| non_empty(a.long_description))
                .unwrap_or_default(),
            category,
            owners,
            certificate_status: non_empty(a.certificate_status),
            abbreviation: non_empty(a.abbreviation),
            examples: flatten(a.examples),
            qualified_name: non_empty(a.qualified_name),
            popularity_score: a.popularity_score,
            starred_count: a.starred_count,
        }
    }

    fn into_asset(self) -> AssetRecord {
        let name = Self::display_name(&self.attributes);
        let a = self.attributes;
        let mut owners = flatten(a.owner_users);
        owners.extend(flatten(a.owner_groups));
        AssetRecord {
            id: self.guid,
            name,
            asset_type: self.type_name,
            connector: non_empty(a.connection_name)
                .or_else(|| non_empty(a.connector_name))
                .unwrap_or_default(),
            owners,
            popularity_score: a.popularity_score,
        }
    }
}
