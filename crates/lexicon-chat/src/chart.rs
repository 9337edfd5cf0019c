//! Chart planning: chart type selection and asset grouping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use lexicon_core::types::{AssetRecord, ChartRequest, ChartType};

/// Asset attribute a chart groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupDimension {
    Connector,
    AssetType,
    Owner,
}

impl GroupDimension {
    /// Map a user-phrased field ("connector type", "owner", "type") to a dimension.
    pub fn from_field(field: &str) -> Self {
        let lower = field.to_lowercase();
        if ["connector", "source", "connection"]
            .iter()
            .any(|k| lower.contains(k))
        {
            GroupDimension::Connector
        } else if lower.contains("owner") {
            GroupDimension::Owner
        } else if lower.contains("type") {
            GroupDimension::AssetType
        } else {
            GroupDimension::Connector
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GroupDimension::Connector => "Connector",
            GroupDimension::AssetType => "Asset Type",
            GroupDimension::Owner => "Owner",
        }
    }
}

/// Shape of the data being charted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataShape {
    TimeSeries,
    CategoryCounts,
    Proportion,
    Correlation,
    Distribution,
}

/// Pick a chart type. An explicit hint always wins.
pub fn select_chart_type(hint: Option<ChartType>, shape: DataShape) -> ChartType {
    if let Some(chart_type) = hint {
        return chart_type;
    }
    match shape {
        DataShape::TimeSeries => ChartType::Line,
        DataShape::CategoryCounts => ChartType::Bar,
        DataShape::Proportion => ChartType::Pie,
        DataShape::Correlation => ChartType::Scatter,
        DataShape::Distribution => ChartType::Histogram,
    }
}

/// One bar, slice, or bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRow {
    pub label: String,
    pub value: usize,
    /// Share of the total asset count, rounded to one decimal.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub chart_type: ChartType,
    pub category_field: String,
    pub value_field: String,
    /// Number of assets charted.
    pub total: usize,
    pub rows: Vec<ChartRow>,
}

/// Group assets for a chart request.
///
/// Rows are ordered by count descending, then label. An asset with several
/// owners counts once per owner, so owner rows may sum past `total`.
pub fn build_chart(request: &ChartRequest, assets: &[AssetRecord]) -> ChartSpec {
    let dimension = GroupDimension::from_field(&request.category_field);
    let mut counts: HashMap<String, usize> = HashMap::new();

    for asset in assets {
        match dimension {
            GroupDimension::Connector => {
                *counts.entry(label_or(&asset.connector, "Unknown")).or_default() += 1;
            }
            GroupDimension::AssetType => {
                *counts.entry(label_or(&asset.asset_type, "Unknown")).or_default() += 1;
            }
            GroupDimension::Owner => {
                if asset.owners.is_empty() {
                    *counts.entry("No Owner".to_string()).or_default() += 1;
                }
                for owner in &asset.owners {
                    *counts.entry(label_or(owner, "No Owner")).or_default() += 1;
                }
            }
        }
    }

    let total = assets.len();
    let mut rows: Vec<ChartRow> = counts
        .into_iter()
        .map(|(label, value)| ChartRow {
            label,
            value,
            percentage: percentage(value, total),
        })
        .collect();
    rows.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.label.cmp(&b.label)));

    ChartSpec {
        chart_type: select_chart_type(request.chart_type, DataShape::CategoryCounts),
        category_field: request.category_field.clone(),
        value_field: "asset count".to_string(),
        total,
        rows,
    }
}

fn label_or(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

fn percentage(value: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (value as f64 * 1000.0 / total as f64).round() / 10.0
}
