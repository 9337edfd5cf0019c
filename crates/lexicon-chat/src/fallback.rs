//! Built-in sample glossary and asset set.
//!
//! Substituted whenever a live catalog call fails so every handler still
//! has something to render. The asset list is the fixed 40-asset CAC demo
//! set; every sample accessor returns at least one record.

use lexicon_core::types::{AssetRecord, TermRecord};

use crate::extract::lookup_key;

static SAMPLE_ASSETS: &[(&str, &str, &str)] = &[
    ("Customer acquisition cost (simple)", "Query", "snowflake"),
    (
        "main/food_beverage/all_order_products_user → main/food_beverage/beverages_order_time",
        "Process",
        "databricks",
    ),
    ("instacart_orders", "Table", "redshift"),
    ("INSTACART_ORDER_PRODUCTS_MASTER", "Table", "postgres"),
    ("department", "Column", "snowflake"),
    ("Account ID", "SalesforceField", "salesforce"),
    ("fact_order_products_users_time_master_csv", "Table", "athena"),
    ("Customers", "Table", "mssql"),
    ("Customers", "Table", "mssql"),
    ("Customer Acquisition Costs (complex DB)", "Query", "databricks"),
    ("Page 1", "SigmaPage", "sigma"),
    ("STG_SUPPLIERS", "Table", "snowflake"),
    ("CUSTOMERS", "Table", "snowflake"),
    ("DIM_STOCK_ITEMS", "Table", "snowflake"),
    ("Loan_Banking_Demo", "SigmaWorkbook", "sigma"),
    ("Loan Summary by Type", "SigmaDataElement", "sigma"),
    ("instacart_beverages_order_customer", "DbtModel", "dbt"),
    ("Demo App - Beginner's tutorial", "QlikApp", "qlik-sense"),
    ("Bidding Proposal", "File", ""),
    ("WWI Orders Management", "ThoughtspotLiveboard", "thoughtspot"),
    ("CPD - MicroChart", "MicroStrategyReport", "microstrategy"),
    ("CUSTOMERS", "Table", "snowflake"),
    ("Demo Validation DEV", "QlikApp", "qlik-sense"),
    ("INSTACART_ORDER_PRODUCTS_MASTER", "Table", "teradata"),
    ("WWI Sales Analytics", "LookerDashboard", "looker"),
    ("fact_orders", "DbtModel", "dbt"),
    ("WWI Order Analysis", "QuickSightAnalysis", "quicksight"),
    ("CUSTOMERS", "Table", "snowflake"),
    ("dim_customer", "DbtModel", "dbt"),
    ("Wide World Importers", "PowerBIReport", "powerbi"),
    ("SalesPersonId", "Column", "databricks"),
    ("CUSTOMERS", "Table", "snowflake"),
    ("Finance Master", "DataProduct", ""),
    ("Advertising Expenses", "TableauDatasource", "tableau"),
    ("Food & Beverage Order Analysis", "TableauDashboard", "tableau"),
    ("Sales Analytics", "TableauDashboard", "tableau"),
    ("Fund Overview", "TableauDashboard", "tableau"),
    ("Instacart Analysis", "TableauDashboard", "tableau"),
    ("CAC", "TableauCalculatedField", "tableau"),
    ("C360", "DataProduct", ""),
];

/// All sample glossary terms, sorted by name.
pub fn terms() -> Vec<TermRecord> {
    vec![
        TermRecord {
            id: "revenue-guid".to_string(),
            name: "Annual Revenue".to_string(),
            description: "Total revenue generated by the company in a fiscal year, including all product sales and services.".to_string(),
            category: "Finance".to_string(),
            owners: vec!["finance.team".to_string()],
            certificate_status: Some("VERIFIED".to_string()),
            abbreviation: None,
            examples: vec!["Sum of all invoiced amounts from January 1st to December 31st".to_string()],
            qualified_name: Some("glossary/annual_revenue".to_string()),
            popularity_score: None,
            starred_count: None,
        },
        TermRecord {
            id: "cac-guid".to_string(),
            name: "Customer Acquisition Cost".to_string(),
            description: "The cost associated with acquiring a new customer, including marketing, sales, and onboarding expenses.".to_string(),
            category: "Marketing".to_string(),
            owners: vec!["marketing.team".to_string()],
            certificate_status: Some("VERIFIED".to_string()),
            abbreviation: Some("CAC".to_string()),
            examples: vec!["If you spend $100 on marketing and acquire 10 customers, your CAC is $10.".to_string()],
            qualified_name: Some("glossary/customer_acquisition_cost".to_string()),
            popularity_score: None,
            starred_count: None,
        },
        TermRecord {
            id: "clv-guid".to_string(),
            name: "Customer Lifetime Value".to_string(),
            description: "The total revenue a business can expect from a single customer account throughout their relationship. CLV helps in making informed decisions about customer acquisition and retention strategies.".to_string(),
            category: "Marketing".to_string(),
            owners: vec!["analytics.team".to_string(), "analytics".to_string()],
            certificate_status: Some("DRAFT".to_string()),
            abbreviation: Some("CLV".to_string()),
            examples: Vec::new(),
            qualified_name: Some("glossary/customer_lifetime_value".to_string()),
            popularity_score: None,
            starred_count: None,
        },
    ]
}

/// Whether a sample term answers to `name` by name or abbreviation.
pub fn matches_term(term: &TermRecord, name: &str) -> bool {
    let key = lookup_key(name).to_lowercase();
    let wanted = name.trim().to_lowercase();
    term.name.to_lowercase() == key
        || term
            .abbreviation
            .as_deref()
            .is_some_and(|a| a.to_lowercase() == wanted)
}

/// Sample terms matching `name`, or the whole sample glossary when none do.
pub fn terms_for(name: &str) -> Vec<TermRecord> {
    let all = terms();
    let matched: Vec<TermRecord> = all
        .iter()
        .filter(|t| matches_term(t, name))
        .cloned()
        .collect();
    if matched.is_empty() {
        all
    } else {
        matched
    }
}

/// The sample asset set.
pub fn assets() -> Vec<AssetRecord> {
    SAMPLE_ASSETS
        .iter()
        .enumerate()
        .map(|(i, (name, asset_type, connector))| AssetRecord {
            id: format!("mock_guid_{}", i),
            name: name.to_string(),
            asset_type: asset_type.to_string(),
            connector: connector.to_string(),
            owners: Vec::new(),
            popularity_score: None,
        })
        .collect()
}

/// Names of every sample term, for clarification candidates.
pub fn term_names() -> Vec<String> {
    terms().into_iter().map(|t| t.name).collect()
}
