//! Free-form financials search. The caller supplies a list of criteria that
//! are composed into one predicate. Feature names and operators must match
//! the allow-lists below and values are bound as parameters; no caller input
//! is ever spliced into the statement text.

use crate::error::ApiError;
use crate::sql;
use actix_web::{post, web, HttpResponse};
use deadpool_postgres::Pool;
use serde::{Deserialize, Serialize};
use tokio_postgres::types::ToSql;

/// The searchable financials columns.
const FEATURES: &[&str] = &[
    "cik",
    "year",
    "month",
    "accounts_payable_current",
    "assets",
    "liabilities",
    "cash_and_equivalents",
    "accounts_receivable_current",
    "inventory_net",
    "long_term_debt",
];

const OPERATORS: &[&str] = &["=", "!=", "<", "<=", ">", ">="];

const RESULT_CAP: usize = 50;

#[derive(Debug, Deserialize)]
pub struct SearchCriterion {
    feature: String,
    operator: String,
    value: String,
    /// Connector to the preceding criterion; ignored on the first one.
    #[serde(rename = "logicalOperator", default)]
    logical_operator: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    criteria: Vec<SearchCriterion>,
}

#[derive(Serialize)]
pub struct FinancialRow {
    cik: i32,
    year: i32,
    month: i32,
    accounts_payable_current: Option<f64>,
    assets: Option<f64>,
    liabilities: Option<f64>,
    cash_and_equivalents: Option<f64>,
    accounts_receivable_current: Option<f64>,
    inventory_net: Option<f64>,
    long_term_debt: Option<f64>,
}

/// Compose the WHERE clause. Returns the clause text (placeholders only) and
/// the parameter list, or a validation error for anything off-list.
fn build_predicate(criteria: &[SearchCriterion]) -> Result<(String, Vec<f64>), ApiError> {
    if criteria.is_empty() {
        return Err(ApiError::Validation(
            "at least one search criterion is required".into(),
        ));
    }

    let mut clause = String::new();
    let mut params = Vec::with_capacity(criteria.len());
    for (i, criterion) in criteria.iter().enumerate() {
        if !FEATURES.contains(&criterion.feature.as_str()) {
            return Err(ApiError::Validation(format!(
                "unknown feature '{}'",
                criterion.feature
            )));
        }
        if !OPERATORS.contains(&criterion.operator.as_str()) {
            return Err(ApiError::Validation(format!(
                "unsupported operator '{}'",
                criterion.operator
            )));
        }
        let value: f64 = criterion.value.parse().map_err(|_| {
            ApiError::Validation(format!("value '{}' is not numeric", criterion.value))
        })?;

        if i > 0 {
            let connector = match criterion.logical_operator.to_ascii_uppercase().as_str() {
                "AND" => "AND",
                "OR" => "OR",
                other => {
                    return Err(ApiError::Validation(format!(
                        "unsupported connector '{other}'"
                    )))
                }
            };
            clause.push(' ');
            clause.push_str(connector);
            clause.push(' ');
        }
        clause.push_str(&format!(
            "{} {} ${}",
            criterion.feature,
            criterion.operator,
            i + 1
        ));
        params.push(value);
    }

    Ok((clause, params))
}

/// Filtered rows from the financials table, capped at 50. An empty match is
/// an empty list, not an error.
#[post("/api/search")]
pub async fn search(
    db_pool: web::Data<Pool>,
    body: web::Json<SearchRequest>,
) -> Result<HttpResponse, ApiError> {
    let (clause, params) = build_predicate(&body.criteria)?;
    let statement = format!(
        "{} WHERE {clause} LIMIT {RESULT_CAP}",
        sql::SEARCH_FINANCIALS
    );
    let values: Vec<&(dyn ToSql + Sync)> =
        params.iter().map(|v| v as &(dyn ToSql + Sync)).collect();

    let conn = db_pool.get().await?;
    let rows = conn
        .query(statement.as_str(), &values)
        .await
        .map_err(ApiError::from_query)?;

    let data: Vec<FinancialRow> = rows
        .iter()
        .map(|row| FinancialRow {
            cik: row.get("cik"),
            year: row.get("year"),
            month: row.get("month"),
            accounts_payable_current: row.get("accounts_payable_current"),
            assets: row.get("assets"),
            liabilities: row.get("liabilities"),
            cash_and_equivalents: row.get("cash_and_equivalents"),
            accounts_receivable_current: row.get("accounts_receivable_current"),
            inventory_net: row.get("inventory_net"),
            long_term_debt: row.get("long_term_debt"),
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criterion(feature: &str, operator: &str, value: &str, connector: &str) -> SearchCriterion {
        SearchCriterion {
            feature: feature.into(),
            operator: operator.into(),
            value: value.into(),
            logical_operator: connector.into(),
        }
    }

    #[test]
    fn composes_placeholders_in_criterion_order() {
        let (clause, params) = build_predicate(&[
            criterion("assets", ">", "1000000", ""),
            criterion("liabilities", "<=", "500000", "AND"),
            criterion("cash_and_equivalents", ">=", "250000", "or"),
        ])
        .unwrap();
        assert_eq!(
            clause,
            "assets > $1 AND liabilities <= $2 OR cash_and_equivalents >= $3"
        );
        assert_eq!(params, vec![1000000.0, 500000.0, 250000.0]);
    }

    #[test]
    fn first_criterion_ignores_its_connector() {
        let (clause, _) = build_predicate(&[criterion("year", "=", "2020", "nonsense")]).unwrap();
        assert_eq!(clause, "year = $1");
    }

    #[test]
    fn rejects_features_off_the_allow_list() {
        let result = build_predicate(&[criterion(
            "assets; DROP TABLE financials; --",
            "=",
            "1",
            "",
        )]);
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[test]
    fn rejects_unsupported_operators() {
        let result = build_predicate(&[criterion("assets", "LIKE", "1", "")]);
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[test]
    fn rejects_unknown_connectors() {
        let result = build_predicate(&[
            criterion("assets", ">", "1", ""),
            criterion("liabilities", "<", "2", "XOR"),
        ]);
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[test]
    fn rejects_non_numeric_values() {
        let result = build_predicate(&[criterion("assets", ">", "'1' OR '1'='1'", "")]);
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[test]
    fn rejects_an_empty_criteria_list() {
        assert!(matches!(
            build_predicate(&[]),
            Err(ApiError::Validation(_))
        ));
    }
}
