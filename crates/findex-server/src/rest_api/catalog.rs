//! The fixed catalog of analytical read queries. Every endpoint is
//! unauthenticated, takes no body, answers 404 when the result set is empty,
//! and 500 when the store fails mid-query. The SQL lives in [`crate::sql`].

use crate::error::ApiError;
use crate::sql;
use actix_web::{get, web, HttpResponse};
use deadpool_postgres::Pool;
use serde::{Deserialize, Serialize};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// List of all listed companies with price data
///
/// ```json
/// [
///     {
///         "cik": 320193,
///         "ticker": "AAPL",
///         "companyname": "Apple Inc."
///     },
///     ...
/// ]
/// ```
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
pub struct Stock {
    cik: i32,
    ticker: String,
    companyname: String,
}

#[utoipa::path(
    get,
    path = "/api/stocks",
    responses(
        (
            status = 200,
            description = "Every company in the dataset that has stock price history",
            body = [Stock],
            content_type = "application/json",
            example = json!([
                {
                    "cik": 320193,
                    "ticker": "AAPL",
                    "companyname": "Apple Inc."
                }
            ])
        )
    )
)]
#[get("/api/stocks")]
pub async fn stocks(db_pool: web::Data<Pool>) -> Result<HttpResponse, ApiError> {
    let conn = db_pool.get().await?;
    let rows = conn
        .query(sql::LIST_STOCKS, &[])
        .await
        .map_err(ApiError::from_query)?;
    if rows.is_empty() {
        return Err(ApiError::NotFound);
    }

    let data: Vec<Stock> = rows
        .iter()
        .map(|row| Stock {
            cik: row.get("cik"),
            ticker: row.get("ticker"),
            companyname: row.get("companyname"),
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// One row of the average-close ranking: per-ticker price extremes alongside
/// the average close the ranking runs on.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
pub struct TopStock {
    ticker: String,
    cik: i32,
    companyname: String,
    highest_price: f64,
    lowest_price: f64,
    avg_close: f64,
}

#[utoipa::path(
    get,
    path = "/api/stocks/top_stocks",
    responses(
        (
            status = 200,
            description = "Top 10 tickers by average closing price",
            body = [TopStock],
            content_type = "application/json"
        )
    )
)]
#[get("/api/stocks/top_stocks")]
pub async fn top_stocks(db_pool: web::Data<Pool>) -> Result<HttpResponse, ApiError> {
    let conn = db_pool.get().await?;
    let rows = conn
        .query(sql::TOP_STOCKS, &[])
        .await
        .map_err(ApiError::from_query)?;
    if rows.is_empty() {
        return Err(ApiError::NotFound);
    }

    let data: Vec<TopStock> = rows
        .iter()
        .map(|row| TopStock {
            ticker: row.get("ticker"),
            cik: row.get("cik"),
            companyname: row.get("companyname"),
            highest_price: row.get("highest_price"),
            lowest_price: row.get("lowest_price"),
            avg_close: row.get("avg_close"),
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize)]
pub struct HighCashReserves {
    cik: i32,
    companyname: String,
    assets: Option<f64>,
    liabilities: f64,
    cash_and_equivalents: f64,
    rolling_avg_cash: f64,
}

/// Companies whose cash exceeds half their liabilities, with a trailing
/// 4-period rolling average of cash.
#[get("/api/companies/high_cash_reserves")]
pub async fn high_cash_reserves(db_pool: web::Data<Pool>) -> Result<HttpResponse, ApiError> {
    let conn = db_pool.get().await?;
    let rows = conn
        .query(sql::HIGH_CASH_RESERVES, &[])
        .await
        .map_err(ApiError::from_query)?;
    if rows.is_empty() {
        return Err(ApiError::NotFound);
    }

    let data: Vec<HighCashReserves> = rows
        .iter()
        .map(|row| HighCashReserves {
            cik: row.get("cik"),
            companyname: row.get("companyname"),
            assets: row.get("assets"),
            liabilities: row.get("liabilities"),
            cash_and_equivalents: row.get("cash_and_equivalents"),
            rolling_avg_cash: row.get("rolling_avg_cash"),
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize)]
pub struct DebtToAssetRatio {
    cik: i32,
    companyname: String,
    ticker: String,
    debt_to_asset_ratio: f64,
    avg_volatility: f64,
}

/// Leverage against price volatility, most volatile tickers first.
#[get("/api/companies/debt_to_asset_ratio")]
pub async fn debt_to_asset_ratio(db_pool: web::Data<Pool>) -> Result<HttpResponse, ApiError> {
    let conn = db_pool.get().await?;
    let rows = conn
        .query(sql::DEBT_TO_ASSET_RATIO, &[])
        .await
        .map_err(ApiError::from_query)?;
    if rows.is_empty() {
        return Err(ApiError::NotFound);
    }

    let data: Vec<DebtToAssetRatio> = rows
        .iter()
        .map(|row| DebtToAssetRatio {
            cik: row.get("cik"),
            companyname: row.get("companyname"),
            ticker: row.get("ticker"),
            debt_to_asset_ratio: row.get("debt_to_asset_ratio"),
            avg_volatility: row.get("avg_volatility"),
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize)]
pub struct HighCashMinimalDebt {
    cik: i32,
    companyname: String,
    ticker: String,
    cash_and_equivalents: f64,
    long_term_debt: f64,
    max_close_price: f64,
}

/// Cash-rich, low-debt companies with their all-time-high close.
#[get("/api/companies/high_cash_minimal_debt")]
pub async fn high_cash_minimal_debt(db_pool: web::Data<Pool>) -> Result<HttpResponse, ApiError> {
    let conn = db_pool.get().await?;
    let rows = conn
        .query(sql::HIGH_CASH_MINIMAL_DEBT, &[])
        .await
        .map_err(ApiError::from_query)?;
    if rows.is_empty() {
        return Err(ApiError::NotFound);
    }

    let data: Vec<HighCashMinimalDebt> = rows
        .iter()
        .map(|row| HighCashMinimalDebt {
            cik: row.get("cik"),
            companyname: row.get("companyname"),
            ticker: row.get("ticker"),
            cash_and_equivalents: row.get("cash_and_equivalents"),
            long_term_debt: row.get("long_term_debt"),
            max_close_price: row.get("max_close_price"),
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize)]
pub struct MonthlyAvgClose {
    ticker: String,
    month: chrono::NaiveDate,
    monthly_avg_close: f64,
}

/// Top-10 ranked month-level average closes. RANK (not dense-rank) breaks the
/// ties, so a cutoff landing mid-tie returns every tied row.
#[get("/api/stocks/monthly_avg_close")]
pub async fn monthly_avg_close(db_pool: web::Data<Pool>) -> Result<HttpResponse, ApiError> {
    let conn = db_pool.get().await?;
    let rows = conn
        .query(sql::MONTHLY_AVG_CLOSE, &[])
        .await
        .map_err(ApiError::from_query)?;
    if rows.is_empty() {
        return Err(ApiError::NotFound);
    }

    let data: Vec<MonthlyAvgClose> = rows
        .iter()
        .map(|row| MonthlyAvgClose {
            ticker: row.get("ticker"),
            month: row.get("month"),
            monthly_avg_close: row.get("monthly_avg_close"),
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize)]
pub struct Fluctuation {
    #[serde(rename = "Ticker")]
    ticker: String,
    #[serde(rename = "CompanyName")]
    companyname: String,
    #[serde(rename = "CIK")]
    cik: i32,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Month")]
    month: i32,
    #[serde(rename = "AverageMonthlyVolatility")]
    avg_monthly_volatility: f64,
}

/// The ten most volatile (ticker, month) pairs among high-volume weeks.
#[get("/api/stocks/highest-fluctuations")]
pub async fn highest_fluctuations(db_pool: web::Data<Pool>) -> Result<HttpResponse, ApiError> {
    let conn = db_pool.get().await?;
    let rows = conn
        .query(sql::HIGHEST_FLUCTUATIONS, &[])
        .await
        .map_err(ApiError::from_query)?;
    if rows.is_empty() {
        return Err(ApiError::NotFound);
    }

    let data: Vec<Fluctuation> = rows
        .iter()
        .map(|row| Fluctuation {
            ticker: row.get("ticker"),
            companyname: row.get("companyname"),
            cik: row.get("cik"),
            year: row.get("year"),
            month: row.get("month"),
            avg_monthly_volatility: row.get("avg_monthly_volatility"),
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize)]
pub struct LiquidityDebtRatio {
    #[serde(rename = "CompanyName")]
    companyname: String,
    #[serde(rename = "CIK")]
    cik: i32,
    #[serde(rename = "CashAndEquivalents")]
    cash_and_equivalents: f64,
    #[serde(rename = "LongTermDebt")]
    long_term_debt: f64,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "Quarter")]
    quarter: Option<i32>,
    #[serde(rename = "CashToDebtRatio")]
    cash_to_debt_ratio: f64,
}

/// Highest cash-to-debt ratios; a company with zero long-term debt reports
/// the -1 sentinel instead of a division result.
#[get("/api/stocks/highest-liquidity-debt-ratio")]
pub async fn highest_liquidity_debt_ratio(
    db_pool: web::Data<Pool>,
) -> Result<HttpResponse, ApiError> {
    let conn = db_pool.get().await?;
    let rows = conn
        .query(sql::LIQUIDITY_DEBT_RATIO, &[])
        .await
        .map_err(ApiError::from_query)?;
    if rows.is_empty() {
        return Err(ApiError::NotFound);
    }

    let data: Vec<LiquidityDebtRatio> = rows
        .iter()
        .map(|row| LiquidityDebtRatio {
            companyname: row.get("companyname"),
            cik: row.get("cik"),
            cash_and_equivalents: row.get("cash_and_equivalents"),
            long_term_debt: row.get("long_term_debt"),
            year: row.get("year"),
            quarter: row.get("quarter"),
            cash_to_debt_ratio: row.get("cash_to_debt_ratio"),
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize)]
pub struct LeverageDifference {
    #[serde(rename = "Company1CIK")]
    company1_cik: i32,
    #[serde(rename = "Company1Name")]
    company1_name: String,
    #[serde(rename = "Company2CIK")]
    company2_cik: i32,
    #[serde(rename = "Company2Name")]
    company2_name: String,
    #[serde(rename = "Company1Ratio")]
    company1_ratio: f64,
    #[serde(rename = "Company2Ratio")]
    company2_ratio: f64,
    #[serde(rename = "RatioDifference")]
    ratio_difference: f64,
}

/// Company pairs with the widest debt-to-asset gap.
#[get("/api/stock/greatest-leverage-differences")]
pub async fn greatest_leverage_differences(
    db_pool: web::Data<Pool>,
) -> Result<HttpResponse, ApiError> {
    let conn = db_pool.get().await?;
    let rows = conn
        .query(sql::GREATEST_LEVERAGE_DIFFERENCES, &[])
        .await
        .map_err(ApiError::from_query)?;
    if rows.is_empty() {
        return Err(ApiError::NotFound);
    }

    let data: Vec<LeverageDifference> = rows
        .iter()
        .map(|row| LeverageDifference {
            company1_cik: row.get("company1_cik"),
            company1_name: row.get("company1_name"),
            company2_cik: row.get("company2_cik"),
            company2_name: row.get("company2_name"),
            company1_ratio: row.get("company1_ratio"),
            company2_ratio: row.get("company2_ratio"),
            ratio_difference: row.get("ratio_difference"),
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize)]
pub struct SimilarDebtRatio {
    #[serde(rename = "Company1CIK")]
    company1_cik: i32,
    #[serde(rename = "Company1Name")]
    company1_name: String,
    #[serde(rename = "Company2CIK")]
    company2_cik: i32,
    #[serde(rename = "Company2Name")]
    company2_name: String,
    #[serde(rename = "RatioDifference")]
    ratio_difference: f64,
}

/// Company pairs with near-identical leverage, bucketed to bound the
/// comparison; at most 10 best matches kept per anchor company.
#[get("/api/companies/similar_debt_ratios")]
pub async fn similar_debt_ratios(db_pool: web::Data<Pool>) -> Result<HttpResponse, ApiError> {
    let conn = db_pool.get().await?;
    let rows = conn
        .query(sql::SIMILAR_DEBT_RATIOS, &[])
        .await
        .map_err(ApiError::from_query)?;
    if rows.is_empty() {
        return Err(ApiError::NotFound);
    }

    let data: Vec<SimilarDebtRatio> = rows
        .iter()
        .map(|row| SimilarDebtRatio {
            company1_cik: row.get("company1_cik"),
            company1_name: row.get("company1_name"),
            company2_cik: row.get("company2_cik"),
            company2_name: row.get("company2_name"),
            ratio_difference: row.get("ratio_difference"),
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize)]
pub struct SimilarInventoryRatio {
    #[serde(rename = "Company1CIK")]
    company1_cik: i32,
    #[serde(rename = "Company1Name")]
    company1_name: String,
    #[serde(rename = "Company2CIK")]
    company2_cik: i32,
    #[serde(rename = "Company2Name")]
    company2_name: String,
    #[serde(rename = "RatioDifference")]
    ratio_difference: f64,
    #[serde(rename = "AvgCashToLiabilityRatio")]
    avg_cash_to_liability_ratio: f64,
    #[serde(rename = "AvgAssets")]
    avg_assets: f64,
    #[serde(rename = "AvgLiabilities")]
    avg_liabilities: f64,
}

/// Company pairs with near-identical inventory-to-asset ratios among firms
/// holding a liquidity floor.
#[get("/api/companies/similar_inventory_ratios")]
pub async fn similar_inventory_ratios(db_pool: web::Data<Pool>) -> Result<HttpResponse, ApiError> {
    let conn = db_pool.get().await?;
    let rows = conn
        .query(sql::SIMILAR_INVENTORY_RATIOS, &[])
        .await
        .map_err(ApiError::from_query)?;
    if rows.is_empty() {
        return Err(ApiError::NotFound);
    }

    let data: Vec<SimilarInventoryRatio> = rows
        .iter()
        .map(|row| SimilarInventoryRatio {
            company1_cik: row.get("company1_cik"),
            company1_name: row.get("company1_name"),
            company2_cik: row.get("company2_cik"),
            company2_name: row.get("company2_name"),
            ratio_difference: row.get("ratio_difference"),
            avg_cash_to_liability_ratio: row.get("avg_cash_to_liability_ratio"),
            avg_assets: row.get("avg_assets"),
            avg_liabilities: row.get("avg_liabilities"),
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize)]
pub struct StrongLiquidity {
    #[serde(rename = "CIK")]
    cik: i32,
    #[serde(rename = "CompanyName")]
    companyname: String,
    #[serde(rename = "CashAndEquivalents")]
    cash_and_equivalents: f64,
    #[serde(rename = "Liabilities")]
    liabilities: f64,
    #[serde(rename = "CashToLiabilityRatio")]
    cash_to_liability_ratio: f64,
}

/// Companies holding cash worth more than twice their liabilities.
#[get("/api/companies/strong_liquidity")]
pub async fn strong_liquidity(db_pool: web::Data<Pool>) -> Result<HttpResponse, ApiError> {
    let conn = db_pool.get().await?;
    let rows = conn
        .query(sql::STRONG_LIQUIDITY, &[])
        .await
        .map_err(ApiError::from_query)?;
    if rows.is_empty() {
        return Err(ApiError::NotFound);
    }

    let data: Vec<StrongLiquidity> = rows
        .iter()
        .map(|row| StrongLiquidity {
            cik: row.get("cik"),
            companyname: row.get("companyname"),
            cash_and_equivalents: row.get("cash_and_equivalents"),
            liabilities: row.get("liabilities"),
            cash_to_liability_ratio: row.get("cash_to_liability_ratio"),
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Serialize)]
pub struct FinancialImprovement {
    #[serde(rename = "CIK")]
    cik: i32,
    #[serde(rename = "CompanyName")]
    companyname: String,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "CashAndEquivalents")]
    cash_and_equivalents: f64,
    #[serde(rename = "LongTermDebt")]
    long_term_debt: f64,
    #[serde(rename = "CashGrowthPercentage")]
    cash_growth_percentage: f64,
    #[serde(rename = "DebtReductionPercentage")]
    debt_reduction_percentage: f64,
    #[serde(rename = "ThreeYearAvgCash")]
    three_year_avg_cash: f64,
}

/// Companies that grew cash and cut long-term debt by more than 5% each
/// against the preceding filing.
#[get("/api/companies/financial_improvement")]
pub async fn financial_improvement(db_pool: web::Data<Pool>) -> Result<HttpResponse, ApiError> {
    let conn = db_pool.get().await?;
    let rows = conn
        .query(sql::FINANCIAL_IMPROVEMENT, &[])
        .await
        .map_err(ApiError::from_query)?;
    if rows.is_empty() {
        return Err(ApiError::NotFound);
    }

    let data: Vec<FinancialImprovement> = rows
        .iter()
        .map(|row| FinancialImprovement {
            cik: row.get("cik"),
            companyname: row.get("companyname"),
            year: row.get("year"),
            cash_and_equivalents: row.get("cash_and_equivalents"),
            long_term_debt: row.get("long_term_debt"),
            cash_growth_percentage: row.get("cash_growth_percentage"),
            debt_reduction_percentage: row.get("debt_reduction_percentage"),
            three_year_avg_cash: row.get("three_year_avg_cash"),
        })
        .collect();

    Ok(HttpResponse::Ok().json(data))
}
