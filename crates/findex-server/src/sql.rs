//! Every statement the server runs, kept in one place. User-path statements
//! are parameterized `$n`; money columns are cast to `float8` on the way out
//! so rows map onto plain `f64` fields.
//!
//! Null policy for the analytical catalog: ratio inputs are excluded with
//! explicit `IS NOT NULL` (and `> 0` for denominators) before any division.
//! The one exception is `LIQUIDITY_DEBT_RATIO`, which keeps its documented
//! `-1` sentinel for companies with zero long-term debt.

//////////////////////////////////////////////////////////////////
// users
//////////////////////////////////////////////////////////////////

/// `users` is keyed by a generated id; emails are unique across all accounts.
pub(crate) static INSERT_USER: &str = "
    INSERT INTO users (username, email, hashed_password, provider)
    VALUES ($1, $2, $3, $4)
    RETURNING id
";

pub(crate) static SELECT_USER_BY_EMAIL: &str = "
    SELECT id, email, username, hashed_password, provider
    FROM users
    WHERE email = $1
";

pub(crate) static DELETE_USER: &str = "
    DELETE FROM users WHERE id = $1
";

//////////////////////////////////////////////////////////////////
// tracked companies
//////////////////////////////////////////////////////////////////

/// `user_companies` holds one row per (user, cik) pair; the pair is unique.
pub(crate) static INSERT_USER_COMPANY: &str = "
    INSERT INTO user_companies (user_id, cik)
    VALUES ($1, $2)
";

pub(crate) static DELETE_USER_COMPANY: &str = "
    DELETE FROM user_companies
    WHERE user_id = $1 AND cik = $2
";

pub(crate) static DELETE_USER_COMPANIES: &str = "
    DELETE FROM user_companies WHERE user_id = $1
";

/// Latest financial row per tracked company: max year, then max month within
/// it. Companies with no financial rows drop out of the join.
pub(crate) static SELECT_TRACKED_LATEST: &str = "
    SELECT DISTINCT ON (f.cik)
        f.cik, f.year, f.month,
        f.accounts_payable_current::float8    AS accounts_payable,
        f.assets::float8                      AS assets,
        f.liabilities::float8                 AS liabilities,
        f.cash_and_equivalents::float8        AS cash,
        f.accounts_receivable_current::float8 AS accounts_receivable,
        f.inventory_net::float8               AS inventory,
        f.long_term_debt::float8              AS long_term_debt
    FROM financials f
    JOIN user_companies uc ON uc.cik = f.cik
    WHERE uc.user_id = $1
    ORDER BY f.cik, f.year DESC, f.month DESC
";

/// Tracked companies joined to their metadata and latest financial snapshot.
pub(crate) static SELECT_TRACKED_COMPANIES: &str = "
    SELECT DISTINCT ON (c.cik)
        c.cik, c.ticker, c.companyname, f.year, f.month,
        f.cash_and_equivalents::float8 AS cash_and_equivalents,
        f.long_term_debt::float8       AS long_term_debt
    FROM user_companies uc
    JOIN companies c ON uc.cik = c.cik
    JOIN financials f ON c.cik = f.cik
    WHERE uc.user_id = $1
    ORDER BY c.cik, f.year DESC, f.month DESC
";

//////////////////////////////////////////////////////////////////
// analytical catalog
//////////////////////////////////////////////////////////////////

/// Every company that has price data, most recent listing first per cik.
pub(crate) static LIST_STOCKS: &str = "
    SELECT DISTINCT ON (c.cik)
        c.cik, c.ticker, c.companyname
    FROM companies c
    JOIN stock_prices s ON c.ticker = s.ticker
    ORDER BY c.cik, s.year DESC, s.month DESC
";

/// Top 10 tickers by average close, with their price extremes.
pub(crate) static TOP_STOCKS: &str = "
    WITH stock_price_stats AS (
        SELECT s.ticker,
               MAX(s.high)::float8  AS highest_price,
               MIN(s.low)::float8   AS lowest_price,
               AVG(s.close)::float8 AS avg_close
        FROM stock_prices s
        WHERE s.high IS NOT NULL AND s.low IS NOT NULL AND s.close IS NOT NULL
        GROUP BY s.ticker
    )
    SELECT DISTINCT
        s.ticker, c.cik, c.companyname,
        s.highest_price, s.lowest_price, s.avg_close
    FROM stock_price_stats s
    JOIN companies c ON s.ticker = c.ticker
    ORDER BY s.avg_close DESC
    LIMIT 10
";

/// Companies whose cash exceeds half their liabilities, annotated with a
/// trailing rolling average of cash over the current plus 3 preceding
/// periods.
pub(crate) static HIGH_CASH_RESERVES: &str = "
    WITH financial_stats AS (
        SELECT f.cik, f.assets, f.liabilities, f.cash_and_equivalents,
               AVG(f.cash_and_equivalents) OVER (
                   PARTITION BY f.cik
                   ORDER BY f.year, f.month
                   ROWS BETWEEN 3 PRECEDING AND CURRENT ROW
               ) AS rolling_avg_cash
        FROM financials f
        WHERE f.cash_and_equivalents IS NOT NULL
          AND f.liabilities IS NOT NULL
    )
    SELECT DISTINCT
        f.cik, c.companyname,
        f.assets::float8               AS assets,
        f.liabilities::float8          AS liabilities,
        f.cash_and_equivalents::float8 AS cash_and_equivalents,
        f.rolling_avg_cash::float8     AS rolling_avg_cash
    FROM financial_stats f
    JOIN companies c ON f.cik = c.cik
    WHERE f.cash_and_equivalents > 0.5 * f.liabilities
    ORDER BY cash_and_equivalents DESC
    LIMIT 10
";

/// Debt-to-asset ratio joined to average daily high-low spread per ticker,
/// most volatile first. Rows with zero or unknown assets are excluded.
pub(crate) static DEBT_TO_ASSET_RATIO: &str = "
    WITH debt_ratios AS (
        SELECT f.cik,
               (f.long_term_debt / f.assets)::float8 AS debt_to_asset_ratio
        FROM financials f
        WHERE f.assets > 0 AND f.long_term_debt IS NOT NULL
    )
    SELECT d.cik, c.companyname, s.ticker, d.debt_to_asset_ratio,
           AVG(s.high - s.low)::float8 AS avg_volatility
    FROM debt_ratios d
    JOIN companies c ON d.cik = c.cik
    JOIN stock_prices s
      ON c.ticker = s.ticker
     AND s.high IS NOT NULL AND s.low IS NOT NULL
    GROUP BY d.cik, c.companyname, s.ticker, d.debt_to_asset_ratio
    ORDER BY avg_volatility DESC
    LIMIT 10
";

/// Cash over $50M and long-term debt under $10M, with the highest close ever
/// recorded for the ticker.
pub(crate) static HIGH_CASH_MINIMAL_DEBT: &str = "
    SELECT f.cik, c.companyname, s.ticker,
           f.cash_and_equivalents::float8 AS cash_and_equivalents,
           f.long_term_debt::float8       AS long_term_debt,
           MAX(s.close)::float8           AS max_close_price
    FROM financials f
    JOIN companies c ON f.cik = c.cik
    JOIN stock_prices s ON c.ticker = s.ticker AND s.close IS NOT NULL
    WHERE f.cash_and_equivalents > 50000000
      AND f.long_term_debt < 10000000
    GROUP BY f.cik, c.companyname, s.ticker, f.cash_and_equivalents, f.long_term_debt
    ORDER BY max_close_price DESC
    LIMIT 10
";

/// Month-level average close, globally ranked with RANK(); ties share a rank,
/// so the cutoff can admit more than 10 rows when it lands mid-tie.
pub(crate) static MONTHLY_AVG_CLOSE: &str = "
    WITH monthly_averages AS (
        SELECT s.ticker,
               make_date(s.year, s.month, 1) AS month,
               AVG(s.close)::float8 AS monthly_avg_close
        FROM stock_prices s
        WHERE s.close IS NOT NULL
        GROUP BY s.ticker, s.year, s.month
    ),
    ranked_monthly_averages AS (
        SELECT ticker, month, monthly_avg_close,
               RANK() OVER (ORDER BY monthly_avg_close DESC) AS rank
        FROM monthly_averages
    )
    SELECT ticker, month, monthly_avg_close
    FROM ranked_monthly_averages
    WHERE rank <= 10
";

/// Ten most volatile (ticker, month) pairs among high-volume weeks.
pub(crate) static HIGHEST_FLUCTUATIONS: &str = "
    WITH monthly_volatility AS (
        SELECT s.ticker, s.year, s.month,
               AVG(s.high - s.low)::float8 AS avg_monthly_volatility
        FROM stock_prices s
        JOIN companies c ON s.ticker = c.ticker
        WHERE s.volume > 10000000
          AND s.high IS NOT NULL AND s.low IS NOT NULL
        GROUP BY s.ticker, s.year, s.month
    ),
    top_months AS (
        SELECT ticker, year, month, avg_monthly_volatility
        FROM monthly_volatility
        ORDER BY avg_monthly_volatility DESC
        LIMIT 10
    )
    SELECT c.ticker, c.companyname, c.cik, t.year, t.month, t.avg_monthly_volatility
    FROM companies c
    JOIN top_months t ON c.ticker = t.ticker
    ORDER BY t.avg_monthly_volatility DESC
";

/// Cash-to-debt ratio per filing, `-1` standing in where long-term debt is
/// zero, quarter derived from the filing month.
pub(crate) static LIQUIDITY_DEBT_RATIO: &str = "
    WITH processed_financials AS (
        SELECT DISTINCT f.cik, f.cash_and_equivalents, f.long_term_debt, f.year,
            CASE
                WHEN f.month BETWEEN 1 AND 3 THEN 1
                WHEN f.month BETWEEN 4 AND 6 THEN 2
                WHEN f.month BETWEEN 7 AND 9 THEN 3
                WHEN f.month BETWEEN 10 AND 12 THEN 4
                ELSE NULL
            END AS quarter,
            COALESCE((f.cash_and_equivalents / NULLIF(f.long_term_debt, 0)), -1)::float8
                AS cash_to_debt_ratio
        FROM financials f
        WHERE f.long_term_debt IS NOT NULL
          AND f.cash_and_equivalents IS NOT NULL
        ORDER BY cash_to_debt_ratio DESC
        LIMIT 10
    )
    SELECT c.companyname, p.cik,
           p.cash_and_equivalents::float8 AS cash_and_equivalents,
           p.long_term_debt::float8       AS long_term_debt,
           p.year, p.quarter, p.cash_to_debt_ratio
    FROM companies c
    JOIN processed_financials p ON c.cik = p.cik
    ORDER BY p.cash_to_debt_ratio DESC
";

/// Pairs of companies with the widest leverage gap, drawn from the 5000 most
/// leveraged filings.
pub(crate) static GREATEST_LEVERAGE_DIFFERENCES: &str = "
    WITH debt_to_asset_ratios AS (
        SELECT f.cik, c.companyname,
               (f.long_term_debt / f.assets)::float8 AS debt_to_asset_ratio
        FROM financials f
        JOIN companies c ON f.cik = c.cik
        WHERE f.assets > 0 AND f.long_term_debt IS NOT NULL
    ),
    top_debt_ratios AS (
        SELECT cik, companyname, debt_to_asset_ratio,
               ROW_NUMBER() OVER (ORDER BY debt_to_asset_ratio DESC) AS rank
        FROM debt_to_asset_ratios
        LIMIT 5000
    )
    SELECT DISTINCT
        d1.cik AS company1_cik, d1.companyname AS company1_name,
        d2.cik AS company2_cik, d2.companyname AS company2_name,
        d1.debt_to_asset_ratio AS company1_ratio,
        d2.debt_to_asset_ratio AS company2_ratio,
        ABS(d1.debt_to_asset_ratio - d2.debt_to_asset_ratio) AS ratio_difference
    FROM top_debt_ratios d1
    JOIN top_debt_ratios d2 ON d1.cik < d2.cik
    WHERE ABS(d1.debt_to_asset_ratio - d2.debt_to_asset_ratio) > 0.1
    ORDER BY ratio_difference DESC
    LIMIT 10
";

/// Pairs with near-identical debt-to-asset ratios. Candidates are bucketed
/// into leverage deciles so only same-bucket pairs are compared, and the cik
/// modulus filter thins the quadratic join further.
pub(crate) static SIMILAR_DEBT_RATIOS: &str = "
    WITH filtered_financials AS (
        SELECT f.cik, c.companyname,
               (f.long_term_debt / f.assets)::float8 AS debt_to_asset_ratio,
               NTILE(10) OVER (ORDER BY f.long_term_debt / f.assets) AS bucket
        FROM financials f
        JOIN companies c ON f.cik = c.cik
        WHERE f.assets > 0
          AND f.long_term_debt IS NOT NULL
          AND MOD(f.cik, 3) = 0
    ),
    pairwise_comparison AS (
        SELECT f1.cik AS company1_cik, f1.companyname AS company1_name,
               f2.cik AS company2_cik, f2.companyname AS company2_name,
               ABS(f1.debt_to_asset_ratio - f2.debt_to_asset_ratio) AS ratio_difference
        FROM filtered_financials f1
        JOIN filtered_financials f2
          ON f1.bucket = f2.bucket AND f1.cik < f2.cik
        WHERE ABS(f1.debt_to_asset_ratio - f2.debt_to_asset_ratio) < 0.05
    ),
    ranked_pairs AS (
        SELECT company1_cik, company1_name, company2_cik, company2_name,
               ratio_difference,
               ROW_NUMBER() OVER (
                   PARTITION BY company1_cik ORDER BY ratio_difference ASC
               ) AS pair_rank
        FROM pairwise_comparison
    )
    SELECT company1_cik, company1_name, company2_cik, company2_name, ratio_difference
    FROM ranked_pairs
    WHERE pair_rank <= 10
    ORDER BY ratio_difference ASC
    LIMIT 300
";

/// Pairs with near-identical inventory-to-asset ratios among companies that
/// keep a liquidity floor, bucketed into quintiles to bound the comparison.
pub(crate) static SIMILAR_INVENTORY_RATIOS: &str = "
    WITH initial_ratios AS (
        SELECT f.cik, c.companyname, f.assets, f.liabilities,
               (f.inventory_net / f.assets)::float8 AS inventory_to_asset_ratio,
               (f.cash_and_equivalents / NULLIF(f.liabilities, 0))::float8
                   AS cash_to_liability_ratio
        FROM financials f
        JOIN companies c ON f.cik = c.cik
        WHERE f.inventory_net IS NOT NULL
          AND f.assets IS NOT NULL AND f.assets > 0
          AND f.liabilities IS NOT NULL
    ),
    bucketed_ratios AS (
        SELECT *, NTILE(5) OVER (ORDER BY inventory_to_asset_ratio) AS bucket
        FROM initial_ratios
        WHERE cash_to_liability_ratio > 0.2
    ),
    cross_comparison AS (
        SELECT r1.cik AS company1_cik, r1.companyname AS company1_name,
               r2.cik AS company2_cik, r2.companyname AS company2_name,
               ABS(r1.inventory_to_asset_ratio - r2.inventory_to_asset_ratio)
                   AS ratio_difference,
               ((r1.cash_to_liability_ratio + r2.cash_to_liability_ratio) / 2)
                   AS avg_cash_to_liability_ratio,
               ((r1.assets + r2.assets) / 2)::float8 AS avg_assets,
               ((r1.liabilities + r2.liabilities) / 2)::float8 AS avg_liabilities
        FROM bucketed_ratios r1
        JOIN bucketed_ratios r2 ON r1.bucket = r2.bucket AND r1.cik < r2.cik
        WHERE ABS(r1.inventory_to_asset_ratio - r2.inventory_to_asset_ratio) < 0.1
    ),
    ranked_comparison AS (
        SELECT *,
               ROW_NUMBER() OVER (
                   PARTITION BY company1_cik ORDER BY ratio_difference ASC
               ) AS pair_rank
        FROM cross_comparison
    )
    SELECT company1_cik, company1_name, company2_cik, company2_name,
           ratio_difference, avg_cash_to_liability_ratio, avg_assets, avg_liabilities
    FROM ranked_comparison
    WHERE pair_rank <= 20
    ORDER BY ratio_difference ASC
    LIMIT 1000
";

/// Companies holding cash worth more than twice their liabilities.
pub(crate) static STRONG_LIQUIDITY: &str = "
    SELECT f.cik, c.companyname,
           f.cash_and_equivalents::float8 AS cash_and_equivalents,
           f.liabilities::float8          AS liabilities,
           (f.cash_and_equivalents / f.liabilities)::float8 AS cash_to_liability_ratio
    FROM financials f
    JOIN companies c ON f.cik = c.cik
    WHERE f.liabilities IS NOT NULL AND f.liabilities > 0
      AND f.cash_and_equivalents > 2 * f.liabilities
    ORDER BY cash_to_liability_ratio DESC
";

/// Companies that grew cash by more than 5% while cutting long-term debt by
/// more than 5% against the preceding filing.
pub(crate) static FINANCIAL_IMPROVEMENT: &str = "
    WITH yearly_financials AS (
        SELECT f.cik, c.companyname, f.year,
               f.cash_and_equivalents, f.long_term_debt,
               LAG(f.cash_and_equivalents) OVER w AS prev_cash,
               LAG(f.long_term_debt) OVER w AS prev_debt,
               ((f.cash_and_equivalents - LAG(f.cash_and_equivalents) OVER w) * 100.0
                   / NULLIF(LAG(f.cash_and_equivalents) OVER w, 0))::float8
                   AS cash_growth_percentage,
               ((LAG(f.long_term_debt) OVER w - f.long_term_debt) * 100.0
                   / NULLIF(LAG(f.long_term_debt) OVER w, 0))::float8
                   AS debt_reduction_percentage,
               AVG(f.cash_and_equivalents) OVER (
                   PARTITION BY f.cik ORDER BY f.year
                   ROWS BETWEEN 2 PRECEDING AND CURRENT ROW
               )::float8 AS three_year_avg_cash
        FROM financials f
        JOIN companies c ON f.cik = c.cik
        WINDOW w AS (PARTITION BY f.cik ORDER BY f.year)
    )
    SELECT cik, companyname, year,
           cash_and_equivalents::float8 AS cash_and_equivalents,
           long_term_debt::float8       AS long_term_debt,
           cash_growth_percentage, debt_reduction_percentage, three_year_avg_cash
    FROM yearly_financials
    WHERE cash_and_equivalents > prev_cash
      AND long_term_debt < prev_debt
      AND cash_growth_percentage > 5
      AND debt_reduction_percentage > 5
    ORDER BY year, cik
";

//////////////////////////////////////////////////////////////////
// search
//////////////////////////////////////////////////////////////////

/// Projection for the filtered search; the predicate and the 50-row cap are
/// appended by the builder in `rest_api::search`.
pub(crate) static SEARCH_FINANCIALS: &str = "
    SELECT cik, year, month,
           accounts_payable_current::float8    AS accounts_payable_current,
           assets::float8                      AS assets,
           liabilities::float8                 AS liabilities,
           cash_and_equivalents::float8        AS cash_and_equivalents,
           accounts_receivable_current::float8 AS accounts_receivable_current,
           inventory_net::float8               AS inventory_net,
           long_term_debt::float8              AS long_term_debt
    FROM financials
";
