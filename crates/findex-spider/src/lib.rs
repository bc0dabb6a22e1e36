/// Financial-statement line items from the [SEC]'s XBRL frames API, merged
/// per company and period and written to CSV for bulk load.
///
/// [SEC]: https://www.sec.gov/search-filings/edgar-application-programming-interfaces
pub mod sec;

/// Price history collected from the Yahoo Finance API; inspiration from Python's [yfinance] library.
///
/// [yfinance]: https://github.com/ranaroussi/yfinance/
pub mod yahoo_finance;

pub(crate) mod tickers;

/// Shortcut for required API elements.
pub(crate) mod http {
    pub(crate) use dotenv::var;
    pub(crate) use reqwest::Client as HttpClient;
}

/// Standard client carrying the `USER_AGENT` identity the SEC requires.
pub(crate) fn std_client_build() -> http::HttpClient {
    reqwest::ClientBuilder::new()
        .user_agent(http::var("USER_AGENT").expect("failed to read USER_AGENT"))
        .build()
        .expect("failed to build reqwest client")
}

/// Elapsed-time tail for end-of-run logs.
pub(crate) fn time_elapsed(start: std::time::Instant) -> String {
    format!("time elapsed: {:.2}s", start.elapsed().as_secs_f64())
}
