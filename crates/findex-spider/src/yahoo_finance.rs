use chrono::Datelike;
use futures::{stream, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, trace};

// scrape
// ----------------------------------------------------------------------------

/// Fetch 10 years of weekly candles per ticker from the Yahoo Finance chart
/// API and append them to one CSV through a shared writer. A ticker that
/// fails to fetch, parse, or write is logged and skipped; the run never dies
/// on a single symbol.
pub async fn scrape(out_path: &str) -> anyhow::Result<()> {
    let time = std::time::Instant::now();
    let http_client = crate::std_client_build();

    info!("fetching ticker universe ...");
    let tickers = crate::tickers::fetch(&http_client).await?;

    let mut writer = csv::Writer::from_path(out_path)?;
    writer.write_record([
        "Open", "High", "Low", "Close", "Volume", "Ticker", "Year", "Month", "Day",
    ])?;
    let writer = Arc::new(Mutex::new(writer));

    // stream over tickers and fetch prices from Yahoo Finance
    info!("fetching Yahoo Finance prices ...");
    let stream = stream::iter(tickers.0);
    stream
        .for_each_concurrent(18, |ticker| {
            let http_client = &http_client;
            let writer = writer.clone();
            async move {
                let url = format!(
                    "https://query1.finance.yahoo.com/v8/finance/chart/{ticker}?range=10y&interval=1wk",
                    ticker = ticker.ticker
                );

                // fetch raw http response
                let response = match http_client.get(url).send().await {
                    Ok(response) => response,
                    Err(err) => {
                        error!(
                            "failed to fetch Yahoo Finance prices for [{}] {}, error({err})",
                            &ticker.ticker, &ticker.title
                        );
                        return;
                    }
                };

                // deserialize the response to JSON
                let price_response: PriceResponse = match response.json().await {
                    Ok(json) => json,
                    Err(err) => {
                        error!(
                            "failed to parse Yahoo Finance prices for [{}] {}, error({err})",
                            &ticker.ticker, &ticker.title
                        );
                        return;
                    }
                };

                // transform deserialized response
                let rows = match price_response.chart.result.as_deref() {
                    Some([data, ..]) => transform(&ticker.ticker, data),
                    _ => {
                        error!(
                            "failed to parse Yahoo Finance prices for [{}] {}, error(no results found within http response)",
                            &ticker.ticker, &ticker.title
                        );
                        return;
                    }
                };
                trace!(
                    "{} price rows transformed for [{}] {}",
                    rows.len(),
                    &ticker.ticker,
                    &ticker.title
                );

                // append the rows to the shared csv
                let mut writer = writer.lock().await;
                for row in &rows {
                    if let Err(err) = writer.write_record(&row.record()) {
                        error!(
                            "failed to write price row for [{}] {}, error({err})",
                            &ticker.ticker, &ticker.title
                        );
                        return;
                    }
                }
                trace!(
                    "priceset written for [{}] {}",
                    &ticker.ticker,
                    &ticker.title
                );
            }
        })
        .await;

    // unpack the writer and flush the file
    Arc::into_inner(writer)
        .expect("failed to unpack csv writer from Arc")
        .into_inner()
        .flush()?;

    info!(
        "yahoo prices written to {out_path}. {}",
        crate::time_elapsed(time)
    );

    Ok(())
}

// transform
// ----------------------------------------------------------------------------

/// A single weekly candle destined for the csv.
#[derive(Debug, PartialEq)]
struct PriceRow {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
    ticker: String,
    year: i32,
    month: u32,
    day: u32,
}

impl PriceRow {
    fn record(&self) -> [String; 9] {
        [
            self.open.to_string(),
            self.high.to_string(),
            self.low.to_string(),
            self.close.to_string(),
            self.volume.to_string(),
            self.ticker.clone(),
            self.year.to_string(),
            self.month.to_string(),
            self.day.to_string(),
        ]
    }
}

/// Zip the parallel quote arrays into rows, splitting each timestamp into
/// calendar (year, month, day). Yahoo emits null candles for weeks with no
/// trade; those are dropped.
fn transform(ticker: &str, data: &ChartResult) -> Vec<PriceRow> {
    let quote = match data.indicators.quote.first() {
        Some(quote) => quote,
        None => return Vec::new(),
    };

    quote
        .open
        .iter()
        .zip(quote.high.iter())
        .zip(quote.low.iter())
        .zip(quote.close.iter())
        .zip(quote.volume.iter())
        .zip(data.timestamp.iter())
        .filter_map(|(((((open, high), low), close), volume), timestamp)| {
            let date = chrono::DateTime::from_timestamp(*timestamp, 0)?.date_naive();
            Some(PriceRow {
                open: (*open)?,
                high: (*high)?,
                low: (*low)?,
                close: (*close)?,
                volume: (*volume)?,
                ticker: ticker.to_owned(),
                year: date.year(),
                month: date.month(),
                day: date.day(),
            })
        })
        .collect()
}

// de
// ----------------------------------------------------------------------------

// input
#[derive(Debug, Deserialize)]
struct PriceResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp(year: i32, month: u32, day: u32) -> i64 {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
            .and_utc()
            .timestamp()
    }

    #[test]
    fn candles_split_into_calendar_parts() {
        let data = ChartResult {
            timestamp: vec![timestamp(2020, 1, 6), timestamp(2020, 1, 13)],
            indicators: Indicators {
                quote: vec![Quote {
                    open: vec![Some(10.0), Some(11.0)],
                    high: vec![Some(12.0), Some(13.0)],
                    low: vec![Some(9.0), Some(10.0)],
                    close: vec![Some(11.0), Some(12.0)],
                    volume: vec![Some(1000), Some(2000)],
                }],
            },
        };

        let rows = transform("AAPL", &data);
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            PriceRow {
                open: 10.0,
                high: 12.0,
                low: 9.0,
                close: 11.0,
                volume: 1000,
                ticker: "AAPL".into(),
                year: 2020,
                month: 1,
                day: 6,
            }
        );
        assert_eq!((rows[1].year, rows[1].month, rows[1].day), (2020, 1, 13));
    }

    #[test]
    fn null_candles_are_dropped() {
        let data = ChartResult {
            timestamp: vec![timestamp(2020, 1, 6), timestamp(2020, 1, 13)],
            indicators: Indicators {
                quote: vec![Quote {
                    open: vec![Some(10.0), None],
                    high: vec![Some(12.0), None],
                    low: vec![Some(9.0), None],
                    close: vec![Some(11.0), None],
                    volume: vec![Some(1000), None],
                }],
            },
        };

        let rows = transform("AAPL", &data);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].day, 6);
    }

    #[test]
    fn empty_quote_set_yields_no_rows() {
        let data = ChartResult {
            timestamp: vec![],
            indicators: Indicators { quote: vec![] },
        };
        assert!(transform("AAPL", &data).is_empty());
    }

    #[test]
    fn chart_responses_deserialize() {
        let json = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1578321000],
                    "indicators": {
                        "quote": [{
                            "open": [10.0], "high": [12.0], "low": [9.0],
                            "close": [11.0], "volume": [1000]
                        }]
                    }
                }]
            }
        }"#;
        let response: PriceResponse = serde_json::from_str(json).unwrap();
        let result = response.chart.result.unwrap();
        assert_eq!(result[0].timestamp, vec![1578321000]);
        assert_eq!(result[0].indicators.quote[0].open, vec![Some(10.0)]);
    }
}
