use crate::http::*;
use serde::de::Visitor;
use serde::Deserialize;
use tracing::{debug, error};

/// One entry of the SEC's `company_tickers.json` map.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Ticker {
    #[serde(rename = "cik_str")]
    pub cik: i32,
    pub ticker: String,
    pub title: String,
}

#[derive(Debug)]
pub(crate) struct Tickers(pub Vec<Ticker>);

/// Fetch the SEC ticker file: every registered company's CIK, trading symbol,
/// and title. Both pipelines draw their company universe from it.
pub(crate) async fn fetch(client: &HttpClient) -> anyhow::Result<Tickers> {
    debug!("fetching SEC company tickers");
    let tickers: Tickers = client
        .get("https://www.sec.gov/files/company_tickers.json")
        .send()
        .await
        .map_err(|err| {
            error!("failed to fetch company tickers, error({err})");
            err
        })?
        .json()
        .await
        .map_err(|err| {
            error!("failed to parse company tickers, error({err})");
            err
        })?;
    debug!("{} company tickers fetched", tickers.0.len());
    Ok(tickers)
}

struct TickerVisitor;

impl<'de> Visitor<'de> for TickerVisitor {
    type Value = Tickers;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("Map of tickers")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        // each entry is in the form of:
        // `0: { "cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc." },
        //  1: { ... },
        //  ...`
        let mut tickers: Vec<Ticker> = Vec::new();
        while let Some((_, ticker)) = map.next_entry::<u32, Ticker>()? {
            tickers.push(ticker);
        }
        Ok(Tickers(tickers))
    }
}

impl<'de> Deserialize<'de> for Tickers {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // we want a vector returned, but the deserialize will expect a map, given
        // how the API has been designed
        deserializer.deserialize_map(TickerVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_the_keyed_map_into_a_vec() {
        let json = r#"{
            "0": { "cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc." },
            "1": { "cik_str": 789019, "ticker": "MSFT", "title": "MICROSOFT CORP" }
        }"#;
        let tickers: Tickers = serde_json::from_str(json).unwrap();
        assert_eq!(tickers.0.len(), 2);
        assert_eq!(tickers.0[0].cik, 320193);
        assert_eq!(tickers.0[0].ticker, "AAPL");
        assert_eq!(tickers.0[1].title, "MICROSOFT CORP");
    }
}
