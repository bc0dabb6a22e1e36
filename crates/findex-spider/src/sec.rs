use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, error, info};

/// The us-gaap tags collected per company, in CSV column order.
const FEATURES: [&str; 7] = [
    "AccountsPayableCurrent",
    "Assets",
    "Liabilities",
    "CashAndCashEquivalentsAtCarryingValue",
    "AccountsReceivableNetCurrent",
    "InventoryNet",
    "LongTermDebt",
];

const FIRST_YEAR: i32 = 2009;
const LAST_YEAR: i32 = 2022;

/// Row key: (cik, year, quarter). BTreeMap keeps the output sorted by cik and
/// period.
type Merged = BTreeMap<(i32, i32, u32), Vec<Option<f64>>>;

// scrape
// ----------------------------------------------------------------------------

/// Crawl the SEC XBRL frames API, one request per (tag, year, quarter), merge
/// the frames per company and period, and write the monthly CSV used for bulk
/// load. The crawl is sequential; the SEC rate-limits aggressive clients.
pub async fn scrape(out_path: &str) -> anyhow::Result<()> {
    let time = std::time::Instant::now();
    let client = crate::std_client_build();

    let universe: HashSet<i32> = crate::tickers::fetch(&client)
        .await?
        .0
        .iter()
        .map(|t| t.cik)
        .collect();
    info!("company universe loaded, {} ciks", universe.len());

    let total = FEATURES.len() * (LAST_YEAR - FIRST_YEAR + 1) as usize * 4;
    let pb = ProgressBar::new(total as u64).with_style(
        ProgressStyle::default_bar()
            .template(
                "{msg} {spinner:.magenta}\n\
                [{elapsed_precise:.magenta}] |{bar:40.cyan/blue}| {human_pos}/{human_len} frames \
                [Rate: {per_sec:.magenta}, ETA: {eta:.blue}]",
            )?
            .progress_chars("##-"),
    );
    pb.set_message("fetching SEC frames ...");

    let mut merged = Merged::new();
    for (feature_idx, feature) in FEATURES.iter().enumerate() {
        for year in FIRST_YEAR..=LAST_YEAR {
            for quarter in 1..=4u32 {
                let url = format!(
                    "https://data.sec.gov/api/xbrl/frames/us-gaap/{feature}/USD/CY{year}Q{quarter}I.json"
                );

                let response = match client.get(&url).send().await {
                    Ok(response) => response,
                    Err(err) => {
                        error!("failed to fetch {feature} CY{year}Q{quarter}, error({err})");
                        pb.inc(1);
                        continue;
                    }
                };
                let frame: FrameResponse = match response.json().await {
                    Ok(frame) => frame,
                    Err(err) => {
                        error!("failed to parse {feature} CY{year}Q{quarter}, error({err})");
                        pb.inc(1);
                        continue;
                    }
                };

                if let Err(err) = merge_frame(&mut merged, &universe, feature_idx, &frame) {
                    error!("failed to merge {feature} CY{year}Q{quarter}, error({err})");
                }
                pb.inc(1);
            }
        }
    }
    pb.finish_and_clear();
    debug!("{} (cik, period) rows merged", merged.len());

    let rows = write_csv(&merged, out_path)?;
    info!(
        "sec financials written to {out_path}, {rows} rows. {}",
        crate::time_elapsed(time)
    );

    Ok(())
}

/// Fold one frame into the merged table: every reported value lands in the
/// feature's column of its (cik, year, quarter) row, restricted to the known
/// company universe.
fn merge_frame(
    merged: &mut Merged,
    universe: &HashSet<i32>,
    feature_idx: usize,
    frame: &FrameResponse,
) -> anyhow::Result<()> {
    let (year, quarter) = parse_ccp(&frame.ccp)?;
    for entry in &frame.data {
        if universe.contains(&entry.cik) {
            merged
                .entry((entry.cik, year, quarter))
                .or_insert_with(|| vec![None; FEATURES.len()])[feature_idx] = Some(entry.val);
        }
    }
    Ok(())
}

/// Split a calendar-period tag like `CY2009Q1I` into (year, quarter).
fn parse_ccp(ccp: &str) -> anyhow::Result<(i32, u32)> {
    let year = ccp.get(2..6).and_then(|s| s.parse().ok());
    let quarter = ccp.get(7..8).and_then(|s| s.parse().ok());
    match (year, quarter) {
        (Some(year), Some(quarter)) if (1..=4).contains(&quarter) => Ok((year, quarter)),
        _ => anyhow::bail!("unrecognised period tag '{ccp}'"),
    }
}

/// The three calendar months a quarter covers.
fn quarter_months(quarter: u32) -> std::ops::Range<u32> {
    let base = (quarter - 1) * 3 + 1;
    base..base + 3
}

/// Expand each quarterly row to its three months and write the CSV; missing
/// values stay empty cells.
fn write_csv(merged: &Merged, out_path: &str) -> anyhow::Result<usize> {
    let mut writer = csv::Writer::from_path(out_path)?;

    let mut headers = vec!["CIK", "Year", "Month"];
    headers.extend(FEATURES);
    writer.write_record(&headers)?;

    let mut rows = 0usize;
    for ((cik, year, quarter), vals) in merged {
        for month in quarter_months(*quarter) {
            let mut record = vec![cik.to_string(), year.to_string(), month.to_string()];
            record.extend(
                vals.iter()
                    .map(|val| val.map(|v| v.to_string()).unwrap_or_default()),
            );
            writer.write_record(&record)?;
            rows += 1;
        }
    }
    writer.flush()?;

    Ok(rows)
}

// de
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FrameResponse {
    ccp: String,
    #[serde(default)]
    data: Vec<FrameEntry>,
}

#[derive(Debug, Deserialize)]
struct FrameEntry {
    cik: i32,
    val: f64,
}

// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ccp_tags_split_into_year_and_quarter() {
        assert_eq!(parse_ccp("CY2009Q1I").unwrap(), (2009, 1));
        assert_eq!(parse_ccp("CY2022Q4I").unwrap(), (2022, 4));
        assert!(parse_ccp("CY2009").is_err());
        assert!(parse_ccp("CY2009Q5I").is_err());
        assert!(parse_ccp("garbage").is_err());
    }

    #[test]
    fn quarters_expand_to_their_months() {
        assert_eq!(quarter_months(1).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(quarter_months(2).collect::<Vec<_>>(), vec![4, 5, 6]);
        assert_eq!(quarter_months(4).collect::<Vec<_>>(), vec![10, 11, 12]);
    }

    #[test]
    fn frames_for_the_same_period_merge_into_one_row() {
        let universe = HashSet::from([1, 2]);
        let mut merged = Merged::new();

        merge_frame(
            &mut merged,
            &universe,
            1, // Assets
            &FrameResponse {
                ccp: "CY2020Q1I".into(),
                data: vec![
                    FrameEntry { cik: 1, val: 100.0 },
                    FrameEntry { cik: 2, val: 200.0 },
                    // outside the universe; dropped
                    FrameEntry { cik: 3, val: 300.0 },
                ],
            },
        )
        .unwrap();
        merge_frame(
            &mut merged,
            &universe,
            2, // Liabilities
            &FrameResponse {
                ccp: "CY2020Q1I".into(),
                data: vec![FrameEntry { cik: 1, val: 50.0 }],
            },
        )
        .unwrap();

        assert_eq!(merged.len(), 2);
        let row = &merged[&(1, 2020, 1)];
        assert_eq!(row[1], Some(100.0));
        assert_eq!(row[2], Some(50.0));
        assert_eq!(row[0], None);
        // cik 2 reported assets only
        assert_eq!(merged[&(2, 2020, 1)][2], None);
    }
}
