use crate::cli::Endpoint;
use findex_spider as spider;
use tracing::info;

const SEC_OUT: &str = "./sec_financials.csv";
const PRICES_OUT: &str = "./yahoo_weekly_prices.csv";

/// Run the selected scrape pipelines in order.
pub(crate) async fn run(endpoints: Vec<Endpoint>) -> anyhow::Result<()> {
    let time = std::time::Instant::now();
    for endpoint in endpoints {
        match endpoint {
            Endpoint::Sec => {
                let time = std::time::Instant::now();

                spider::sec::scrape(SEC_OUT).await?;

                info!(
                    "sec financials collected, time elapsed: {:?}",
                    time.elapsed()
                );
            }
            Endpoint::Prices => {
                let time = std::time::Instant::now();

                spider::yahoo_finance::scrape(PRICES_OUT).await?;

                info!("price data collected, time elapsed: {:?}", time.elapsed());
            }
        }
    }

    info!(
        "spider finished collecting data, time elapsed: {:?}",
        time.elapsed()
    );

    Ok(())
}
