mod cli;
mod spider;

// remote imports
use crate::cli::Endpoint::*;
use clap::Parser;
use cli::{Cli, TraceLevel};
use tracing::{subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

////////////////////////////////////////////////////////////////////////////

// preproccess the trace level, and open the .env file
fn preprocess(trace_level: Level) {
    dotenv::dotenv().ok();
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .finish();
    subscriber::set_global_default(my_subscriber).expect("Set subscriber");
}

////////////////////////////////////////////////////////////////////////////

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // set the trace level; default to INFO when none is given
    preprocess(match cli.trace {
        Some(TraceLevel::DEBUG) => Level::DEBUG,
        Some(TraceLevel::ERROR) => Level::ERROR,
        Some(TraceLevel::TRACE) => Level::TRACE,
        Some(TraceLevel::WARN) => Level::WARN,
        Some(TraceLevel::INFO) | None => Level::INFO,
    });
    trace!("command line input recorded: {cli:?}");

    // read cli inputs
    use cli::Commands::*;
    match cli.command {
        // `findex spider <Option<Vec<Endpoint>>>`: scrape pipelines
        Spider { endpoints } => {
            // if no pipelines provided, run all
            match endpoints {
                Some(endpoints) => spider::run(endpoints).await?,
                None => spider::run(vec![Sec, Prices]).await?,
            }
        }
    }

    Ok(())
}
