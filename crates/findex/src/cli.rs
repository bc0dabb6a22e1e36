use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing.
    #[arg(short, long, global = true)]
    pub trace: Option<TraceLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Webscrape the offline datasets to CSV, ready for bulk load.
    Spider {
        /// Specify the pipelines to run.
        ///
        /// If no pipelines are provided, spider will run all of them.
        #[arg(short, long)]
        endpoints: Option<Vec<Endpoint>>,
    },
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[clap(rename_all = "UPPERCASE")]
pub enum TraceLevel {
    DEBUG,
    ERROR,
    INFO,
    TRACE,
    WARN,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    /// SEC financial-statement line items.
    Sec,

    /// Yahoo Finance weekly price history.
    Prices,
}
