mod cli;
pub mod config;
pub mod crawl;
pub mod feed;
mod logging;
pub mod models;
pub mod scraping;
pub mod store;
#[cfg(test)]
mod testing;
mod utils;

use clap::Parser;

pub use crawl::{CrawlReport, Crawler};
pub use models::EventRecord;

pub async fn run() -> anyhow::Result<()> {
    logging::init();
    let cli = cli::Cli::parse();
    cli::execute(cli).await
}
