use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::config::CrawlConfig;
use crate::crawl::Crawler;
use crate::feed::{self, EventQuery};
use crate::models::{EventKind, Genre};
use crate::scraping::{fetch::HttpFetcher, SourceInfo};
use crate::store::{self, NewEvent};

#[derive(Parser, Debug)]
#[command(name = "movie-scrape")]
#[command(about = "Collects cinema-chain promotional events into a normalized feed")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl the enabled sources and write the feed
    Crawl(CrawlArgs),

    /// List the sources a crawl would visit
    Sources {
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print one page of a saved feed as JSON
    List(ListArgs),

    /// Append a hand-entered event to a saved feed
    Add(AddArgs),
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Output directory, overrides `output_dir`
    #[arg(long)]
    pub out: Option<PathBuf>,
    #[arg(long)]
    pub seed: Option<u64>,
    /// Restrict the run to these source ids (repeatable)
    #[arg(long = "source")]
    pub sources: Vec<String>,
    #[arg(long)]
    pub no_csv: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Directory holding events.json, defaults to the configured output dir
    #[arg(long)]
    pub dir: Option<PathBuf>,
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long = "type", value_parser = parse_kind)]
    pub kind: Option<EventKind>,
    #[arg(long, value_parser = parse_genre)]
    pub genre: Option<Genre>,
    #[arg(long)]
    pub source: Option<String>,
    #[arg(long)]
    pub page: Option<usize>,
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Directory holding events.json, defaults to the configured output dir
    #[arg(long)]
    pub dir: Option<PathBuf>,
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    /// Event date as YYYY-MM-DD
    #[arg(long)]
    pub date: NaiveDate,
    #[arg(long)]
    pub location: String,
    #[arg(long = "type", value_parser = parse_kind)]
    pub kind: EventKind,
    #[arg(long, value_parser = parse_genre)]
    pub genre: Genre,
    /// Source id or brand, e.g. `cgv` or `메가박스`
    #[arg(long)]
    pub source: String,
    #[arg(long)]
    pub image: Option<String>,
    /// Required when the source is not a known chain
    #[arg(long)]
    pub link: Option<String>,
}

fn parse_kind(value: &str) -> Result<EventKind, String> {
    EventKind::parse(value).ok_or_else(|| {
        let known: Vec<_> = EventKind::ALL.iter().map(|k| k.as_str()).collect();
        format!("unknown event type {value:?}, expected one of {}", known.join(", "))
    })
}

fn parse_genre(value: &str) -> Result<Genre, String> {
    Genre::parse(value).ok_or_else(|| {
        let known: Vec<_> = Genre::ALL.iter().map(|g| g.as_str()).collect();
        format!("unknown genre {value:?}, expected one of {}", known.join(", "))
    })
}

fn load_config(path: Option<&PathBuf>) -> Result<CrawlConfig> {
    match path {
        Some(path) => CrawlConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => CrawlConfig::load_default().context("failed to load default config"),
    }
}

pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Crawl(args) => crawl(args).await,
        Commands::Sources { config } => sources(config),
        Commands::List(args) => list(args),
        Commands::Add(args) => add(args),
    }
}

async fn crawl(args: CrawlArgs) -> Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    if let Some(out) = args.out {
        config.output_dir = out;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.no_csv {
        config.write_csv = false;
    }

    let fetcher = HttpFetcher::new(&config.user_agent, config.request_timeout())
        .context("failed to build http client")?;
    let crawler = Crawler::from_config(&config, &args.sources, Arc::new(fetcher))
        .context("invalid source selection")?;
    tracing::info!(sources = ?crawler.source_ids(), "starting crawl");

    let report = crawler.run().await;
    let saved = store::save(&report.records, &config.output_dir, config.write_csv)
        .context("failed to persist event feed")?;
    tracing::info!(
        path = %saved.json.display(),
        records = report.records.len(),
        "feed saved"
    );

    println!("{}", serde_json::to_string_pretty(&report.sources)?);
    Ok(())
}

fn sources(config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_ref())?;
    let infos: Vec<SourceInfo> = config
        .resolve_sources(&[])?
        .into_iter()
        .map(|(_, source_config)| SourceInfo {
            id: source_config.profile.id,
            brand: source_config.profile.brand,
            listing_urls: source_config.listing_urls,
            floor: source_config.floor,
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&infos)?);
    Ok(())
}

fn list(args: ListArgs) -> Result<()> {
    let dir = match args.dir {
        Some(dir) => dir,
        None => load_config(None)?.output_dir,
    };
    let records = store::load(&dir)
        .with_context(|| format!("no readable feed in {}", dir.display()))?;
    let page = feed::query(
        records,
        &EventQuery {
            search: args.search,
            kind: args.kind,
            genre: args.genre,
            source: args.source,
            page: args.page,
            limit: args.limit,
        },
    );
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

fn add(args: AddArgs) -> Result<()> {
    let dir = match args.dir {
        Some(dir) => dir,
        None => load_config(None)?.output_dir,
    };
    let record = store::append(
        &dir,
        NewEvent {
            title: args.title,
            description: args.description,
            date: args.date,
            location: args.location,
            kind: args.kind,
            genre: args.genre,
            image: args.image,
            source: args.source,
            link: args.link,
        },
    )
    .with_context(|| format!("failed to add event to {}", dir.display()))?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_crawl_flags() {
        let cli = Cli::try_parse_from([
            "movie-scrape",
            "crawl",
            "--seed",
            "7",
            "--source",
            "cgv",
            "--source",
            "megabox",
            "--no-csv",
            "--out",
            "out",
        ])
        .expect("crawl args");
        let Commands::Crawl(args) = cli.command else {
            panic!("expected crawl");
        };
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.sources, vec!["cgv".to_string(), "megabox".to_string()]);
        assert!(args.no_csv);
        assert_eq!(args.out, Some(PathBuf::from("out")));
    }

    #[test]
    fn parses_list_filters_and_rejects_unknown_labels() {
        let cli = Cli::try_parse_from([
            "movie-scrape",
            "list",
            "--type",
            "merch-giveaway",
            "--genre",
            "sci-fi",
            "--page",
            "2",
        ])
        .expect("list args");
        let Commands::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.kind, Some(EventKind::MerchGiveaway));
        assert_eq!(args.genre, Some(Genre::SciFi));
        assert_eq!(args.page, Some(2));

        assert!(Cli::try_parse_from(["movie-scrape", "list", "--genre", "western"]).is_err());
    }

    #[test]
    fn parses_add_entries_and_requires_the_core_fields() {
        let cli = Cli::try_parse_from([
            "movie-scrape",
            "add",
            "--title",
            "하얼빈 감독 무대인사",
            "--date",
            "2026-11-20",
            "--location",
            "CGV 용산",
            "--type",
            "premiere",
            "--genre",
            "drama",
            "--source",
            "CGV",
        ])
        .expect("add args");
        let Commands::Add(args) = cli.command else {
            panic!("expected add");
        };
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2026, 11, 20).expect("date"));
        assert_eq!(args.kind, EventKind::Premiere);
        assert_eq!(args.genre, Genre::Drama);
        assert!(args.link.is_none());
        assert!(args.description.is_none());

        assert!(
            Cli::try_parse_from(["movie-scrape", "add", "--title", "하얼빈 감독 무대인사"]).is_err()
        );
        assert!(Cli::try_parse_from([
            "movie-scrape",
            "add",
            "--title",
            "하얼빈 감독 무대인사",
            "--date",
            "11/20",
            "--location",
            "CGV 용산",
            "--type",
            "premiere",
            "--genre",
            "drama",
            "--source",
            "CGV",
        ])
        .is_err());
    }
}
