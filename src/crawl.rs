//! Runs every configured source concurrently and assembles one ordered
//! feed. Each source task owns its buffer; a single collector re-sequences
//! the results into configured source order before ids are assigned.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Asia::Seoul;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::{ConfigError, CrawlConfig};
use crate::models::EventRecord;
use crate::scraping::extractor::{SourceExtractor, SourceOutcome, SourceYield};
use crate::scraping::fetch::PageFetcher;
use crate::scraping::synth::Synthesizer;

/// Current calendar date in Korea, where every listed venue is.
pub fn seoul_today() -> NaiveDate {
    Utc::now().with_timezone(&Seoul).date_naive()
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source_id: String,
    pub outcome: SourceOutcome,
    pub records: usize,
}

#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub records: Vec<EventRecord>,
    pub sources: Vec<SourceReport>,
}

pub struct Crawler {
    fetcher: Arc<dyn PageFetcher>,
    extractors: Vec<SourceExtractor>,
    seed: Option<u64>,
    window_days: u32,
    run_deadline: Duration,
}

impl Crawler {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractors: Vec<SourceExtractor>,
        seed: Option<u64>,
        window_days: u32,
        run_deadline: Duration,
    ) -> Self {
        Self {
            fetcher,
            extractors,
            seed,
            window_days,
            run_deadline,
        }
    }

    pub fn from_config(
        config: &CrawlConfig,
        only: &[String],
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self, ConfigError> {
        let extractors = config
            .resolve_sources(only)?
            .into_iter()
            .map(|(source, source_config)| {
                SourceExtractor::new(
                    source,
                    source_config,
                    config.title_policy.clone(),
                    config.polite_delay_ms,
                )
            })
            .collect();
        Ok(Self::new(
            fetcher,
            extractors,
            config.seed,
            config.date_window_days,
            config.run_deadline(),
        ))
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.extractors.iter().map(|e| e.source_id()).collect()
    }

    pub async fn run(&self) -> CrawlReport {
        self.run_on(seoul_today()).await
    }

    pub async fn run_on(&self, today: NaiveDate) -> CrawlReport {
        let mut master = match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let deadline = Instant::now() + self.run_deadline;
        let (tx, mut rx) = mpsc::channel::<(usize, SourceYield)>(self.extractors.len().max(1));

        for (index, extractor) in self.extractors.iter().cloned().enumerate() {
            // forked up front so each source's stream depends only on its position
            let mut synth = Synthesizer::new(master.fork(), today, self.window_days);
            let fetcher = Arc::clone(&self.fetcher);
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = extractor.extract(fetcher.as_ref(), &mut synth, deadline).await;
                if tx.send((index, result)).await.is_err() {
                    tracing::warn!(
                        source = extractor.source_id(),
                        "collector closed before result"
                    );
                }
            });
        }
        drop(tx);

        let mut slots: Vec<Option<SourceYield>> =
            (0..self.extractors.len()).map(|_| None).collect();
        while let Some((index, result)) = rx.recv().await {
            slots[index] = Some(result);
        }

        let mut records = Vec::new();
        let mut sources = Vec::with_capacity(slots.len());
        let mut last_stamp: Option<DateTime<Utc>> = None;
        for (extractor, slot) in self.extractors.iter().zip(slots) {
            let Some(result) = slot else {
                tracing::warn!(
                    source = extractor.source_id(),
                    "source task ended without a result"
                );
                sources.push(SourceReport {
                    source_id: extractor.source_id().to_string(),
                    outcome: SourceOutcome::default(),
                    records: 0,
                });
                continue;
            };

            let count = result.drafts.len();
            for (n, draft) in result.drafts.into_iter().enumerate() {
                let stamp = match last_stamp {
                    Some(previous) => Utc::now().max(previous),
                    None => Utc::now(),
                };
                last_stamp = Some(stamp);
                records.push(draft.into_record(format!("{}_{}", result.source_id, n + 1), stamp));
            }
            sources.push(SourceReport {
                source_id: result.source_id,
                outcome: result.outcome,
                records: count,
            });
        }

        tracing::info!(records = records.len(), sources = sources.len(), "crawl finished");
        CrawlReport { records, sources }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraping::cgv_html::Cgv;
    use crate::scraping::extractor::PoliteDelay;
    use crate::scraping::validate::TitlePolicy;
    use crate::scraping::EventSource;
    use crate::testing::{StubFetcher, StubPage};

    const THREE_CARDS: &str = r#"
    <div class="event_card"><a href="/e/1"><strong>파묘 무대인사 시사회</strong></a></div>
    <div class="event_card"><a href="/e/2"><strong>베테랑2 포스터 증정</strong></a></div>
    <div class="event_card"><a href="/e/3"><strong>글래디에이터2 IMAX 특별 상영</strong></a></div>
    "#;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).expect("today")
    }

    fn extractor(id: &str, url: &str, floor: usize) -> SourceExtractor {
        let mut config = Cgv.defaults();
        config.profile.id = id.to_string();
        config.listing_urls = vec![url.to_string()];
        config.floor = floor;
        SourceExtractor::new(Arc::new(Cgv), config, TitlePolicy::default(), PoliteDelay::none())
    }

    fn crawler(
        fetcher: StubFetcher,
        extractors: Vec<SourceExtractor>,
        deadline: Duration,
    ) -> Crawler {
        Crawler::new(Arc::new(fetcher), extractors, Some(17), 60, deadline)
    }

    fn ids(report: &CrawlReport) -> Vec<&str> {
        report.records.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn ids_follow_source_then_discovery_order() {
        let fetcher = StubFetcher::new()
            .page("https://one.test/", StubPage::Body(THREE_CARDS.into()))
            .page("https://two.test/", StubPage::Body(THREE_CARDS.into()));
        let crawler = crawler(
            fetcher,
            vec![
                extractor("source1", "https://one.test/", 0),
                extractor("source2", "https://two.test/", 0),
            ],
            Duration::from_secs(30),
        );

        let report = crawler.run_on(today()).await;
        assert_eq!(
            ids(&report),
            vec!["source1_1", "source1_2", "source1_3", "source2_1", "source2_2", "source2_3"]
        );
        assert_eq!(report.records[1].title, "베테랑2 포스터 증정");
        assert!(report
            .records
            .windows(2)
            .all(|pair| pair[0].created_at <= pair[1].created_at));
        for record in &report.records {
            assert_eq!(record.validate(today(), 60), Ok(()));
        }
    }

    #[tokio::test]
    async fn failing_source_does_not_block_the_others() {
        let fetcher = StubFetcher::new()
            .page("https://one.test/", StubPage::Status(500))
            .page("https://two.test/", StubPage::Body(THREE_CARDS.into()));
        let crawler = crawler(
            fetcher,
            vec![
                extractor("source1", "https://one.test/", 0),
                extractor("source2", "https://two.test/", 0),
            ],
            Duration::from_secs(30),
        );

        let report = crawler.run_on(today()).await;
        assert_eq!(ids(&report), vec!["source2_1", "source2_2", "source2_3"]);
        assert_eq!(report.sources[0].outcome.pages_failed, 1);
        assert_eq!(report.sources[0].outcome.live, 0);
        assert_eq!(report.sources[1].records, 3);
    }

    #[tokio::test]
    async fn deadline_cuts_off_stuck_sources_but_keeps_finished_ones() {
        let fetcher = StubFetcher::new()
            .page("https://one.test/", StubPage::Hang)
            .page("https://two.test/", StubPage::Body(THREE_CARDS.into()));
        let crawler = crawler(
            fetcher,
            vec![
                extractor("source1", "https://one.test/", 2),
                extractor("source2", "https://two.test/", 0),
            ],
            Duration::from_millis(100),
        );

        let report = crawler.run_on(today()).await;
        assert_eq!(
            ids(&report),
            vec!["source1_1", "source1_2", "source2_1", "source2_2", "source2_3"]
        );
        assert_eq!(report.sources[0].outcome.synthesized, 2);
        assert!(report.records[..2].iter().all(|r| r.validate(today(), 60).is_ok()));
    }

    #[tokio::test]
    async fn same_seed_reproduces_synthesized_fields() {
        let run = || async {
            let fetcher = StubFetcher::new();
            let crawler = crawler(
                fetcher,
                vec![
                    extractor("source1", "https://one.test/", 3),
                    extractor("source2", "https://two.test/", 3),
                ],
                Duration::from_secs(30),
            );
            crawler.run_on(today()).await
        };

        let first = run().await;
        let second = run().await;
        assert_eq!(first.records.len(), 6);
        for (a, b) in first.records.iter().zip(&second.records) {
            assert_eq!(
                (&a.title, a.date, a.genre, &a.location),
                (&b.title, b.date, b.genre, &b.location)
            );
        }
    }

    #[test]
    fn builds_extractors_from_config() {
        let mut config = CrawlConfig::default();
        config.sources.entry("maxmovie".to_string()).or_default().enabled = false;
        let crawler =
            Crawler::from_config(&config, &[], Arc::new(StubFetcher::new())).expect("crawler");
        assert_eq!(crawler.source_ids(), vec!["cgv", "lotte", "megabox"]);
    }
}
