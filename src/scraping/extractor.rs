//! Drives one source through a run: fetch each listing page, cascade,
//! extract every candidate, then top up to the source's floor.
//!
//! Nothing here fails outward. Transport problems, rejected candidates and
//! short yields are logged and counted in [`SourceOutcome`].

use std::sync::Arc;
use std::time::Duration;

use scraper::Html;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::cascade;
use super::fetch::{FetchError, PageFetcher};
use super::synth::{LiveFields, Synthesizer};
use super::validate::TitlePolicy;
use super::{CandidateContext, EventSource, SourceConfig};
use crate::models::EventDraft;

/// Pause between listing pages of the same source, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoliteDelay {
    #[serde(rename = "min")]
    pub min_ms: u64,
    #[serde(rename = "max")]
    pub max_ms: u64,
}

impl Default for PoliteDelay {
    fn default() -> Self {
        Self {
            min_ms: 1000,
            max_ms: 2000,
        }
    }
}

impl PoliteDelay {
    pub fn none() -> Self {
        Self { min_ms: 0, max_ms: 0 }
    }

    fn pick(&self, rng: &mut fastrand::Rng) -> Duration {
        let low = self.min_ms.min(self.max_ms);
        let high = self.min_ms.max(self.max_ms);
        Duration::from_millis(rng.u64(low..=high))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceOutcome {
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub candidates: usize,
    pub rejected: usize,
    pub live: usize,
    pub synthesized: usize,
}

#[derive(Debug, Clone)]
pub struct SourceYield {
    pub source_id: String,
    pub drafts: Vec<EventDraft>,
    pub outcome: SourceOutcome,
}

struct PageYield {
    fields: Vec<LiveFields>,
    candidates: usize,
    rejected: usize,
}

#[derive(Clone)]
pub struct SourceExtractor {
    source: Arc<dyn EventSource>,
    config: SourceConfig,
    policy: TitlePolicy,
    delay: PoliteDelay,
}

impl SourceExtractor {
    pub fn new(
        source: Arc<dyn EventSource>,
        config: SourceConfig,
        policy: TitlePolicy,
        delay: PoliteDelay,
    ) -> Self {
        Self {
            source,
            config,
            policy,
            delay,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.config.profile.id
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub async fn extract(
        &self,
        fetcher: &dyn PageFetcher,
        synth: &mut Synthesizer,
        deadline: Instant,
    ) -> SourceYield {
        let profile = &self.config.profile;
        let mut drafts = Vec::new();
        let mut outcome = SourceOutcome::default();

        for (page, url) in self.config.listing_urls.iter().enumerate() {
            if page > 0 {
                let pause = self.delay.pick(synth.rng());
                tokio::time::sleep_until((Instant::now() + pause).min(deadline)).await;
            }

            let body = match fetch_before(fetcher, url, deadline).await {
                Ok(body) => body,
                Err(err) => {
                    tracing::warn!(source = %profile.id, error = %err, "listing page unavailable");
                    outcome.pages_failed += 1;
                    continue;
                }
            };
            outcome.pages_fetched += 1;

            let page_yield = self.extract_page(&body, synth.today());
            outcome.candidates += page_yield.candidates;
            outcome.rejected += page_yield.rejected;
            for fields in page_yield.fields {
                let ordinal = drafts.len() + 1;
                drafts.push(synth.backfill(fields, profile, ordinal));
            }
        }

        outcome.live = drafts.len();
        outcome.synthesized = synth.top_up(&mut drafts, profile, self.config.floor);
        if outcome.synthesized > 0 {
            tracing::info!(
                source = %profile.id,
                live = outcome.live,
                floor = self.config.floor,
                added = outcome.synthesized,
                "topped up with synthesized events"
            );
        }
        tracing::info!(
            source = %profile.id,
            pages = outcome.pages_fetched,
            failed = outcome.pages_failed,
            candidates = outcome.candidates,
            rejected = outcome.rejected,
            total = drafts.len(),
            "source extraction finished"
        );

        SourceYield {
            source_id: profile.id.clone(),
            drafts,
            outcome,
        }
    }

    fn extract_page(&self, body: &str, today: chrono::NaiveDate) -> PageYield {
        let document = Html::parse_document(body);
        let selection =
            cascade::select(&document, &self.config.strategies, self.config.candidate_cap);
        match selection.strategy {
            Some(index) => tracing::debug!(
                source = %self.config.profile.id,
                strategy = index,
                matched = selection.matched,
                used = selection.candidates.len(),
                "cascade matched"
            ),
            None => {
                tracing::debug!(source = %self.config.profile.id, "no cascade strategy matched")
            }
        }

        let ctx = CandidateContext {
            profile: &self.config.profile,
            policy: &self.policy,
            today,
        };
        let mut fields = Vec::new();
        let mut rejected = 0;
        for element in selection.candidates.iter().copied() {
            match self.source.extract_candidate(element, &ctx) {
                Ok(live) => fields.push(live),
                Err(err) => {
                    tracing::debug!(
                        source = %self.config.profile.id,
                        error = %err,
                        "candidate skipped"
                    );
                    rejected += 1;
                }
            }
        }

        PageYield {
            candidates: selection.candidates.len(),
            fields,
            rejected,
        }
    }
}

async fn fetch_before(
    fetcher: &dyn PageFetcher,
    url: &str,
    deadline: Instant,
) -> Result<String, FetchError> {
    match tokio::time::timeout_at(deadline, fetcher.fetch(url)).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Deadline {
            url: url.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventKind, Genre};
    use crate::scraping::cgv_html::Cgv;
    use crate::scraping::synth::GENERIC_VENUES;
    use crate::testing::{StubFetcher, StubPage};
    use chrono::{NaiveDate, Utc};

    const LISTING_HTML: &str = r#"
    <div class="event_card"><a href="/e/1"><strong>베놈 라스트 댄스 4DX 시사회</strong></a></div>
    <div class="event_card"><a href="/e/2"><strong>고객센터 운영 안내</strong></a></div>
    <div class="event_card"><a href="/e/3"><strong>와일드 로봇 포토카드 증정</strong></a></div>
    "#;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).expect("today")
    }

    fn synth(seed: u64) -> Synthesizer {
        Synthesizer::new(fastrand::Rng::with_seed(seed), today(), 60)
    }

    fn extractor(listing_urls: Vec<&str>, floor: usize) -> SourceExtractor {
        paced_extractor(listing_urls, floor, PoliteDelay::none())
    }

    fn paced_extractor(
        listing_urls: Vec<&str>,
        floor: usize,
        delay: PoliteDelay,
    ) -> SourceExtractor {
        let mut config = Cgv.defaults();
        config.listing_urls = listing_urls.into_iter().map(str::to_string).collect();
        config.floor = floor;
        SourceExtractor::new(Arc::new(Cgv), config, TitlePolicy::default(), delay)
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(30)
    }

    #[tokio::test]
    async fn floor_is_met_with_zero_live_candidates() {
        let fetcher = StubFetcher::new()
            .page("https://cgv.test/list", StubPage::Body("<html></html>".into()));
        let extractor = extractor(vec!["https://cgv.test/list"], 15);
        let mut synth = synth(3);

        let result = extractor.extract(&fetcher, &mut synth, far_deadline()).await;
        assert_eq!(result.drafts.len(), 15);
        assert_eq!(result.outcome.live, 0);
        assert_eq!(result.outcome.synthesized, 15);

        let venues = &extractor.config().profile.venues;
        for (index, draft) in result.drafts.into_iter().enumerate() {
            assert!(
                venues.contains(&draft.location)
                    || GENERIC_VENUES.contains(&draft.location.as_str())
            );
            assert!(EventKind::ALL.contains(&draft.kind));
            assert!(Genre::ALL.contains(&draft.genre));
            let record = draft.into_record(format!("cgv_{}", index + 1), Utc::now());
            assert_eq!(record.validate(today(), 60), Ok(()));
        }
    }

    #[tokio::test]
    async fn keeps_discovery_order_and_skips_rejected_candidates() {
        let fetcher = StubFetcher::new()
            .page("https://cgv.test/list", StubPage::Body(LISTING_HTML.into()));
        let extractor = extractor(vec!["https://cgv.test/list"], 0);
        let mut synth = synth(5);

        let result = extractor.extract(&fetcher, &mut synth, far_deadline()).await;
        let titles: Vec<_> = result.drafts.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["베놈 라스트 댄스 4DX 시사회", "와일드 로봇 포토카드 증정"]);
        assert_eq!(result.drafts[0].link, "https://www.cgv.co.kr/e/1");
        assert_eq!(result.drafts[1].image, "https://picsum.photos/300/200?random=2");
        assert_eq!(
            result.outcome,
            SourceOutcome {
                pages_fetched: 1,
                pages_failed: 0,
                candidates: 3,
                rejected: 1,
                live: 2,
                synthesized: 0,
            }
        );
    }

    #[tokio::test]
    async fn failed_pages_do_not_stop_later_pages() {
        let fetcher = StubFetcher::new()
            .page("https://cgv.test/a", StubPage::Status(500))
            .page("https://cgv.test/b", StubPage::Body(LISTING_HTML.into()));
        let extractor = extractor(vec!["https://cgv.test/a", "https://cgv.test/b"], 4);
        let mut synth = synth(8);

        let result = extractor.extract(&fetcher, &mut synth, far_deadline()).await;
        assert_eq!(result.outcome.pages_failed, 1);
        assert_eq!(result.outcome.pages_fetched, 1);
        assert_eq!(result.outcome.live, 2);
        assert_eq!(result.outcome.synthesized, 2);
        assert!(!result.drafts[1].synthetic);
        assert!(result.drafts[2].synthetic);
        let filler = &result.drafts[2];
        assert_eq!(filler.title, format!("CGV {} 특별 상영회 3", filler.kind.label_ko()));
    }

    #[tokio::test]
    async fn deadline_turns_hanging_fetches_into_failures() {
        let fetcher = StubFetcher::new().page("https://cgv.test/slow", StubPage::Hang);
        let extractor = extractor(vec!["https://cgv.test/slow"], 2);
        let mut synth = synth(11);

        let deadline = Instant::now() + Duration::from_millis(50);
        let result = extractor.extract(&fetcher, &mut synth, deadline).await;
        assert_eq!(result.outcome.pages_failed, 1);
        assert_eq!(result.drafts.len(), 2);
        assert!(result.drafts.iter().all(|d| d.synthetic));
    }

    fn two_page_fetcher() -> StubFetcher {
        StubFetcher::new()
            .page("https://cgv.test/a", StubPage::Body(LISTING_HTML.into()))
            .page("https://cgv.test/b", StubPage::Body(LISTING_HTML.into()))
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_within_bounds_between_pages_only() {
        let delay = PoliteDelay {
            min_ms: 1000,
            max_ms: 2000,
        };
        let deadline = Instant::now() + Duration::from_secs(60);

        let single = paced_extractor(vec!["https://cgv.test/a"], 0, delay);
        let start = Instant::now();
        single.extract(&two_page_fetcher(), &mut synth(21), deadline).await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        let paged = paced_extractor(vec!["https://cgv.test/a", "https://cgv.test/b"], 0, delay);
        let start = Instant::now();
        let result = paged.extract(&two_page_fetcher(), &mut synth(21), deadline).await;
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(1000), "waited {waited:?}");
        assert!(waited <= Duration::from_millis(2000), "waited {waited:?}");
        assert_eq!(result.outcome.pages_fetched, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_is_clamped_to_the_run_deadline() {
        let delay = PoliteDelay {
            min_ms: 1000,
            max_ms: 2000,
        };
        let paged = paced_extractor(vec!["https://cgv.test/a", "https://cgv.test/b"], 0, delay);
        let start = Instant::now();
        let deadline = start + Duration::from_millis(300);

        let result = paged.extract(&two_page_fetcher(), &mut synth(4), deadline).await;
        assert_eq!(start.elapsed(), Duration::from_millis(300));
        assert_eq!(result.outcome.pages_fetched + result.outcome.pages_failed, 2);
        assert!(result.outcome.pages_fetched >= 1);
    }
}
