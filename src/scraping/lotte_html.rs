use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

use super::cascade::Strategy;
use super::synth::LiveFields;
use super::{base, urls};
use super::{CandidateContext, CandidateError, EventSource, SourceConfig};

const SOURCE_ID: &str = "lotte";
const BRAND: &str = "롯데시네마";
const BASE_URL: &str = "https://www.lottecinema.co.kr";
const EVENT_ROOT: &str = "https://www.lottecinema.co.kr";
const LISTING_URL: &str = "https://www.lottecinema.co.kr/NLCHS/Event";
const VENUES: [&str; 5] = [
    "롯데시네마 홍대",
    "롯데시네마 신촌",
    "롯데시네마 잠실",
    "롯데시네마 광주",
    "롯데시네마 부산",
];

static TITLE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["p.tit", "strong", "h3", "h2", "span.title", "a"]
        .iter()
        .map(|css| Selector::parse(css).expect("lotte title selector"))
        .collect()
});

// Most of the event listing is rendered by script; only the static
// fallback markup is reachable without a browser.
pub struct LotteCinema;

impl EventSource for LotteCinema {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    fn brand(&self) -> &'static str {
        BRAND
    }

    fn defaults(&self) -> SourceConfig {
        SourceConfig {
            profile: super::profile(SOURCE_ID, BRAND, BASE_URL, EVENT_ROOT, &VENUES, 100),
            listing_urls: vec![LISTING_URL.to_string()],
            strategies: vec![
                Strategy::class("li", "event-item"),
                Strategy::class("div", "event-item"),
                Strategy::tag("article"),
                Strategy::href_contains("a", &["Event", "Detail"]),
            ],
            candidate_cap: 10,
            floor: 4,
        }
    }

    fn extract_candidate(
        &self,
        element: ElementRef<'_>,
        ctx: &CandidateContext<'_>,
    ) -> Result<LiveFields, CandidateError> {
        let title = base::pick_title(&element, &TITLE_SELECTORS, ctx.policy)
            .ok_or(CandidateError::NoTitle)?;
        Ok(LiveFields {
            title,
            description: None,
            date: base::scraped_date(&element, ctx.today),
            image: urls::image_url(&element, &ctx.profile.base_url),
            link: urls::link_url(&element, &ctx.profile.base_url),
        })
    }
}
