use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

use super::cascade::Strategy;
use super::synth::LiveFields;
use super::{base, urls};
use super::{CandidateContext, CandidateError, EventSource, SourceConfig};

const SOURCE_ID: &str = "megabox";
const BRAND: &str = "메가박스";
const BASE_URL: &str = "https://www.megabox.co.kr";
const EVENT_ROOT: &str = "https://www.megabox.co.kr";
const LISTING_URL: &str = "https://www.megabox.co.kr/event/curtaincall";
const VENUES: [&str; 5] = [
    "메가박스 코엑스",
    "메가박스 강남",
    "메가박스 홍대",
    "메가박스 부산",
    "메가박스 대구",
];

static TITLE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "h3", "h2", "h1", "strong", "span.title", "div.title", "p.title", "a", ".event-title",
        "p.name",
    ]
    .iter()
    .map(|css| Selector::parse(css).expect("megabox title selector"))
    .collect()
});

pub struct Megabox;

impl EventSource for Megabox {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    fn brand(&self) -> &'static str {
        BRAND
    }

    fn defaults(&self) -> SourceConfig {
        SourceConfig {
            profile: super::profile(SOURCE_ID, BRAND, BASE_URL, EVENT_ROOT, &VENUES, 200),
            listing_urls: vec![LISTING_URL.to_string()],
            strategies: vec![
                Strategy::class("div", "event-item"),
                Strategy::class("li", "event-list"),
                Strategy::class("div", "event"),
                Strategy::tag("article"),
                Strategy::href_contains("a", &["event"]),
                Strategy::class("div", "event-slider"),
            ],
            candidate_cap: 10,
            floor: 5,
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
