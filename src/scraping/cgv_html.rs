use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

use super::cascade::Strategy;
use super::synth::LiveFields;
use super::{base, urls};
use super::{CandidateContext, CandidateError, EventSource, SourceConfig};

const SOURCE_ID: &str = "cgv";
const BRAND: &str = "CGV";
const BASE_URL: &str = "https://www.cgv.co.kr";
const EVENT_ROOT: &str = "https://www.cgv.co.kr/event";
const LISTING_URLS: [&str; 2] = [
    "http://www.cgv.co.kr/event/eventList.aspx",
    "http://www.cgv.co.kr/culture-event/event/",
];
const VENUES: [&str; 6] = ["CGV 강남", "CGV 잠실", "CGV 홍대", "CGV 신촌", "CGV 부산", "CGV 대구"];

static TITLE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "h3", "h2", "h1", "strong", "span.title", "div.title", "p.title", "a", ".event-title",
    ]
    .iter()
    .map(|css| Selector::parse(css).expect("cgv title selector"))
    .collect()
});

pub struct Cgv;

impl EventSource for Cgv {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    fn brand(&self) -> &'static str {
        BRAND
    }

    fn defaults(&self) -> SourceConfig {
        SourceConfig {
            profile: super::profile(SOURCE_ID, BRAND, BASE_URL, EVENT_ROOT, &VENUES, 0),
            listing_urls: LISTING_URLS.iter().map(|u| u.to_string()).collect(),
            strategies: vec![
                Strategy::class("div", "event_card"),
                Strategy::class("div", "event-item"),
                Strategy::class("li", "event-list"),
                Strategy::class("div", "event"),
                Strategy::tag("article"),
                Strategy::href_contains("a", &["event", "detail"]),
            ],
            candidate_cap: 8,
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
