use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};

use super::cascade::Strategy;
use super::synth::LiveFields;
use super::validate::accept_title;
use super::{base, urls};
use super::{CandidateContext, CandidateError, EventSource, SourceConfig};

const SOURCE_ID: &str = "maxmovie";
const BRAND: &str = "MaxMovie";
const BASE_URL: &str = "https://www.maxmovie.com";
const EVENT_ROOT: &str = "https://www.maxmovie.com/event";
const LISTING_URL: &str = "https://www.maxmovie.com/event";
const VENUES: [&str; 4] = ["MaxMovie 온라인", "MaxMovie 앱", "MaxMovie 웹사이트", "전국 영화관"];

static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h3").expect("maxmovie heading selector"));
static DESCRIPTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p, div.description").expect("maxmovie description selector"));

/// Event cards are headed by an `h3`; the listing is often nothing but the
/// headings themselves.
pub struct MaxMovie;

impl EventSource for MaxMovie {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    fn brand(&self) -> &'static str {
        BRAND
    }

    fn defaults(&self) -> SourceConfig {
        SourceConfig {
            profile: super::profile(SOURCE_ID, BRAND, BASE_URL, EVENT_ROOT, &VENUES, 300),
            listing_urls: vec![LISTING_URL.to_string()],
            strategies: vec![
                Strategy::tag("h3"),
                Strategy::class("article", "eventWrap"),
                Strategy::class("li", "EventData__EventDataBlock-sc-1jd0eu4-0"),
                Strategy::class("div", "event-item"),
                Strategy::href_contains("a", &["event"]),
            ],
            candidate_cap: 15,
            floor: 3,
        }
    }

    fn extract_candidate(
        &self,
        element: ElementRef<'_>,
        ctx: &CandidateContext<'_>,
    ) -> Result<LiveFields, CandidateError> {
        let raw_title = if element.value().name() == "h3" {
            base::inner_text(element)
        } else {
            base::first_text(&element, &HEADING_SELECTOR)
                .unwrap_or_else(|| base::inner_text(element))
        };
        let title = accept_title(&raw_title, ctx.policy)?;

        Ok(LiveFields {
            title,
            description: base::first_text(&element, &DESCRIPTION_SELECTOR),
            date: base::scraped_date(&element, ctx.today),
            image: urls::image_url(&element, &ctx.profile.base_url),
            link: urls::link_url(&element, &ctx.profile.base_url),
        })
    }
}
