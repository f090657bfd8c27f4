pub mod base;
pub mod cascade;
pub mod cgv_html;
pub mod extractor;
pub mod fetch;
pub mod lotte_html;
pub mod maxmovie_html;
pub mod megabox_html;
pub mod synth;
pub mod urls;
pub mod validate;

use std::sync::Arc;

use chrono::NaiveDate;
use scraper::ElementRef;
use thiserror::Error;

use cascade::Strategy;
use synth::LiveFields;
use validate::{TitlePolicy, TitleRejection};

/// Fixed facts about a source used when assembling its records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceProfile {
    pub id: String,
    pub brand: String,
    pub base_url: String,
    /// Listing root used as the link when a candidate has none.
    pub event_root: String,
    pub venues: Vec<String>,
    pub placeholder_offset: usize,
}

#[derive(Clone, Debug)]
pub struct SourceConfig {
    pub profile: SourceProfile,
    pub listing_urls: Vec<String>,
    pub strategies: Vec<Strategy>,
    /// Candidates consumed per listing page.
    pub candidate_cap: usize,
    /// Minimum records the source contributes per run.
    pub floor: usize,
}

pub struct CandidateContext<'a> {
    pub profile: &'a SourceProfile,
    pub policy: &'a TitlePolicy,
    pub today: NaiveDate,
}

#[derive(Debug, Error, PartialEq)]
pub enum CandidateError {
    #[error("no acceptable title")]
    NoTitle,
    #[error("title rejected: {0}")]
    Rejected(#[from] TitleRejection),
}

pub trait EventSource: Send + Sync {
    fn id(&self) -> &'static str;
    fn brand(&self) -> &'static str;
    fn defaults(&self) -> SourceConfig;
    fn extract_candidate(
        &self,
        element: ElementRef<'_>,
        ctx: &CandidateContext<'_>,
    ) -> Result<LiveFields, CandidateError>;
}

#[derive(Clone, serde::Serialize)]
pub struct SourceInfo {
    pub id: String,
    pub brand: String,
    pub listing_urls: Vec<String>,
    pub floor: usize,
}

/// Sources in output order.
pub fn active_sources() -> Vec<Arc<dyn EventSource>> {
    vec![
        Arc::new(cgv_html::Cgv),
        Arc::new(lotte_html::LotteCinema),
        Arc::new(megabox_html::Megabox),
        Arc::new(maxmovie_html::MaxMovie),
    ]
}

pub fn find_source(id: &str) -> Option<Arc<dyn EventSource>> {
    active_sources().into_iter().find(|source| source.id() == id)
}

/// Listing root of the source whose id or brand matches `label`.
pub fn event_root_for(label: &str) -> Option<String> {
    let label = label.trim();
    active_sources()
        .into_iter()
        .find(|source| source.id().eq_ignore_ascii_case(label) || source.brand() == label)
        .map(|source| source.defaults().profile.event_root)
}

pub fn profile(
    id: &str,
    brand: &str,
    base_url: &str,
    event_root: &str,
    venues: &[&str],
    offset: usize,
) -> SourceProfile {
    SourceProfile {
        id: id.to_string(),
        brand: brand.to_string(),
        base_url: base_url.to_string(),
        event_root: event_root.to_string(),
        venues: venues.iter().map(|v| v.to_string()).collect(),
        placeholder_offset: offset,
    }
}
