//! Backfill for fields the markup does not carry, and whole placeholder
//! records for sources whose live yield falls below their floor.

use chrono::{Duration, NaiveDate};
use fastrand::Rng;

use super::SourceProfile;
use crate::models::{EventDraft, EventKind, Genre};

pub const DEFAULT_DATE_WINDOW_DAYS: u32 = 60;

/// Venues used for records that do not come from any listing.
pub const GENERIC_VENUES: &[&str] = &["강남", "홍대", "신촌", "잠실", "부산", "대구", "광주"];

pub fn placeholder_image(counter: usize) -> String {
    format!("https://picsum.photos/300/200?random={counter}")
}

pub fn templated_description(title: &str, brand: &str) -> String {
    format!("{title} - {brand}에서 진행되는 특별한 이벤트입니다.")
}

/// Values recovered from one candidate; anything missing is backfilled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveFields {
    pub title: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub image: Option<String>,
    pub link: Option<String>,
}

pub struct Synthesizer {
    rng: Rng,
    today: NaiveDate,
    window_days: u32,
}

impl Synthesizer {
    pub fn new(rng: Rng, today: NaiveDate, window_days: u32) -> Self {
        Self {
            rng,
            today,
            window_days: window_days.max(1),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    pub fn rng(&mut self) -> &mut Rng {
        &mut self.rng
    }

    pub fn date(&mut self) -> NaiveDate {
        let offset = self.rng.u32(1..=self.window_days);
        self.today + Duration::days(i64::from(offset))
    }

    pub fn kind(&mut self) -> EventKind {
        EventKind::ALL[self.rng.usize(..EventKind::ALL.len())]
    }

    pub fn genre(&mut self) -> Genre {
        Genre::ALL[self.rng.usize(..Genre::ALL.len())]
    }

    fn pick(&mut self, options: &[String], fallback: &[&str]) -> String {
        if options.is_empty() {
            return fallback[self.rng.usize(..fallback.len())].to_string();
        }
        options[self.rng.usize(..options.len())].clone()
    }

    /// Completes a live candidate. `ordinal` is its 1-based position in the
    /// source's output and drives the placeholder image.
    pub fn backfill(
        &mut self,
        live: LiveFields,
        profile: &SourceProfile,
        ordinal: usize,
    ) -> EventDraft {
        let description = live
            .description
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| templated_description(&live.title, &profile.brand));
        let (date, date_scraped) = match live.date {
            Some(date) => (date, true),
            None => (self.date(), false),
        };

        EventDraft {
            location: self.pick(&profile.venues, GENERIC_VENUES),
            kind: self.kind(),
            genre: self.genre(),
            image: live
                .image
                .unwrap_or_else(|| placeholder_image(profile.placeholder_offset + ordinal)),
            link: live.link.unwrap_or_else(|| profile.event_root.clone()),
            source: profile.brand.clone(),
            title: live.title,
            description,
            date,
            date_scraped,
            synthetic: false,
        }
    }

    /// A fully synthetic record standing in for missing live yield.
    pub fn placeholder(&mut self, profile: &SourceProfile, ordinal: usize) -> EventDraft {
        let kind = self.kind();
        let title = format!("{} {} 특별 상영회 {}", profile.brand, kind.label_ko(), ordinal);
        EventDraft {
            description: templated_description(&title, &profile.brand),
            date: self.date(),
            date_scraped: false,
            location: self.pick(&[], GENERIC_VENUES),
            kind,
            genre: self.genre(),
            image: placeholder_image(profile.placeholder_offset + ordinal),
            source: profile.brand.clone(),
            link: profile.event_root.clone(),
            title,
            synthetic: true,
        }
    }

    /// Appends placeholders until `drafts` holds at least `floor` records.
    /// Returns how many were added.
    pub fn top_up(
        &mut self,
        drafts: &mut Vec<EventDraft>,
        profile: &SourceProfile,
        floor: usize,
    ) -> usize {
        let missing = floor.saturating_sub(drafts.len());
        for _ in 0..missing {
            let ordinal = drafts.len() + 1;
            drafts.push(self.placeholder(profile, ordinal));
        }
        missing
    }
}
