use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Premiere,
    MerchGiveaway,
    Promotion,
    Experience,
    General,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Premiere,
        EventKind::MerchGiveaway,
        EventKind::Promotion,
        EventKind::Experience,
        EventKind::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Premiere => "premiere",
            EventKind::MerchGiveaway => "merch-giveaway",
            EventKind::Promotion => "promotion",
            EventKind::Experience => "experience",
            EventKind::General => "general",
        }
    }

    /// Label used inside synthesized Korean titles.
    pub fn label_ko(&self) -> &'static str {
        match self {
            EventKind::Premiere => "시사회",
            EventKind::MerchGiveaway => "굿즈배포",
            EventKind::Promotion => "프로모션",
            EventKind::Experience => "체험",
            EventKind::General => "행사",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Genre {
    Action,
    Romance,
    Drama,
    Comedy,
    Thriller,
    SciFi,
    Horror,
    Animation,
}

impl Genre {
    pub const ALL: [Genre; 8] = [
        Genre::Action,
        Genre::Romance,
        Genre::Drama,
        Genre::Comedy,
        Genre::Thriller,
        Genre::SciFi,
        Genre::Horror,
        Genre::Animation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Action => "action",
            Genre::Romance => "romance",
            Genre::Drama => "drama",
            Genre::Comedy => "comedy",
            Genre::Thriller => "thriller",
            Genre::SciFi => "sci-fi",
            Genre::Horror => "horror",
            Genre::Animation => "animation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|genre| genre.as_str() == value)
    }
}

/// A record as produced by a source extractor, before the orchestrator
/// assigns its id and creation stamp.
#[derive(Clone, Debug)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub date_scraped: bool,
    pub location: String,
    pub kind: EventKind,
    pub genre: Genre,
    pub image: String,
    pub source: String,
    pub link: String,
    pub synthetic: bool,
}

impl EventDraft {
    pub fn into_record(self, id: String, created_at: DateTime<Utc>) -> EventRecord {
        EventRecord {
            id,
            title: self.title,
            description: self.description,
            date: self.date,
            location: self.location,
            kind: self.kind,
            genre: self.genre,
            image: self.image,
            source: self.source,
            link: self.link,
            created_at,
            date_scraped: self.date_scraped,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EventRecord {
    pub id: String, // <source-tag>_<n>
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub location: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub genre: Genre,
    pub image: String,
    pub source: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub date_scraped: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("malformed id: {0}")]
    Id(String),
    #[error("title too short: {0:?}")]
    Title(String),
    #[error("empty description")]
    Description,
    #[error("date {date} outside [{earliest}, {latest}]")]
    Date {
        date: NaiveDate,
        earliest: NaiveDate,
        latest: NaiveDate,
    },
    #[error("not an absolute http(s) url in {field}: {value}")]
    Url { field: &'static str, value: String },
    #[error("empty {0}")]
    Empty(&'static str),
}

pub const MIN_TITLE_CHARS: usize = 5;

impl EventRecord {
    /// Checks the field invariants of a finished record. Scraped dates are
    /// taken verbatim and are not range checked.
    pub fn validate(&self, today: NaiveDate, window_days: u32) -> Result<(), RecordError> {
        let counter = self
            .id
            .rsplit_once('_')
            .filter(|(tag, _)| !tag.is_empty())
            .and_then(|(_, n)| n.parse::<u32>().ok());
        if !matches!(counter, Some(n) if n >= 1) {
            return Err(RecordError::Id(self.id.clone()));
        }
        if self.title.trim().chars().count() < MIN_TITLE_CHARS {
            return Err(RecordError::Title(self.title.clone()));
        }
        if self.description.trim().is_empty() {
            return Err(RecordError::Description);
        }
        if !self.date_scraped {
            let earliest = today + Duration::days(1);
            let latest = today + Duration::days(i64::from(window_days));
            if self.date < earliest || self.date > latest {
                return Err(RecordError::Date {
                    date: self.date,
                    earliest,
                    latest,
                });
            }
        }
        if self.location.trim().is_empty() {
            return Err(RecordError::Empty("location"));
        }
        if self.source.trim().is_empty() {
            return Err(RecordError::Empty("source"));
        }
        for (field, value) in [("image", &self.image), ("link", &self.link)] {
            if !is_http_url(value) {
                return Err(RecordError::Url {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

pub fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty())
}
