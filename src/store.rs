use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::models::{is_http_url, EventKind, EventRecord, Genre, MIN_TITLE_CHARS};
use crate::scraping::{self, synth};
use crate::utils;

pub const EVENTS_JSON: &str = "events.json";
pub const EVENTS_CSV: &str = "events.csv";

const CSV_HEADER: [&str; 11] = [
    "id",
    "title",
    "description",
    "date",
    "location",
    "type",
    "genre",
    "image",
    "source",
    "link",
    "created_at",
];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error at {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to encode events: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("malformed {path:?}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("rejected entry: {0}")]
    Entry(#[from] EntryError),
}

#[derive(Debug, Error, PartialEq)]
pub enum EntryError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("title needs at least {0} characters")]
    ShortTitle(usize),
    #[error("not an absolute http(s) url in {field}: {value}")]
    Url { field: &'static str, value: String },
    #[error("no link given and {0:?} is not a known source")]
    NoLink(String),
}

/// A hand-entered event. Optional fields fall back to the same defaults a
/// crawl uses.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub location: String,
    pub kind: EventKind,
    pub genre: Genre,
    pub image: Option<String>,
    pub source: String,
    pub link: Option<String>,
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone)]
pub struct Saved {
    pub json: PathBuf,
    pub csv: Option<PathBuf>,
}

/// Writes the feed into `dir`, replacing any previous run's files.
pub fn save(records: &[EventRecord], dir: &Path, with_csv: bool) -> Result<Saved, StoreError> {
    utils::ensure_dir(dir).map_err(io_error(dir))?;

    let json = dir.join(EVENTS_JSON);
    let payload = serde_json::to_string_pretty(records)?;
    fs::write(&json, payload).map_err(io_error(&json))?;
    tracing::info!(path = %json.display(), records = records.len(), "wrote event feed");

    let csv = if with_csv {
        let path = dir.join(EVENTS_CSV);
        let mut buf: Vec<u8> = Vec::new();
        write_csv(&mut buf, records).map_err(io_error(&path))?;
        fs::write(&path, buf).map_err(io_error(&path))?;
        tracing::info!(path = %path.display(), "wrote tabular projection");
        Some(path)
    } else {
        None
    };

    Ok(Saved { json, csv })
}

pub fn load(dir: &Path) -> Result<Vec<EventRecord>, StoreError> {
    let path = dir.join(EVENTS_JSON);
    let contents = fs::read_to_string(&path).map_err(io_error(&path))?;
    serde_json::from_str(&contents).map_err(|source| StoreError::Decode { path, source })
}

fn load_or_empty(dir: &Path) -> Result<Vec<EventRecord>, StoreError> {
    if dir.join(EVENTS_JSON).exists() {
        load(dir)
    } else {
        Ok(Vec::new())
    }
}

fn checked_url(field: &'static str, value: Option<String>) -> Result<Option<String>, EntryError> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(url) if !is_http_url(&url) => Err(EntryError::Url { field, value: url }),
        other => Ok(other),
    }
}

/// Adds one hand-entered event to the feed in `dir` as `event_<n>`.
/// The tabular projection is left alone; the next crawl rewrites it.
pub fn append(dir: &Path, entry: NewEvent) -> Result<EventRecord, StoreError> {
    let title = entry.title.trim().to_string();
    if title.is_empty() {
        return Err(EntryError::Missing("title").into());
    }
    if title.chars().count() < MIN_TITLE_CHARS {
        return Err(EntryError::ShortTitle(MIN_TITLE_CHARS).into());
    }
    let location = entry.location.trim().to_string();
    if location.is_empty() {
        return Err(EntryError::Missing("location").into());
    }
    let source = entry.source.trim().to_string();
    if source.is_empty() {
        return Err(EntryError::Missing("source").into());
    }
    let image = checked_url("image", entry.image)?;
    let link = match checked_url("link", entry.link)? {
        Some(link) => link,
        None => scraping::event_root_for(&source)
            .ok_or_else(|| EntryError::NoLink(source.clone()))?,
    };

    let mut records = load_or_empty(dir)?;
    let counter = records
        .iter()
        .filter_map(|record| record.id.strip_prefix("event_")?.parse::<usize>().ok())
        .max()
        .unwrap_or(0)
        + 1;
    let created_at = match records.iter().map(|record| record.created_at).max() {
        Some(latest) => Utc::now().max(latest),
        None => Utc::now(),
    };

    let record = EventRecord {
        id: format!("event_{counter}"),
        description: entry
            .description
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| synth::templated_description(&title, &source)),
        date: entry.date,
        location,
        kind: entry.kind,
        genre: entry.genre,
        image: image.unwrap_or_else(|| synth::placeholder_image(counter)),
        source,
        link,
        created_at,
        title,
        // entered dates are taken as given, like scraped ones
        date_scraped: true,
    };
    records.push(record.clone());

    utils::ensure_dir(dir).map_err(io_error(dir))?;
    let json = dir.join(EVENTS_JSON);
    fs::write(&json, serde_json::to_string_pretty(&records)?).map_err(io_error(&json))?;
    tracing::info!(id = %record.id, path = %json.display(), "appended event");
    Ok(record)
}

/// UTF-8 with a byte-order mark so spreadsheet tools pick the right
/// encoding for Korean text.
pub fn write_csv<W: Write>(mut w: W, records: &[EventRecord]) -> io::Result<()> {
    w.write_all("\u{feff}".as_bytes())?;
    write_row(&mut w, &CSV_HEADER.map(String::from))?;
    for record in records {
        let row = [
            record.id.clone(),
            record.title.clone(),
            record.description.clone(),
            record.date.format("%Y-%m-%d").to_string(),
            record.location.clone(),
            record.kind.as_str().to_string(),
            record.genre.as_str().to_string(),
            record.image.clone(),
            record.source.clone(),
            record.link.clone(),
            record.created_at.to_rfc3339(),
        ];
        write_row(&mut w, &row)?;
    }
    Ok(())
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write>(mut w: W, row: &[String]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, ",")?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{cell}")?;
        }
    }
    write!(w, "\r\n")
}
