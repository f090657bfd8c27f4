use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

use super::validate::{accept_title, TitlePolicy};

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})\s*[./\-년]\s*(\d{1,2})\s*[./\-월]\s*(\d{1,2})").expect("valid date regex")
});
static SHORT_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})\s*[./]\s*(\d{1,2})").expect("valid short date regex"));
static DATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span.date, div.date").expect("date selector"));

pub fn clean_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

pub fn inner_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

pub fn first_text(element: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(inner_text)
        .filter(|text| !text.is_empty())
}

/// Each non-blank text node of the element, in document order.
pub fn text_lines(element: &ElementRef<'_>) -> Vec<String> {
    element
        .text()
        .map(clean_text)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Tries each title selector inside the candidate and returns the first text
/// that passes title acceptance, then falls back to the candidate's own text
/// nodes.
pub fn pick_title(
    element: &ElementRef<'_>,
    selectors: &[Selector],
    policy: &TitlePolicy,
) -> Option<String> {
    for selector in selectors {
        if let Some(text) = first_text(element, selector) {
            if let Ok(title) = accept_title(&text, policy) {
                return Some(title);
            }
        }
    }
    text_lines(element)
        .iter()
        .find_map(|line| accept_title(line, policy).ok())
}

pub fn scraped_date(element: &ElementRef<'_>, today: NaiveDate) -> Option<NaiveDate> {
    first_text(element, &DATE_SELECTOR).and_then(|text| parse_naive_date(&text, today))
}

/// Reads the first calendar date in `input`. Dates without a year are placed
/// in the current year, or next year when that day has already passed.
pub fn parse_naive_date(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let cleaned = clean_text(input);
    if cleaned.is_empty() {
        return None;
    }

    if let Some(caps) = DATE_RE.captures(&cleaned) {
        let year = caps.get(1)?.as_str().parse().ok()?;
        let month = caps.get(2)?.as_str().parse().ok()?;
        let day = caps.get(3)?.as_str().parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let caps = SHORT_DATE_RE.captures(&cleaned)?;
    let month = caps.get(1)?.as_str().parse().ok()?;
    let day = caps.get(2)?.as_str().parse().ok()?;
    let date = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    if date < today {
        return date.with_year(today.year() + 1);
    }
    Some(date)
}
