use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::models::is_http_url;

static BACKGROUND_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"background-image:\s*url\(["']?([^"')]+)["']?\)"#).expect("background image regex")
});
static SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("scheme regex"));
static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("img selector"));
static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("a selector"));

/// Makes `raw` absolute against `base` by plain prefixing; no path
/// canonicalization happens.
pub fn resolve(raw: &str, base: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if SCHEME_RE.is_match(raw) {
        return Some(raw.to_string());
    }
    if let Some(rest) = raw.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    Some(format!("{base}{raw}"))
}

pub fn background_image(style: &str) -> Option<&str> {
    BACKGROUND_IMAGE_RE
        .captures(style)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|value| !value.is_empty())
}

/// First nested `img` (`src`, then `data-src`), then the element's own
/// inline background image.
pub fn image_url(element: &ElementRef<'_>, base: &str) -> Option<String> {
    let from_img = element.select(&IMG_SELECTOR).next().and_then(|img| {
        let attrs = img.value();
        [attrs.attr("src"), attrs.attr("data-src")]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())
    });

    let raw = from_img.or_else(|| element.value().attr("style").and_then(background_image))?;
    resolve(raw, base).filter(|url| is_http_url(url))
}

/// The candidate's own `href` when it is an anchor, otherwise the first
/// nested anchor. Non-navigable targets yield `None`.
pub fn link_url(element: &ElementRef<'_>, base: &str) -> Option<String> {
    let href = if element.value().name() == "a" {
        element.value().attr("href")
    } else {
        element
            .select(&ANCHOR_SELECTOR)
            .next()
            .and_then(|anchor| anchor.value().attr("href"))
    }?;
    if href.trim_start().starts_with('#') {
        return None;
    }
    resolve(href, base).filter(|url| is_http_url(url))
}
