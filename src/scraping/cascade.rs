//! Ordered-fallback candidate selection.
//!
//! A source lists its strategies from most to least specific. The first
//! strategy that matches anything wins and later strategies are never
//! consulted, even when every winning candidate is later rejected.

use scraper::{CaseSensitivity, ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttrPredicate {
    #[default]
    Any,
    /// Element class list contains `name`.
    Class { name: String },
    /// `href` is present and contains every fragment.
    HrefContains { fragments: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    pub tag: String,
    #[serde(default)]
    pub predicate: AttrPredicate,
}

impl Strategy {
    pub fn tag(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            predicate: AttrPredicate::Any,
        }
    }

    pub fn class(tag: &str, name: &str) -> Self {
        Self {
            tag: tag.to_string(),
            predicate: AttrPredicate::Class {
                name: name.to_string(),
            },
        }
    }

    pub fn href_contains(tag: &str, fragments: &[&str]) -> Self {
        Self {
            tag: tag.to_string(),
            predicate: AttrPredicate::HrefContains {
                fragments: fragments.iter().map(|f| f.to_string()).collect(),
            },
        }
    }

    fn selector(&self) -> Result<Selector, CascadeError> {
        let tag = self.tag.trim();
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(CascadeError::InvalidTag(self.tag.clone()));
        }
        Selector::parse(tag).map_err(|_| CascadeError::InvalidTag(self.tag.clone()))
    }

    fn matches(&self, element: &ElementRef<'_>) -> bool {
        match &self.predicate {
            AttrPredicate::Any => true,
            AttrPredicate::Class { name } => element
                .value()
                .has_class(name, CaseSensitivity::CaseSensitive),
            AttrPredicate::HrefContains { fragments } => element
                .value()
                .attr("href")
                .is_some_and(|href| fragments.iter().all(|f| href.contains(f.as_str()))),
        }
    }

    pub fn evaluate<'a>(&self, document: &'a Html) -> Result<Vec<ElementRef<'a>>, CascadeError> {
        let selector = self.selector()?;
        Ok(document
            .select(&selector)
            .filter(|element| self.matches(element))
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CascadeError {
    #[error("strategy tag {0:?} is not a valid element name")]
    InvalidTag(String),
}

pub struct Selection<'a> {
    /// Index of the winning strategy, if any matched.
    pub strategy: Option<usize>,
    /// Matches of the winning strategy before the cap was applied.
    pub matched: usize,
    pub candidates: Vec<ElementRef<'a>>,
}

impl Selection<'_> {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

pub fn select<'a>(document: &'a Html, strategies: &[Strategy], cap: usize) -> Selection<'a> {
    for (index, strategy) in strategies.iter().enumerate() {
        let matches = match strategy.evaluate(document) {
            Ok(matches) => matches,
            Err(err) => {
                tracing::warn!(strategy = index, error = %err, "skipping cascade strategy");
                continue;
            }
        };
        if matches.is_empty() {
            continue;
        }
        let matched = matches.len();
        let candidates = matches.into_iter().take(cap).collect();
        return Selection {
            strategy: Some(index),
            matched,
            candidates,
        };
    }

    Selection {
        strategy: None,
        matched: 0,
        candidates: Vec::new(),
    }
}
