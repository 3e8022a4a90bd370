//! Pool filter for the unassigned view.

use serde::{Deserialize, Serialize};

use crate::instance::ItemDisplay;

/// Filter over instance displays. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolQuery {
    /// Case-insensitive substring of the display name
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub rarity: Option<u8>,
    /// Case-insensitive element name
    #[serde(default)]
    pub element: Option<String>,
}

impl PoolQuery {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.rarity.is_none() && self.element.is_none()
    }

    /// Test whether a display matches this query.
    pub fn matches(&self, display: &ItemDisplay) -> bool {
        if let Some(text) = &self.text {
            if !display.name.to_lowercase().contains(&text.to_lowercase()) {
                return false;
            }
        }
        if let Some(rarity) = self.rarity {
            if display.rarity != Some(rarity) {
                return false;
            }
        }
        if let Some(element) = &self.element {
            match &display.element {
                Some(e) if e.eq_ignore_ascii_case(element) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Parse the filter-box shorthand.
///
/// Syntax:
/// - `rarity:5` (or `r:5`) - exact rarity
/// - `element:pyro` (or `e:pyro`) - element name
/// - anything else - name text, words joined by single spaces
///
/// A malformed rarity is treated as name text.
pub fn parse_pool_query(input: &str) -> PoolQuery {
    let mut query = PoolQuery::default();
    let mut words: Vec<&str> = Vec::new();

    for token in input.split_whitespace() {
        let lower = token.to_lowercase();
        if let Some(rest) = lower.strip_prefix("rarity:").or_else(|| lower.strip_prefix("r:")) {
            if let Ok(rarity) = rest.parse::<u8>() {
                query.rarity = Some(rarity);
                continue;
            }
        } else if let Some(rest) = lower
            .strip_prefix("element:")
            .or_else(|| lower.strip_prefix("e:"))
        {
            if !rest.is_empty() {
                query.element = Some(rest.to_string());
                continue;
            }
        }
        words.push(token);
    }

    if !words.is_empty() {
        query.text = Some(words.join(" "));
    }
    query
}
