//! Narrow interface to the browser automation layer
//!
//! The interpreter only ever talks to a session through these primitives.
//! Bounded waits are the driver's job: a primitive either settles within the
//! driver's timeout or returns an error.

use async_trait::async_trait;
use regex::Regex;

use crate::error::DriverResult;

/// An element located by its stable test id
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Replace the element's value
    async fn set_value(&self, text: &str) -> DriverResult<()>;

    async fn click(&self) -> DriverResult<()>;

    async fn is_visible(&self) -> DriverResult<bool>;

    async fn text_contains(&self, substring: &str) -> DriverResult<bool>;
}

/// A live automation session
#[async_trait]
pub trait Driver: Send {
    type Element: ElementHandle;

    async fn navigate(&mut self, url: &str) -> DriverResult<()>;

    /// Locate an element by stable test id; `ElementNotFound` when absent
    async fn locate_by_stable_id(&mut self, id: &str) -> DriverResult<Self::Element>;

    async fn current_url(&mut self) -> DriverResult<String>;

    /// Check the current URL against a pattern.
    ///
    /// Drivers that can wait for navigation to settle should override this.
    async fn url_matches(&mut self, pattern: &UrlPattern) -> DriverResult<bool> {
        let url = self.current_url().await?;
        Ok(pattern.matches(&url))
    }

    /// Release the session
    async fn close(&mut self) -> DriverResult<()> {
        Ok(())
    }
}

/// Expected URL shape for `assertUrlContains`
#[derive(Debug, Clone)]
pub enum UrlPattern {
    Regex(Regex),
    /// Used when the expectation is not a valid regex
    Substring(String),
}

impl UrlPattern {
    pub fn parse(contains: &str) -> Self {
        match Regex::new(contains) {
            Ok(re) => UrlPattern::Regex(re),
            Err(_) => UrlPattern::Substring(contains.to_string()),
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlPattern::Regex(re) => re.is_match(url),
            UrlPattern::Substring(s) => url.contains(s.as_str()),
        }
    }

    /// The pattern source text
    pub fn as_str(&self) -> &str {
        match self {
            UrlPattern::Regex(re) => re.as_str(),
            UrlPattern::Substring(s) => s,
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, UrlPattern::Regex(_))
    }
}
