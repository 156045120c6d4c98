//! Heuristic scan phase
//!
//! Walks every string leaf of the raw plan document, independent of the plan
//! schema, and flags locator and wait patterns that make browser tests brittle.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Splitting a deep CSS chain on `>` must yield at least this many segments
pub const DEEP_CSS_MIN_SEGMENTS: usize = 4;

/// A named string matcher
pub struct BannedPattern {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
}

/// Matchers in reporting order
pub static BANNED_PATTERNS: &[BannedPattern] = &[
    BannedPattern {
        name: "XPath",
        matches: is_xpath,
    },
    BannedPattern {
        name: "sleep()",
        matches: is_sleep,
    },
    BannedPattern {
        name: "waitForTimeout",
        matches: is_wait_for_timeout,
    },
    BannedPattern {
        name: "nth-child",
        matches: is_nth_child,
    },
    BannedPattern {
        name: "deep CSS chain",
        matches: is_deep_css_chain,
    },
];

/// A string leaf that tripped a matcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternHit {
    pub pattern: &'static str,
    /// JSON pointer to the leaf, e.g. `/scenarios/0/steps/2/value`
    pub path: String,
    pub value: String,
}

impl fmt::Display for PatternHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Banned pattern \"{}\" found at {}: \"{}\"",
            self.pattern, self.path, self.value
        )
    }
}

fn is_xpath(s: &str) -> bool {
    let v = s.trim();
    v.starts_with('/') || v.to_lowercase().contains("xpath=")
}

fn is_sleep(s: &str) -> bool {
    s.to_lowercase().contains("sleep(")
}

fn is_wait_for_timeout(s: &str) -> bool {
    s.to_lowercase().contains("waitfortimeout")
}

fn is_nth_child(s: &str) -> bool {
    s.to_lowercase().contains("nth-child")
}

fn is_deep_css_chain(s: &str) -> bool {
    s.contains(" > ") && s.split('>').count() >= DEEP_CSS_MIN_SEGMENTS
}

/// Scan every string leaf in `document`, in document order
pub fn scan_banned_patterns(document: &Value) -> Vec<PatternHit> {
    let mut hits = Vec::new();
    let mut pointer = String::new();
    walk(document, &mut pointer, &mut hits);
    hits
}

fn walk(value: &Value, pointer: &mut String, hits: &mut Vec<PatternHit>) {
    match value {
        Value::String(s) => {
            for pattern in BANNED_PATTERNS {
                if (pattern.matches)(s) {
                    hits.push(PatternHit {
                        pattern: pattern.name,
                        path: pointer.clone(),
                        value: s.clone(),
                    });
                }
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&i.to_string());
                walk(item, pointer, hits);
                pointer.truncate(len);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                let len = pointer.len();
                pointer.push('/');
                pointer.push_str(&escape_token(key));
                walk(item, pointer, hits);
                pointer.truncate(len);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

// RFC 6901: `~` first, then `/`.
fn escape_token(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
