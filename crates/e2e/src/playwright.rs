//! Playwright browser automation
//!
//! A [`PlaywrightSession`] drives one long-lived `node` process running a
//! small bridge script. Requests and responses are single JSON lines over the
//! child's stdin/stdout, correlated by a monotonically increasing `id`.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::driver::{Driver, ElementHandle, UrlPattern};
use crate::error::{DriverError, DriverResult, E2eError, E2eResult};

/// Node side of the session protocol
const BRIDGE_SCRIPT: &str = r##"
const readline = require('readline');
const playwright = require('playwright');

let browser = null;
let page = null;
let timeout = 5000;

function escapeRegExp(text) {
  return text.replace(/[.*+?^${}()|[\]\\]/g, '\\$&');
}

function byTestId(testId) {
  return page.getByTestId(testId).first();
}

async function settles(promise) {
  try {
    await promise;
    return true;
  } catch (error) {
    if (error.name === 'TimeoutError') return false;
    throw error;
  }
}

const handlers = {
  async launch(req) {
    timeout = req.timeoutMs;
    playwright.selectors.setTestIdAttribute(req.testIdAttribute);
    browser = await playwright[req.browser].launch({ headless: req.headless });
    const context = await browser.newContext({
      viewport: { width: req.viewportWidth, height: req.viewportHeight },
    });
    context.setDefaultTimeout(timeout);
    context.setDefaultNavigationTimeout(timeout);
    page = await context.newPage();
    return null;
  },
  async navigate(req) {
    await page.goto(req.url);
    return null;
  },
  async currentUrl() {
    return page.url();
  },
  async waitForUrl(req) {
    const re = req.regex ? new RegExp(req.pattern) : null;
    const matches = (url) => (re ? re.test(url.href) : url.href.includes(req.pattern));
    return settles(page.waitForURL(matches, { timeout }));
  },
  async locate(req) {
    return settles(byTestId(req.testId).waitFor({ state: 'attached', timeout }));
  },
  async fill(req) {
    await byTestId(req.testId).fill(req.value);
    return null;
  },
  async click(req) {
    await byTestId(req.testId).click();
    return null;
  },
  async isVisible(req) {
    return settles(byTestId(req.testId).waitFor({ state: 'visible', timeout }));
  },
  async textContains(req) {
    const hasText = new RegExp(escapeRegExp(req.text));
    const match = page.getByTestId(req.testId).filter({ hasText }).first();
    return settles(match.waitFor({ state: 'attached', timeout }));
  },
  async close() {
    if (browser) {
      await browser.close();
      browser = null;
    }
    return null;
  },
};

async function handle(line) {
  let req;
  try {
    req = JSON.parse(line);
  } catch (error) {
    return;
  }
  const respond = (body) => process.stdout.write(JSON.stringify({ id: req.id, ...body }) + '\n');
  const handler = handlers[req.op];
  if (!handler) {
    respond({ ok: false, kind: 'protocol', error: `unknown op: ${req.op}` });
    return;
  }
  try {
    const value = await handler(req);
    respond({ ok: true, value: value === undefined ? null : value });
  } catch (error) {
    const kind = error.name === 'TimeoutError' ? 'timeout' : 'error';
    respond({ ok: false, kind, error: error.message });
  }
}

let queue = Promise.resolve();
readline.createInterface({ input: process.stdin }).on('line', (line) => {
  queue = queue.then(() => handle(line));
});
process.stdin.on('end', () => {
  queue.then(async () => {
    if (browser) await browser.close();
    process.exit(0);
  });
});
"##;

/// Browser launch timeout, independent of the per-step timeout
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(60);

const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(format!("unknown browser: {}", other)),
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Upper bound for every wait the browser performs
    pub timeout_ms: u64,

    /// Attribute carrying stable test ids
    pub test_id_attribute: String,

    pub node_binary: PathBuf,

    /// `node_modules` directory holding the `playwright` package
    pub node_modules: PathBuf,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            timeout_ms: 5000,
            test_id_attribute: "data-testid".to_string(),
            node_binary: PathBuf::from("node"),
            node_modules: PathBuf::from("node_modules"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

struct Bridge {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    io_timeout: Duration,
}

impl Bridge {
    /// Send one request and wait for its response
    async fn call(&mut self, op: &str, params: Value) -> DriverResult<Value> {
        let io_timeout = self.io_timeout;
        self.call_within(op, params, io_timeout).await
    }

    async fn call_within(
        &mut self,
        op: &str,
        params: Value,
        limit: Duration,
    ) -> DriverResult<Value> {
        self.next_id += 1;
        let id = self.next_id;

        let mut request = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        request.insert("id".to_string(), json!(id));
        request.insert("op".to_string(), json!(op));

        // Params are never logged; fill requests carry resolved secrets.
        debug!(id, op, "Bridge request");
        let mut line = Value::Object(request).to_string();
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        match tokio::time::timeout(limit, self.read_response(id, op)).await {
            Ok(response) => response,
            Err(_) => Err(DriverError::Timeout(format!("{} (no bridge response)", op))),
        }
    }

    async fn read_response(&mut self, id: u64, op: &str) -> DriverResult<Value> {
        loop {
            let Some(line) = self.stdout.next_line().await? else {
                return Err(DriverError::Protocol(format!("bridge exited during '{}'", op)));
            };

            let response: BridgeResponse = match serde_json::from_str(&line) {
                Ok(response) => response,
                Err(_) => {
                    debug!("[bridge] {}", line);
                    continue;
                }
            };

            if response.id != id {
                warn!(expected = id, got = response.id, "Discarding stale bridge response");
                continue;
            }

            if response.ok {
                return Ok(response.value);
            }

            let message = response.error.unwrap_or_else(|| format!("{} failed", op));
            return Err(match response.kind.as_deref() {
                Some("timeout") => DriverError::Timeout(message),
                Some("protocol") => DriverError::Protocol(message),
                _ => DriverError::Backend(message),
            });
        }
    }
}

/// Last lines the bridge wrote to stderr, kept for launch diagnostics
#[derive(Clone, Default)]
struct StderrTail {
    lines: Arc<std::sync::Mutex<VecDeque<String>>>,
}

impl StderrTail {
    fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            if lines.len() == STDERR_TAIL_LINES {
                lines.pop_front();
            }
            lines.push_back(line);
        }
    }

    /// `message`, followed by the captured stderr when there is any
    fn annotate(&self, message: &str) -> String {
        let lines = match self.lines.lock() {
            Ok(lines) => lines.iter().cloned().collect::<Vec<_>>(),
            Err(_) => Vec::new(),
        };
        if lines.is_empty() {
            message.to_string()
        } else {
            format!("{}\nbridge stderr:\n{}", message, lines.join("\n"))
        }
    }
}

fn expect_bool(value: Value, op: &str) -> DriverResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| {
            DriverError::Protocol(format!("'{}' returned {} instead of a boolean", op, value))
        })
}

/// Browser session backed by Playwright
pub struct PlaywrightSession {
    bridge: Arc<Mutex<Bridge>>,

    // Holds the bridge script for the lifetime of the child process.
    _script_dir: TempDir,
}

impl PlaywrightSession {
    /// Start node, launch the browser and open a page
    pub async fn launch(config: &PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed().await?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        let node_modules = std::env::current_dir()?.join(&config.node_modules);
        let mut child = Command::new(&config.node_binary)
            .arg(&script_path)
            .env("NODE_PATH", &node_modules)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                E2eError::Playwright(format!(
                    "Failed to spawn {}: {}",
                    config.node_binary.display(),
                    e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Playwright("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Playwright("bridge stdout unavailable".to_string()))?;

        let stderr_tail = StderrTail::default();
        if let Some(stderr) = child.stderr.take() {
            let tail = stderr_tail.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[bridge stderr] {}", line);
                    tail.push(line);
                }
            });
        }

        let mut bridge = Bridge {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 0,
            // Browser-side waits are bounded by timeout_ms; leave headroom for the round trip.
            io_timeout: Duration::from_millis(config.timeout_ms) * 2 + Duration::from_secs(5),
        };

        let launched = bridge
            .call_within(
                "launch",
                json!({
                    "browser": config.browser.as_str(),
                    "headless": config.headless,
                    "viewportWidth": config.viewport_width,
                    "viewportHeight": config.viewport_height,
                    "timeoutMs": config.timeout_ms,
                    "testIdAttribute": config.test_id_attribute,
                }),
                LAUNCH_TIMEOUT,
            )
            .await;
        if let Err(e) = launched {
            // Give the stderr reader a moment to drain what node printed before exiting.
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Err(E2eError::Playwright(stderr_tail.annotate(&e.to_string())));
        }

        info!(
            browser = config.browser.as_str(),
            headless = config.headless,
            "Playwright session started"
        );

        Ok(Self {
            bridge: Arc::new(Mutex::new(bridge)),
            _script_dir: script_dir,
        })
    }

    /// Check if Playwright is installed
    async fn check_playwright_installed() -> E2eResult<()> {
        let status = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }
}

#[async_trait]
impl Driver for PlaywrightSession {
    type Element = PlaywrightElement;

    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        self.bridge.lock().await.call("navigate", json!({ "url": url })).await?;
        Ok(())
    }

    async fn locate_by_stable_id(&mut self, id: &str) -> DriverResult<PlaywrightElement> {
        let found = self.bridge.lock().await.call("locate", json!({ "testId": id })).await?;
        if !expect_bool(found, "locate")? {
            return Err(DriverError::ElementNotFound(id.to_string()));
        }
        Ok(PlaywrightElement {
            bridge: Arc::clone(&self.bridge),
            test_id: id.to_string(),
        })
    }

    async fn current_url(&mut self) -> DriverResult<String> {
        let url = self.bridge.lock().await.call("currentUrl", Value::Null).await?;
        url.as_str()
            .map(String::from)
            .ok_or_else(|| DriverError::Protocol(format!("'currentUrl' returned {}", url)))
    }

    async fn url_matches(&mut self, pattern: &UrlPattern) -> DriverResult<bool> {
        let matched = self
            .bridge
            .lock()
            .await
            .call(
                "waitForUrl",
                json!({ "pattern": pattern.as_str(), "regex": pattern.is_regex() }),
            )
            .await?;
        expect_bool(matched, "waitForUrl")
    }

    async fn close(&mut self) -> DriverResult<()> {
        let mut bridge = self.bridge.lock().await;
        bridge.call("close", Value::Null).await?;
        bridge.child.start_kill()?;
        bridge.child.wait().await?;
        info!("Playwright session closed");
        Ok(())
    }
}

/// Element addressed by its stable test id
pub struct PlaywrightElement {
    bridge: Arc<Mutex<Bridge>>,
    test_id: String,
}

#[async_trait]
impl ElementHandle for PlaywrightElement {
    async fn set_value(&self, text: &str) -> DriverResult<()> {
        self.bridge
            .lock()
            .await
            .call("fill", json!({ "testId": self.test_id, "value": text }))
            .await?;
        Ok(())
    }

    async fn click(&self) -> DriverResult<()> {
        self.bridge
            .lock()
            .await
            .call("click", json!({ "testId": self.test_id }))
            .await?;
        Ok(())
    }

    async fn is_visible(&self) -> DriverResult<bool> {
        let visible = self
            .bridge
            .lock()
            .await
            .call("isVisible", json!({ "testId": self.test_id }))
            .await?;
        expect_bool(visible, "isVisible")
    }

    async fn text_contains(&self, substring: &str) -> DriverResult<bool> {
        let found = self
            .bridge
            .lock()
            .await
            .call("textContains", json!({ "testId": self.test_id, "text": substring }))
            .await?;
        expect_bool(found, "textContains")
    }
}
