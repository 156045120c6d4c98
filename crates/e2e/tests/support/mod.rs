//! Scripted in-memory browser used by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use planguard_common::Plan;
use planguard_e2e::{Driver, DriverError, DriverResult, E2eResult, ElementHandle, SessionFactory};

pub const BASE_URL: &str = "https://www.saucedemo.com/";

pub type ClickHandler = Arc<dyn Fn(&mut PageState) + Send + Sync>;

#[derive(Debug, Clone, Default)]
pub struct Element {
    pub visible: bool,
    pub text: String,
}

impl Element {
    pub fn visible() -> Self {
        Self {
            visible: true,
            text: String::new(),
        }
    }

    pub fn with_text(text: &str) -> Self {
        Self {
            visible: true,
            text: text.to_string(),
        }
    }
}

#[derive(Clone, Default)]
pub struct PageState {
    pub url: String,
    pub elements: HashMap<String, Element>,
    pub values: HashMap<String, String>,
    pub on_click: HashMap<String, ClickHandler>,
}

/// The saucedemo login form
pub fn login_page() -> PageState {
    let mut page = PageState::default();
    for id in ["username", "password", "login-button"] {
        page.elements.insert(id.to_string(), Element::visible());
    }

    let submit: ClickHandler = Arc::new(|page: &mut PageState| {
        let user = page.values.get("username").cloned().unwrap_or_default();
        let pass = page.values.get("password").cloned().unwrap_or_default();
        match (user.as_str(), pass.as_str()) {
            ("standard_user", "secret_sauce") => {
                page.url = format!("{}inventory.html", BASE_URL);
                page.elements
                    .insert("inventory-container".to_string(), Element::visible());
                page.elements
                    .insert("title".to_string(), Element::with_text("Products"));
            }
            ("locked_out_user", _) => {
                page.elements.insert(
                    "error".to_string(),
                    Element::with_text("Epic sadface: Sorry, this user has been locked out."),
                );
            }
            _ => {
                page.elements.insert(
                    "error".to_string(),
                    Element::with_text("Epic sadface: Username and password do not match"),
                );
            }
        }
    });
    page.on_click.insert("login-button".to_string(), submit);
    page
}

/// Session over a shared page; every primitive is appended to `log`
#[derive(Clone)]
pub struct FakeBrowser {
    pub page: Arc<Mutex<PageState>>,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl FakeBrowser {
    pub fn new(page: PageState) -> Self {
        Self {
            page: Arc::new(Mutex::new(page)),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn value(&self, id: &str) -> Option<String> {
        self.page.lock().unwrap().values.get(id).cloned()
    }

    pub fn url(&self) -> String {
        self.page.lock().unwrap().url.clone()
    }

    fn record(&self, call: String) {
        self.log.lock().unwrap().push(call);
    }
}

pub struct FakeElement {
    id: String,
    browser: FakeBrowser,
}

impl FakeElement {
    fn element(&self) -> DriverResult<Element> {
        self.browser
            .page
            .lock()
            .unwrap()
            .elements
            .get(&self.id)
            .cloned()
            .ok_or_else(|| DriverError::ElementNotFound(self.id.clone()))
    }
}

#[async_trait]
impl ElementHandle for FakeElement {
    async fn set_value(&self, text: &str) -> DriverResult<()> {
        self.browser.record(format!("fill {}", self.id));
        let mut page = self.browser.page.lock().unwrap();
        page.values.insert(self.id.clone(), text.to_string());
        Ok(())
    }

    async fn click(&self) -> DriverResult<()> {
        self.browser.record(format!("click {}", self.id));
        let mut page = self.browser.page.lock().unwrap();
        let handler = page.on_click.get(&self.id).cloned();
        if let Some(handler) = handler {
            handler(&mut *page);
        }
        Ok(())
    }

    async fn is_visible(&self) -> DriverResult<bool> {
        Ok(self.element()?.visible)
    }

    async fn text_contains(&self, substring: &str) -> DriverResult<bool> {
        Ok(self.element()?.text.contains(substring))
    }
}

#[async_trait]
impl Driver for FakeBrowser {
    type Element = FakeElement;

    async fn navigate(&mut self, url: &str) -> DriverResult<()> {
        self.record(format!("goto {}", url));
        self.page.lock().unwrap().url = url.to_string();
        Ok(())
    }

    async fn locate_by_stable_id(&mut self, id: &str) -> DriverResult<FakeElement> {
        self.record(format!("locate {}", id));
        if !self.page.lock().unwrap().elements.contains_key(id) {
            return Err(DriverError::ElementNotFound(id.to_string()));
        }
        Ok(FakeElement {
            id: id.to_string(),
            browser: self.clone(),
        })
    }

    async fn current_url(&mut self) -> DriverResult<String> {
        Ok(self.url())
    }

    async fn close(&mut self) -> DriverResult<()> {
        self.record("close".to_string());
        Ok(())
    }
}

/// Opens a fresh copy of `template` per session, sharing one call log
#[derive(Clone)]
pub struct FakeFactory {
    template: PageState,
    pub log: Arc<Mutex<Vec<String>>>,
    pub opened: Arc<AtomicUsize>,
}

impl FakeFactory {
    pub fn new(template: PageState) -> Self {
        Self {
            template,
            log: Arc::new(Mutex::new(Vec::new())),
            opened: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    type Session = FakeBrowser;

    async fn open(&self, _plan: &Plan) -> E2eResult<FakeBrowser> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push("open".to_string());
        Ok(FakeBrowser {
            page: Arc::new(Mutex::new(self.template.clone())),
            log: Arc::clone(&self.log),
        })
    }
}

/// Login plan with a passing, a locked-out and a flagged scenario
pub const LOGIN_PLAN: &str = r#"{
  "app": "web",
  "baseUrl": "https://www.saucedemo.com/",
  "feature": "Login",
  "scenarios": [
    {
      "name": "Successful login",
      "needsHuman": false,
      "steps": [
        { "action": "goto", "url": "https://www.saucedemo.com/" },
        { "action": "fill", "testId": "username", "value": "${USER}" },
        { "action": "fill", "testId": "password", "value": "${PASS}" },
        { "action": "click", "testId": "login-button" },
        { "action": "assertUrlContains", "contains": "inventory" },
        { "action": "assertVisible", "testId": "inventory-container" }
      ]
    },
    {
      "name": "Locked out user",
      "needsHuman": false,
      "steps": [
        { "action": "goto", "url": "https://www.saucedemo.com/" },
        { "action": "fill", "testId": "username", "value": "locked_out_user" },
        { "action": "fill", "testId": "password", "value": "${PASS}" },
        { "action": "click", "testId": "login-button" },
        { "action": "assertTextContains", "testId": "error", "contains": "locked out" }
      ]
    },
    {
      "name": "Reset password",
      "needsHuman": true,
      "steps": [
        { "action": "goto", "url": "https://www.saucedemo.com/" },
        { "action": "click", "testId": "UNKNOWN_TEST_ID" }
      ]
    }
  ]
}"#;
