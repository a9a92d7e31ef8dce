//! Minimal W3C WebDriver client over blocking HTTP.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{Value, json};

use super::{Browser, ElementRef, Selector};

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

/// Key under which W3C drivers return element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

#[derive(Debug, Clone)]
pub struct WebDriverOptions {
    pub url: String,
    pub headless: bool,
    /// Chromium user-data directory holding an already logged-in profile.
    pub profile_dir: Option<PathBuf>,
}

impl Default for WebDriverOptions {
    fn default() -> Self {
        Self {
            url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: true,
            profile_dir: None,
        }
    }
}

impl WebDriverOptions {
    fn capabilities(&self) -> Value {
        // The issue sidebar collapses below ~1000px.
        let mut args = vec!["--window-size=1400,1000".to_string()];
        if self.headless {
            args.push("--headless=new".to_string());
        }
        if let Some(dir) = &self.profile_dir {
            args.push(format!("--user-data-dir={}", dir.display()));
        }
        json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    // Navigation returns at the document `load` event.
                    "pageLoadStrategy": "normal",
                    "goog:chromeOptions": { "args": args }
                }
            }
        })
    }
}

/// One browser session; deleted again when dropped.
pub struct WebDriverSession {
    client: Client,
    base_url: String,
    session_id: String,
}

impl WebDriverSession {
    pub fn start(options: &WebDriverOptions) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("building HTTP client for WebDriver")?;
        let base_url = options.url.trim_end_matches('/').to_string();

        let value = send(
            client
                .post(format!("{base_url}/session"))
                .json(&options.capabilities()),
        )
        .with_context(|| format!("creating WebDriver session at {base_url}"))?;
        let session_id = value["sessionId"]
            .as_str()
            .ok_or_else(|| anyhow!("WebDriver did not return a session id: {value}"))?
            .to_string();
        tracing::debug!(%session_id, "WebDriver session started");

        Ok(Self {
            client,
            base_url,
            session_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/session/{}/{path}", self.base_url, self.session_id)
    }

    fn post(&self, path: &str, body: Value) -> Result<Value> {
        send(self.client.post(self.url(path)).json(&body))
            .with_context(|| format!("WebDriver POST {path}"))
    }

    fn get(&self, path: &str) -> Result<Value> {
        send(self.client.get(self.url(path))).with_context(|| format!("WebDriver GET {path}"))
    }

    fn cdp(&self, cmd: &str, params: Value) -> Result<Value> {
        self.post("goog/cdp/execute", json!({ "cmd": cmd, "params": params }))
    }
}

impl Browser for WebDriverSession {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.post("url", json!({ "url": url }))?;
        Ok(())
    }

    fn find_all(&mut self, selector: &Selector) -> Result<Vec<ElementRef>> {
        let (using, value) = match selector {
            Selector::Css(css) => ("css selector", css.as_str()),
            Selector::XPath(xpath) => ("xpath", xpath.as_str()),
        };
        let found = self.post("elements", json!({ "using": using, "value": value }))?;
        element_refs(&found)
    }

    fn text(&mut self, element: &ElementRef) -> Result<String> {
        let value = self.get(&format!("element/{}/text", element.0))?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn click(&mut self, element: &ElementRef) -> Result<()> {
        self.post(&format!("element/{}/click", element.0), json!({}))?;
        Ok(())
    }

    fn set_extra_header(&mut self, name: &str, value: &str) -> Result<bool> {
        let enabled = self
            .cdp("Network.enable", json!({}))
            .and_then(|_| {
                self.cdp(
                    "Network.setExtraHTTPHeaders",
                    json!({ "headers": { name: value } }),
                )
            });
        match enabled {
            Ok(_) => Ok(true),
            Err(err) => {
                tracing::debug!(error = %format!("{err:#}"), "CDP passthrough unavailable");
                Ok(false)
            }
        }
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        let url = format!("{}/session/{}", self.base_url, self.session_id);
        if let Err(err) = send(self.client.delete(url)) {
            tracing::warn!(error = %format!("{err:#}"), "failed to close WebDriver session");
        }
    }
}

fn send(req: RequestBuilder) -> Result<Value> {
    let resp = req.send().context("sending WebDriver command")?;
    let ok = resp.status().is_success();
    let body = resp.text().context("reading WebDriver response")?;
    decode_response(ok, &body)
}

/// Unwraps the `value` member of a WebDriver response, turning error
/// payloads into `Err`.
fn decode_response(status_ok: bool, body: &str) -> Result<Value> {
    let mut parsed: Value = serde_json::from_str(body)
        .with_context(|| format!("decoding WebDriver response: {body}"))?;
    let value = parsed
        .get_mut("value")
        .map(Value::take)
        .unwrap_or(Value::Null);

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        bail!("{error}: {message}");
    }
    if !status_ok {
        bail!("WebDriver request failed: {body}");
    }
    Ok(value)
}

fn element_refs(value: &Value) -> Result<Vec<ElementRef>> {
    let Some(list) = value.as_array() else {
        bail!("expected a list of elements, got {value}");
    };
    list.iter()
        .map(|entry| {
            entry[ELEMENT_KEY]
                .as_str()
                .map(|id| ElementRef(id.to_string()))
                .ok_or_else(|| anyhow!("malformed element reference: {entry}"))
        })
        .collect()
}
