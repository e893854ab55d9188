//! A small client for the backend's system-settings HTTP resource.
//!
//! Only the plugin-settings record is covered:
//! - `base_url` is provided by the caller and should point at the API root
//!   (e.g. `http://localhost:8000/api/`).
//! - responses may be wrapped in the backend's `{code, msg, data}` envelope;
//!   the client unwraps it transparently.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{RequestBuilder, Response, Url};
use serde::Serialize;
use serde_json::Value;

mod error;
pub use error::ClientError;

/// Path of the plugin-settings record relative to the API root.
pub const PLUGIN_SETTINGS_PATH: &str = "system-settings/plugin-settings";

/// Raw plugin-settings record as returned by the backend: plugin identifier
/// to (normally) an array of project IDs. Values are left undecoded so the
/// caller decides how to treat unexpected shapes.
pub type PluginSettingsPayload = BTreeMap<String, Value>;

const ENVELOPE_OK: i64 = 200;

#[derive(Clone)]
pub struct SettingsClient {
    base: Url,
    client: reqwest::Client,
    token: Option<String>,
}

impl SettingsClient {
    /// Create a new client with the given `base_url` and no request timeout.
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base = Url::parse(base_url)?;
        let client = reqwest::Client::new();
        Ok(Self {
            base,
            client,
            token: None,
        })
    }

    /// Create a client whose requests fail after `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base = Url::parse(base_url)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base,
            client,
            token: None,
        })
    }

    /// Attach a bearer token sent as `Authorization: Bearer <token>`.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        let token = token.trim();
        self.token = if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        };
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Fetch the whole plugin-settings record via `GET <base>/system-settings/plugin-settings`.
    pub async fn get_plugin_settings(&self) -> Result<PluginSettingsPayload, ClientError> {
        let url = self.endpoint(PLUGIN_SETTINGS_PATH);
        tracing::debug!(%url, "fetching plugin settings");

        let res = self.authorize(self.client.get(url)).send().await?;
        let body = read_body(res).await?;
        let payload = match body {
            Value::Null => PluginSettingsPayload::new(),
            other => serde_json::from_value(other)?,
        };
        Ok(payload)
    }

    /// Replace the whole plugin-settings record via `PUT`.
    ///
    /// The response body is only inspected for failure; its content is discarded.
    pub async fn put_plugin_settings<T>(&self, settings: &T) -> Result<(), ClientError>
    where
        T: Serialize + ?Sized,
    {
        let url = self.endpoint(PLUGIN_SETTINGS_PATH);
        tracing::debug!(%url, "saving plugin settings");

        let res = self
            .authorize(self.client.put(url))
            .json(settings)
            .send()
            .await?;
        read_body(res).await?;
        Ok(())
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        // join with a relative path; works whether or not base ends in '/'
        url.set_path(&format!(
            "{}/{}",
            url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        ));
        url
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

/// Check the HTTP status, parse the JSON body and strip the response envelope.
async fn read_body(res: Response) -> Result<Value, ClientError> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        return Err(ClientError::Status {
            status: status.as_u16(),
            message: error_message(&text).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            }),
        });
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    let value: Value = serde_json::from_str(&text)?;
    unwrap_envelope(value)
}

fn unwrap_envelope(value: Value) -> Result<Value, ClientError> {
    let mut obj = match value {
        Value::Object(obj) => obj,
        other => return Ok(other),
    };
    if !(obj.contains_key("code") && obj.contains_key("data")) {
        return Ok(Value::Object(obj));
    }

    let code = obj.get("code").and_then(Value::as_i64).unwrap_or_default();
    if code != ENVELOPE_OK {
        let message = obj
            .get("msg")
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_string();
        return Err(ClientError::Envelope { code, message });
    }
    Ok(obj.remove("data").unwrap_or(Value::Null))
}

/// FastAPI puts the reason in `detail`; the envelope uses `msg`.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["detail", "msg"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
