//! Configuration for HTTP mocking and forwarding.

use anyhow::Context;
use prism_core::PrismConfig;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;
use std::time::Duration;

/// Options that steer the mocker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpMockOptions {
    /// Generate bodies from schemas with random data instead of using examples
    #[serde(default)]
    pub dynamic: bool,
    /// Preferred status code for successful requests
    #[serde(
        default,
        deserialize_with = "deserialize_status_code",
        skip_serializing_if = "Option::is_none"
    )]
    pub code: Option<u16>,
    /// Allow-list consulted before the `Accept` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_types: Option<Vec<String>>,
    /// Pin negotiation to one named example
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
    /// `false` forwards to a live server; `true` or an options object mocks
    #[serde(
        default = "default_mock",
        deserialize_with = "deserialize_mock",
        serialize_with = "serialize_mock"
    )]
    pub mock: Option<HttpMockOptions>,
    #[serde(default = "default_true")]
    pub validate_request: bool,
    #[serde(default = "default_true")]
    pub validate_response: bool,
    /// Report security scheme violations as diagnostics
    #[serde(default = "default_true", deserialize_with = "deserialize_toggle")]
    pub security: bool,
    /// Attach permissive CORS headers to mocked responses
    #[serde(default, deserialize_with = "deserialize_toggle")]
    pub cors: bool,
    /// Timeout for forwarded requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_timeout_ms: Option<u64>,
}

fn default_true() -> bool {
    true
}

fn default_mock() -> Option<HttpMockOptions> {
    Some(HttpMockOptions::default())
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            mock: default_mock(),
            validate_request: true,
            validate_response: true,
            security: true,
            cors: false,
            upstream_timeout_ms: None,
        }
    }
}

impl HttpConfig {
    /// Mocking config with the given options.
    pub fn mocking(options: HttpMockOptions) -> Self {
        Self {
            mock: Some(options),
            ..Default::default()
        }
    }

    /// Forwarding config: requests go to the live server.
    pub fn forwarding() -> Self {
        Self {
            mock: None,
            ..Default::default()
        }
    }

    pub fn mock_options(&self) -> Option<&HttpMockOptions> {
        self.mock.as_ref()
    }

    pub fn is_dynamic(&self) -> bool {
        self.mock.as_ref().is_some_and(|mock| mock.dynamic)
    }

    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_ms.map(Duration::from_millis)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: HttpConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config in {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(mock) = &self.mock {
            if let Some(code) = mock.code {
                if !(100..=599).contains(&code) {
                    anyhow::bail!("Invalid mock status code '{code}': expected 100-599");
                }
            }

            if let Some(media_types) = &mock.media_types {
                if media_types.iter().any(|m| m.trim().is_empty()) {
                    anyhow::bail!("mock.mediaTypes must not contain empty entries");
                }
            }
        }

        if self.upstream_timeout_ms == Some(0) {
            anyhow::bail!("upstreamTimeoutMs must be greater than zero");
        }

        Ok(())
    }
}

impl PrismConfig for HttpConfig {
    fn is_mocking(&self) -> bool {
        self.mock.is_some()
    }

    fn validate_request(&self) -> bool {
        self.validate_request
    }

    fn validate_response(&self) -> bool {
        self.validate_response
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MockSetting {
    Toggle(bool),
    Options(HttpMockOptions),
}

fn deserialize_mock<'de, D>(deserializer: D) -> Result<Option<HttpMockOptions>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match MockSetting::deserialize(deserializer)? {
        MockSetting::Toggle(false) => None,
        MockSetting::Toggle(true) => Some(HttpMockOptions::default()),
        MockSetting::Options(options) => Some(options),
    })
}

fn serialize_mock<S>(mock: &Option<HttpMockOptions>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match mock {
        Some(options) => options.serialize(serializer),
        None => serializer.serialize_bool(false),
    }
}

/// Accepts `true`/`false`, or an options object meaning "enabled".
fn deserialize_toggle<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(enabled) => Ok(enabled),
        serde_json::Value::Object(_) => Ok(true),
        other => Err(D::Error::custom(format!(
            "expected a boolean or an object, got {other}"
        ))),
    }
}

/// Deserialize a status code from either a number or a string
fn deserialize_status_code<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| D::Error::custom("invalid status code number")),
        Some(serde_json::Value::String(s)) => s
            .parse::<u16>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid status code string: {s}"))),
        Some(_) => Err(D::Error::custom("code must be a number or string")),
    }
}
