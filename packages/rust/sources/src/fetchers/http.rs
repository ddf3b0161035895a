//! Config-driven JSON-over-HTTP source.
//!
//! Each `[[sources]]` entry in the config file becomes one fetcher. The URL
//! template's `{company}` and `{role}` placeholders are percent-encoded and
//! substituted; the response body must be a JSON object.

use std::time::Duration;

use async_trait::async_trait;
use interviewprep_shared::{HttpSourceConfig, InterviewPrepError, Result, SourcePayload};
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use super::SourceFetcher;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 3;

/// Maximum response size we accept (2 MB).
const MAX_RESPONSE_SIZE: u64 = 2 * 1024 * 1024;

const USER_AGENT: &str = concat!("InterviewPrep/", env!("CARGO_PKG_VERSION"));

pub struct HttpSourceFetcher {
    name: String,
    url_template: String,
    client: Client,
}

impl HttpSourceFetcher {
    pub fn new(config: &HttpSourceConfig, timeout: Duration) -> Result<Self> {
        if config.name.trim().is_empty() {
            return Err(InterviewPrepError::config("source name must not be empty"));
        }
        if !config.url_template.contains("{company}") {
            return Err(InterviewPrepError::config(format!(
                "source '{}': url_template must contain {{company}}",
                config.name
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|e| {
                InterviewPrepError::Connectivity(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            name: config.name.clone(),
            url_template: config.url_template.clone(),
            client,
        })
    }

    fn render_url(&self, company: &str, role: &str) -> Result<Url> {
        let rendered = self
            .url_template
            .replace("{company}", &encode(company.trim()))
            .replace("{role}", &encode(role.trim()));
        Url::parse(&rendered).map_err(|e| {
            InterviewPrepError::source_fetch(&self.name, format!("invalid URL {rendered}: {e}"))
        })
    }
}

fn encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip_all, fields(source = %self.name, company = %company))]
    async fn fetch(&self, company: &str, role: &str) -> Result<Option<SourcePayload>> {
        let url = self.render_url(company, role)?;
        debug!(%url, "fetching source");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| InterviewPrepError::source_fetch(&self.name, format!("{url}: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(%url, "source has no entry");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(InterviewPrepError::source_fetch(
                &self.name,
                format!("{url}: HTTP {status}"),
            ));
        }

        if let Some(len) = response.content_length() {
            if len > MAX_RESPONSE_SIZE {
                return Err(InterviewPrepError::source_fetch(
                    &self.name,
                    format!("{url}: response too large ({len} bytes, max {MAX_RESPONSE_SIZE})"),
                ));
            }
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            InterviewPrepError::source_fetch(&self.name, format!("{url}: invalid JSON body: {e}"))
        })?;

        if !body.is_object() {
            return Err(InterviewPrepError::source_fetch(
                &self.name,
                format!("{url}: expected a JSON object"),
            ));
        }

        let mut payload: SourcePayload =
            serde_json::from_value(body.clone()).unwrap_or_default();
        // Unrecognized shapes are kept verbatim under the source's namespace.
        if payload.is_empty() {
            payload.details = body;
        }
        if !payload.is_empty() {
            payload.source_urls.push(url.to_string());
        }

        Ok((!payload.is_empty()).then_some(payload))
    }
}
