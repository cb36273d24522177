//! Browser-like session against the tracking portal.
//!
//! # Responsibilities
//! - Own the outbound HTTP client (built once, shared read-only)
//! - Walk home page → tracking form → form post for one lookup
//! - Follow redirects by hand so every hop's cookies land in the session jar
//! - Carry session cookies for the duration of that lookup only
//! - Map transport failures onto [`TrackingError`]
//!
//! # Design Decisions
//! - One attempt per lookup: no retries, no backoff
//! - Cookies live in a per-lookup jar so concurrent lookups never share a session
//! - Form knowledge (field names, postback target) comes from the [`MarkupParser`]

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{redirect, Client, Method, Response, StatusCode, Url};

use crate::config::UpstreamConfig;
use crate::tracking::cookies::CookieJar;
use crate::tracking::number::TrackingNumber;
use crate::tracking::parser::MarkupParser;
use crate::tracking::types::{FormPage, TrackingError, TrackingResult};

/// Input name used when the form page does not reveal one.
const FALLBACK_INPUT_FIELD: &str = "ctl00$ContentPlaceHolder1$txtItemId";
/// Submit button name used when the form page does not reveal one.
const FALLBACK_SUBMIT_BUTTON: &str = "ctl00$ContentPlaceHolder1$btnTrack";
const SUBMIT_VALUE: &str = "Track Article";

/// Redirect hops followed per request before giving up.
pub const MAX_REDIRECTS: usize = 5;

const BROWSER_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";

/// Build the urlencoded body that submits `number` through the portal form.
pub fn build_form_fields(form: &FormPage, number: &TrackingNumber) -> Vec<(String, String)> {
    let mut fields = form.hidden_fields.clone();

    let input = form.input_field.as_deref().unwrap_or(FALLBACK_INPUT_FIELD);
    set_field(&mut fields, input, number.as_str());

    match (&form.postback_target, &form.submit_button) {
        (Some(target), _) => {
            set_field(&mut fields, "__EVENTTARGET", target);
            set_field(&mut fields, "__EVENTARGUMENT", "");
        }
        (None, button) => {
            let button = button.as_deref().unwrap_or(FALLBACK_SUBMIT_BUTTON);
            set_field(&mut fields, button, SUBMIT_VALUE);
        }
    }

    fields
}

fn set_field(fields: &mut Vec<(String, String)>, name: &str, value: &str) {
    match fields.iter_mut().find(|(n, _)| n == name) {
        Some(existing) => existing.1 = value.to_string(),
        None => fields.push((name.to_string(), value.to_string())),
    }
}

/// HTTP access to the portal.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    config: UpstreamConfig,
    base_url: Url,
    tracking_url: Url,
}

impl UpstreamClient {
    /// Build the shared client with browser-like default headers.
    pub fn new(config: UpstreamConfig) -> TrackingResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| TrackingError::Client(e.to_string()))?;

        let base_url = parse_url("upstream.base_url", &config.base_url)?;
        let tracking_url = parse_url("upstream.tracking_url", &config.tracking_url)?;

        Ok(Self {
            client,
            config,
            base_url,
            tracking_url,
        })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    /// Run one session for `number` and return the results page markup.
    pub async fn fetch_results(
        &self,
        number: &TrackingNumber,
        parser: &dyn MarkupParser,
    ) -> TrackingResult<String> {
        let mut session = Session {
            upstream: self,
            cookies: CookieJar::default(),
        };

        if self.config.warm_up {
            session
                .send(Method::GET, self.base_url.clone(), None, None)
                .await?;
            tracing::debug!(
                tracking_number = %number,
                cookies = session.cookies.len(),
                "Session initialized"
            );
            self.pause().await;
        }

        let response = session
            .send(
                Method::GET,
                self.tracking_url.clone(),
                Some(self.config.base_url.as_str()),
                None,
            )
            .await?;
        let form_html = read_body(response, self.config.timeout_secs).await?;

        let form = parser.parse_form(&form_html);
        if form.hidden("__VIEWSTATE").is_none() {
            return Err(TrackingError::FormState);
        }
        tracing::debug!(
            tracking_number = %number,
            hidden_fields = form.hidden_fields.len(),
            input_field = ?form.input_field,
            postback_target = ?form.postback_target,
            "Tracking form loaded"
        );

        let fields = build_form_fields(&form, number);
        self.pause().await;

        let response = session
            .send(
                Method::POST,
                self.tracking_url.clone(),
                Some(self.config.tracking_url.as_str()),
                Some(fields.as_slice()),
            )
            .await?;

        read_body(response, self.config.timeout_secs).await
    }

    async fn pause(&self) {
        if self.config.step_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.step_delay_ms)).await;
        }
    }
}

/// One lookup's conversation with the portal.
struct Session<'a> {
    upstream: &'a UpstreamClient,
    cookies: CookieJar,
}

impl Session<'_> {
    /// Send a request and follow redirects, absorbing cookies from every hop.
    ///
    /// 301/302/303 continue as a bodiless GET; 307/308 repeat the method and form.
    async fn send(
        &mut self,
        mut method: Method,
        mut url: Url,
        referer: Option<&str>,
        mut form: Option<&[(String, String)]>,
    ) -> TrackingResult<Response> {
        let config = &self.upstream.config;

        for _ in 0..=MAX_REDIRECTS {
            let mut request = self.upstream.client.request(method.clone(), url.clone());
            if let Some(referer) = referer {
                request = request.header(header::REFERER, referer);
            }
            if let Some(fields) = form {
                request = request.header(header::ORIGIN, &config.origin).form(fields);
            }
            if let Some(cookie) = self.cookies.header_for(&url) {
                request = request.header(header::COOKIE, cookie);
            }

            let response = request
                .send()
                .await
                .map_err(|e| map_transport_error(e, config.timeout_secs))?;
            self.cookies.absorb(&url, response.headers());

            let status = response.status();
            if status.is_redirection() {
                let next = redirect_target(&url, &response)?;
                tracing::debug!(status = %status, from = %url, to = %next, "Following redirect");
                if !matches!(status, StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT) {
                    method = Method::GET;
                    form = None;
                }
                url = next;
                continue;
            }

            if !status.is_success() {
                tracing::warn!(status = %status, url = %url, "Upstream returned error status");
                return Err(TrackingError::UpstreamStatus(status.as_u16()));
            }
            return Ok(response);
        }

        tracing::warn!(url = %url, limit = MAX_REDIRECTS, "Upstream redirect limit reached");
        Err(TrackingError::TooManyRedirects(MAX_REDIRECTS))
    }
}

/// Resolve a redirect's `Location` against the URL that produced it.
fn redirect_target(from: &Url, response: &Response) -> TrackingResult<Url> {
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(TrackingError::UpstreamStatus(status.as_u16()))?;

    from.join(location)
        .map_err(|e| TrackingError::Network(format!("invalid redirect location {location:?}: {e}")))
}

fn parse_url(field: &str, raw: &str) -> TrackingResult<Url> {
    Url::parse(raw).map_err(|e| TrackingError::Client(format!("{field}: {e}")))
}

async fn read_body(response: Response, timeout_secs: u64) -> TrackingResult<String> {
    let body = response
        .text()
        .await
        .map_err(|e| map_transport_error(e, timeout_secs))?;

    if body.trim().is_empty() {
        return Err(TrackingError::EmptyBody);
    }
    Ok(body)
}

fn map_transport_error(error: reqwest::Error, timeout_secs: u64) -> TrackingError {
    if error.is_timeout() {
        TrackingError::Timeout(timeout_secs)
    } else {
        TrackingError::Network(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number() -> TrackingNumber {
        TrackingNumber::parse("LP951627598IN").unwrap()
    }

    fn form(postback: Option<&str>, button: Option<&str>, input: Option<&str>) -> FormPage {
        FormPage {
            hidden_fields: vec![
                ("__VIEWSTATE".into(), "vs".into()),
                ("__EVENTTARGET".into(), "old".into()),
            ],
            input_field: input.map(Into::into),
            submit_button: button.map(Into::into),
            postback_target: postback.map(Into::into),
        }
    }

    fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
        fields.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_postback_form() {
        let fields = build_form_fields(&form(Some("ctl00$btnSearch"), None, Some("ctl00$txt")), &number());

        assert_eq!(field(&fields, "__VIEWSTATE"), Some("vs"));
        assert_eq!(field(&fields, "ctl00$txt"), Some("LP951627598IN"));
        assert_eq!(field(&fields, "__EVENTTARGET"), Some("ctl00$btnSearch"));
        assert_eq!(field(&fields, "__EVENTARGUMENT"), Some(""));
        assert_eq!(fields.iter().filter(|(n, _)| n == "__EVENTTARGET").count(), 1);
    }

    #[test]
    fn test_submit_button_form() {
        let fields = build_form_fields(&form(None, Some("ctl00$btnTrack2"), Some("ctl00$txt")), &number());
        assert_eq!(field(&fields, "ctl00$btnTrack2"), Some("Track Article"));
        assert_eq!(field(&fields, "__EVENTTARGET"), Some("old"));
    }

    #[test]
    fn test_fallback_names() {
        let fields = build_form_fields(&form(None, None, None), &number());
        assert_eq!(field(&fields, FALLBACK_INPUT_FIELD), Some("LP951627598IN"));
        assert_eq!(field(&fields, FALLBACK_SUBMIT_BUTTON), Some("Track Article"));
    }

    #[test]
    fn test_client_builds_from_defaults() {
        assert!(UpstreamClient::new(UpstreamConfig::default()).is_ok());
    }

    #[test]
    fn test_client_rejects_unparseable_url() {
        let config = UpstreamConfig {
            tracking_url: "not a url".into(),
            ..UpstreamConfig::default()
        };
        assert!(matches!(
            UpstreamClient::new(config),
            Err(TrackingError::Client(message)) if message.starts_with("upstream.tracking_url")
        ));
    }
}
