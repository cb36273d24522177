//! Per-session cookie storage.
//!
//! # Responsibilities
//! - Absorb `Set-Cookie` headers from every response, redirects included
//! - Scope each cookie to its domain and path
//! - Drop cookies the portal expires (`Max-Age<=0` or a past `Expires`)
//!
//! # Design Decisions
//! - A jar lives for one lookup only, so persistent cookies are kept as session cookies

use chrono::{DateTime, Utc};
use reqwest::header::{self, HeaderMap};
use reqwest::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredCookie {
    name: String,
    value: String,
    domain: String,
    host_only: bool,
    path: String,
    secure: bool,
}

impl StoredCookie {
    fn same_slot(&self, other: &StoredCookie) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }

    fn matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else { return false };
        let host = host.to_ascii_lowercase();

        let domain_ok = if self.host_only {
            host == self.domain
        } else {
            domain_matches(&host, &self.domain)
        };
        domain_ok && path_matches(url.path(), &self.path) && (!self.secure || url.scheme() == "https")
    }
}

/// Cookies collected during a single session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<StoredCookie>,
}

impl CookieJar {
    /// Record every `Set-Cookie` on a response to `url`.
    ///
    /// A cookie replaces any earlier one with the same name, domain and path.
    /// Expired cookies are removed instead of stored.
    pub fn absorb(&mut self, url: &Url, headers: &HeaderMap) {
        for value in headers.get_all(header::SET_COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            let Some((cookie, expired)) = parse_set_cookie(url, value) else {
                continue;
            };

            self.cookies.retain(|existing| !existing.same_slot(&cookie));
            if !expired {
                self.cookies.push(cookie);
            }
        }
    }

    /// Value for the `Cookie` header of a request to `url`, if any cookie applies.
    ///
    /// Longer paths come first; ties keep the order cookies were set in.
    pub fn header_for(&self, url: &Url) -> Option<String> {
        let mut matching: Vec<&StoredCookie> = self.cookies.iter().filter(|c| c.matches(url)).collect();
        if matching.is_empty() {
            return None;
        }
        matching.sort_by(|a, b| b.path.len().cmp(&a.path.len()));

        Some(
            matching
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// Parse one `Set-Cookie` value. Returns the cookie and whether it is already expired,
/// or `None` when the header is malformed or names a foreign domain.
fn parse_set_cookie(url: &Url, raw: &str) -> Option<(StoredCookie, bool)> {
    let host = url.host_str()?.to_ascii_lowercase();
    let mut parts = raw.split(';');

    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut domain = None;
    let mut path = None;
    let mut secure = false;
    let mut max_age: Option<i64> = None;
    let mut expires: Option<DateTime<Utc>> = None;

    for attribute in parts {
        let (key, val) = match attribute.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (attribute.trim(), ""),
        };
        match key.to_ascii_lowercase().as_str() {
            "domain" if !val.is_empty() => {
                domain = Some(val.trim_start_matches('.').to_ascii_lowercase());
            }
            "path" if val.starts_with('/') => path = Some(val.to_string()),
            "secure" => secure = true,
            "max-age" => max_age = val.parse().ok(),
            "expires" => expires = parse_expires(val),
            _ => {}
        }
    }

    let (domain, host_only) = match domain {
        Some(domain) if domain_matches(&host, &domain) => (domain, false),
        Some(_) => return None,
        None => (host, true),
    };

    let expired = match max_age {
        Some(seconds) => seconds <= 0,
        None => expires.is_some_and(|at| at <= Utc::now()),
    };

    let cookie = StoredCookie {
        name: name.to_string(),
        value: value.trim().to_string(),
        domain,
        host_only,
        path: path.unwrap_or_else(|| default_path(url.path())),
        secure,
    };
    Some((cookie, expired))
}

/// `Expires` in RFC 1123 form, or the dashed `01-Jan-1970` form ASP.NET emits.
fn parse_expires(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc2822(&value.replacen('-', " ", 2)))
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    request_path == cookie_path
        || (request_path.starts_with(cookie_path)
            && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/')))
}

/// Directory of the request path: `/General/IPS_Track.aspx` → `/General`.
fn default_path(request_path: &str) -> String {
    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(i) => request_path[..i].to_string(),
    }
}
