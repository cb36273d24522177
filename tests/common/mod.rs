//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use indiapost_tracker::config::{TrackerConfig, UpstreamConfig};
use indiapost_tracker::lifecycle::Shutdown;
use indiapost_tracker::HttpServer;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const TRACK_PATH: &str = "/General/IPS_Track.aspx";

/// Tracking form with a `__doPostBack` submit button.
pub const POSTBACK_FORM: &str = r#"
<html><body>
<form method="post" action="./IPS_Track.aspx" id="form1">
  <input type="hidden" name="__VIEWSTATE" id="__VIEWSTATE" value="dDwtMTA4MTc2" />
  <input type="hidden" name="__VIEWSTATEGENERATOR" value="A1B2C3D4" />
  <input type="hidden" name="__EVENTVALIDATION" value="/wEdAAO" />
  <input type="text" name="ctl00$ContentPlaceHolder1$txtItemId" id="ContentPlaceHolder1_txtItemId" />
  <button type="submit" onclick="javascript:__doPostBack('ctl00$ContentPlaceHolder1$btnSearch','')">Search</button>
</form>
</body></html>
"#;

/// Tracking form with a classic submit input.
pub const SUBMIT_FORM: &str = r#"
<html><body>
<form method="post" action="./IPS_Track.aspx">
  <input type="hidden" name="__VIEWSTATE" value="vs-classic" />
  <input type="text" name="ctl00$ContentPlaceHolder1$txtTrackNo" id="ContentPlaceHolder1_txtTrackNo" />
  <input type="submit" name="ctl00$ContentPlaceHolder1$btnTrackArticle" value="Track Article" />
</form>
</body></html>
"#;

/// Form page that lost its view state.
pub const STATELESS_FORM: &str = r#"
<html><body><form><input type="text" name="txtItemId" /></form></body></html>
"#;

pub const DELIVERED_RESULTS: &str = r#"
<html><body>
<span id="ContentPlaceHolder1_Label1">Item delivered at , Canada on 16-01-2026 22:41:03</span>
<table id="example" class="table">
  <tr><th>Article Number</th><th>Article Type</th><th>Booking Date</th><th>Origin Country</th><th>Destination Country</th></tr>
  <tr><td>LP951627598IN</td><td>Letter Post</td><td>08-01-2026</td><td>India</td><td>Canada</td></tr>
</table>
<ul class="timeline-events">
  <li><time>16-01-2026 22:41:03</time><strong>Item Delivered</strong><div style="color: grey">Toronto</div></li>
  <li><time>11-01-2026 07:27:00</time><strong>Aircraft take off</strong><div style="color:#666">Flight - AI0187 (DEL to YYZ)</div></li>
  <li><time>08-01-2026 10:12:45</time><strong>Item Booked</strong></li>
</ul>
</body></html>
"#;

pub const UNRECOGNIZED_RESULTS: &str = r#"
<html><body><h1>Welcome</h1><p>Please try again later.</p></body></html>
"#;

pub const ERROR_RESULTS: &str = r#"
<html><body><div class="alert error-message">Invalid Article Number</div></body></html>
"#;

/// Results page with a single event whose text names `number`.
pub fn single_event_results(number: &str) -> String {
    format!(
        r#"<html><body><ul class="events"><li><time>09-01-2026 11:00:00</time><strong>Item Booked {number}</strong></li></ul></body></html>"#
    )
}

/// One request as seen by the mock portal.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decoded value of a urlencoded form field.
    pub fn form_field(&self, name: &str) -> Option<String> {
        url::form_urlencoded::parse(self.body.as_bytes())
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.into_owned())
    }
}

/// Canned reply from the mock portal.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    /// Hold the reply this long before writing anything.
    pub delay: Option<Duration>,
}

impl MockResponse {
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: vec![("Content-Type".into(), "text/html; charset=utf-8".into())],
            body: body.into(),
            delay: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: format!("error {status}"),
            delay: None,
        }
    }

    /// Redirect to `location` with the given 3xx status.
    pub fn redirect(status: u16, location: &str) -> Self {
        Self {
            status,
            headers: vec![("Location".into(), location.into())],
            body: String::new(),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_cookie(mut self, cookie: &str) -> Self {
        self.headers.push(("Set-Cookie".into(), cookie.into()));
        self
    }
}

type Handler = dyn Fn(&RecordedRequest) -> MockResponse + Send + Sync;

/// Programmable stand-in for the tracking portal.
pub struct MockPortal {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockPortal {
    /// Start a portal answering every request with `handler`.
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> MockResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        let recorded = requests.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let handler = handler.clone();
                        let recorded = recorded.clone();
                        tokio::spawn(async move {
                            serve_one(socket, handler, recorded).await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        Self { addr, requests }
    }

    /// Portal that walks the usual home → form → results flow.
    pub async fn standard(form: &'static str, results: &'static str) -> Self {
        Self::start(move |request| match (request.method.as_str(), request.path.as_str()) {
            ("GET", "/") => MockResponse::html("<html><body>home</body></html>")
                .with_cookie("ASP.NET_SessionId=abc123; path=/; HttpOnly"),
            ("GET", TRACK_PATH) => MockResponse::html(form).with_cookie("BIGipServer=pool1; path=/"),
            ("POST", TRACK_PATH) => MockResponse::html(results),
            _ => MockResponse::status(404),
        })
        .await
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Upstream settings pointing at this portal, with no pacing delay.
    pub fn upstream_config(&self) -> UpstreamConfig {
        UpstreamConfig {
            base_url: self.url("/"),
            tracking_url: self.url(TRACK_PATH),
            origin: self.url(""),
            timeout_secs: 5,
            connect_timeout_secs: 2,
            step_delay_ms: 0,
            ..Default::default()
        }
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        let mut config = TrackerConfig::default();
        config.upstream = self.upstream_config();
        config
    }
}

async fn serve_one(
    mut socket: TcpStream,
    handler: Arc<Handler>,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
) {
    let Some(request) = read_request(&mut socket).await else {
        return;
    };
    let response = handler(&request);
    recorded.lock().unwrap().push(request);

    if let Some(delay) = response.delay {
        tokio::time::sleep(delay).await;
    }

    let mut head = format!("HTTP/1.1 {} {}\r\n", response.status, reason(response.status));
    for (name, value) in &response.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        response.body.len()
    ));

    let _ = socket.write_all(head.as_bytes()).await;
    let _ = socket.write_all(response.body.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(RecordedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    })
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Run the API on an ephemeral port. Returns its base URL and the shutdown handle.
pub async fn start_api(config: TrackerConfig) -> (String, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (format!("http://{}", addr), shutdown)
}
