//! Portal markup parsing.
//!
//! # Responsibilities
//! - Read ASP.NET form state from the tracking form page
//! - Extract events, article summary and status label from results pages
//! - Tell "portal reported an error" apart from "page not understood"
//!
//! # Design Decisions
//! - All knowledge of the portal's markup lives behind [`MarkupParser`]
//! - Parsing is synchronous and returns owned data; the DOM never crosses an await
//! - Matching is structural (tags, ids, classes) with text patterns as fallback

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::tracking::status::classify_status;
use crate::tracking::types::{FormPage, ParsedPage, Summary, TrackingError, TrackingEvent, TrackingResult};

/// Reads the portal's pages.
pub trait MarkupParser: Send + Sync {
    /// Extract the form state needed to post a tracking request.
    fn parse_form(&self, html: &str) -> FormPage;

    /// Extract tracking data from a results page.
    fn parse_results(&self, html: &str) -> TrackingResult<ParsedPage>;
}

const HIDDEN_FIELDS: [&str; 6] = [
    "__VIEWSTATE",
    "__VIEWSTATEGENERATOR",
    "__EVENTVALIDATION",
    "__EVENTTARGET",
    "__EVENTARGUMENT",
    "__PREVIOUSPAGE",
];

const INPUT_ID_HINTS: [&str; 4] = ["track", "item", "article", "consignment"];
const INPUT_NAME_HINTS: [&str; 2] = ["track", "item"];
const EVENT_TABLE_HINTS: [&str; 7] = ["grd", "grid", "gv", "gridview", "track", "event", "result"];
const EVENT_HEADER_WORDS: [&str; 6] = ["date", "time", "office", "event", "status", "location"];

/// The article summary table on results pages.
const ARTICLE_TABLE_ID: &str = "example";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern is valid")
}

static INPUT: LazyLock<Selector> = LazyLock::new(|| selector("input"));
static BUTTON: LazyLock<Selector> = LazyLock::new(|| selector("button"));
static UL: LazyLock<Selector> = LazyLock::new(|| selector("ul"));
static LI: LazyLock<Selector> = LazyLock::new(|| selector("li"));
static TIME: LazyLock<Selector> = LazyLock::new(|| selector("time"));
static STRONG: LazyLock<Selector> = LazyLock::new(|| selector("strong"));
static DIV: LazyLock<Selector> = LazyLock::new(|| selector("div"));
static SPAN: LazyLock<Selector> = LazyLock::new(|| selector("span"));
static ERROR_BLOCK: LazyLock<Selector> = LazyLock::new(|| selector("div, span"));
static TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table"));
static TR: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td, th"));

static POSTBACK: LazyLock<Regex> = LazyLock::new(|| regex(r"__doPostBack\('([^']+)'"));
static TRACK_BUTTON_VALUE: LazyLock<Regex> = LazyLock::new(|| regex(r"(?i)track|article"));
static GENERIC_BUTTON_VALUE: LazyLock<Regex> = LazyLock::new(|| regex(r"(?i)track|submit|search|go"));
static DELIVERED_ON: LazyLock<Regex> =
    LazyLock::new(|| regex(r"on\s+(\d{2}-\d{2}-\d{4}\s+\d{2}:\d{2}:\d{2})"));
static ORIGIN_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)(?:\bfrom\s*:|\borigin\b\s*:?|\bbooked\s+at\b\s*:?)\s*([A-Za-z][A-Za-z ]{0,59})")
});
static DESTINATION_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)(?:\bto\s*:|\bdestination\b\s*:?|\bdelivery\s+at\b\s*:?)\s*([A-Za-z][A-Za-z ]{0,59})")
});
static BOOKED_ON_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)(?:\bbooked\s*on\b|\bbooking\s*date\b)[:\s]*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})")
});

/// Parser for the India Post MIS CEPT portal.
#[derive(Debug, Clone, Copy, Default)]
pub struct CeptParser;

impl MarkupParser for CeptParser {
    fn parse_form(&self, html: &str) -> FormPage {
        let doc = Html::parse_document(html);
        FormPage {
            hidden_fields: hidden_fields(&doc),
            input_field: input_field(&doc),
            submit_button: submit_button(&doc),
            postback_target: postback_target(&doc),
        }
    }

    fn parse_results(&self, html: &str) -> TrackingResult<ParsedPage> {
        let doc = Html::parse_document(html);

        if let Some(message) = upstream_error(&doc) {
            return Err(TrackingError::NotFound(message));
        }

        let events = parse_events(&doc);
        let summary = extract_summary(&doc);
        let status_label = status_label(&doc);

        tracing::debug!(
            events = events.len(),
            has_label = status_label.is_some(),
            "Parsed results page"
        );

        if events.is_empty() && status_label.is_none() {
            return Err(TrackingError::Unrecognized);
        }

        Ok(ParsedPage {
            events,
            summary,
            status_label,
        })
    }
}

/// Whitespace-normalized text content of an element.
fn text_of(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn attr<'a>(el: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name)
}

fn attr_contains(el: &ElementRef<'_>, name: &str, needle: &str) -> bool {
    attr(el, name)
        .map(|v| v.to_lowercase().contains(needle))
        .unwrap_or(false)
}

fn attr_contains_any(el: &ElementRef<'_>, name: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| attr_contains(el, name, needle))
}

fn has_type(el: &ElementRef<'_>, kind: &str) -> bool {
    attr(el, "type")
        .map(|t| t.eq_ignore_ascii_case(kind))
        .unwrap_or(false)
}

fn is_text_input(el: &ElementRef<'_>) -> bool {
    attr(el, "type")
        .map(|t| t.eq_ignore_ascii_case("text"))
        .unwrap_or(true)
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn hidden_fields(doc: &Html) -> Vec<(String, String)> {
    HIDDEN_FIELDS
        .iter()
        .filter_map(|field| {
            doc.select(&INPUT)
                .find(|el| attr(el, "name") == Some(*field))
                .and_then(|el| attr(&el, "value"))
                .filter(|value| !value.is_empty())
                .map(|value| (field.to_string(), value.to_string()))
        })
        .collect()
}

fn input_field(doc: &Html) -> Option<String> {
    let text_inputs: Vec<ElementRef<'_>> = doc
        .select(&INPUT)
        .filter(is_text_input)
        .filter(|el| attr(el, "name").is_some_and(|n| !n.is_empty()))
        .collect();

    let by_hint = |attribute: &str, hints: &[&str]| {
        hints.iter().find_map(|hint| {
            text_inputs
                .iter()
                .find(|el| attr_contains(el, attribute, hint))
                .and_then(|el| attr(el, "name"))
        })
    };

    by_hint("id", &INPUT_ID_HINTS[..])
        .or_else(|| by_hint("name", &INPUT_NAME_HINTS[..]))
        .or_else(|| {
            text_inputs
                .iter()
                .filter_map(|el| attr(el, "name"))
                .find(|name| !name.starts_with("__"))
        })
        .map(str::to_string)
}

fn submit_button(doc: &Html) -> Option<String> {
    let named = |el: &ElementRef<'_>| attr(el, "name").is_some_and(|n| !n.is_empty());
    let value_matches = |el: &ElementRef<'_>, pattern: &Regex| {
        attr(el, "value").is_some_and(|v| pattern.is_match(v))
    };

    let inputs: Vec<ElementRef<'_>> = doc.select(&INPUT).filter(named).collect();

    inputs
        .iter()
        .find(|el| has_type(el, "submit") && value_matches(el, &*TRACK_BUTTON_VALUE))
        .or_else(|| inputs.iter().find(|el| has_type(el, "submit")))
        .or_else(|| {
            inputs
                .iter()
                .find(|el| has_type(el, "button") && value_matches(el, &*GENERIC_BUTTON_VALUE))
        })
        .copied()
        .or_else(|| {
            doc.select(&BUTTON)
                .find(|el| has_type(el, "submit") && named(el))
        })
        .and_then(|el| attr(&el, "name"))
        .map(str::to_string)
}

fn postback_target(doc: &Html) -> Option<String> {
    doc.select(&BUTTON)
        .chain(doc.select(&INPUT))
        .filter(|el| has_type(el, "submit"))
        .filter_map(|el| attr(&el, "onclick"))
        .find_map(|onclick| POSTBACK.captures(onclick))
        .map(|caps| caps[1].to_string())
}

fn upstream_error(doc: &Html) -> Option<String> {
    doc.select(&ERROR_BLOCK)
        .filter(|el| attr_contains(el, "class", "error"))
        .map(|el| text_of(&el))
        .find(|text| !text.is_empty())
}

fn parse_events(doc: &Html) -> Vec<TrackingEvent> {
    if let Some(list) = doc.select(&UL).find(|el| attr_contains(el, "class", "events")) {
        return parse_event_list(&list);
    }

    match find_event_table(doc) {
        Some(table) => parse_event_table(&table),
        None => {
            tracing::debug!(tables = doc.select(&TABLE).count(), "No tracking table found");
            Vec::new()
        }
    }
}

/// `<ul class="events">` layout: `<time>`, `<strong>` and a colored detail `<div>` per item.
fn parse_event_list(list: &ElementRef<'_>) -> Vec<TrackingEvent> {
    list.select(&LI)
        .filter_map(|item| {
            let event = item.select(&STRONG).next().map(|el| text_of(&el)).unwrap_or_default();
            if event.is_empty() {
                return None;
            }

            let stamp = item.select(&TIME).next().map(|el| text_of(&el)).unwrap_or_default();
            let mut parts = stamp.split_whitespace();
            let date = parts.next().unwrap_or_default().to_string();
            let time = parts.next().unwrap_or_default().to_string();

            let location = item
                .select(&DIV)
                .find(|el| attr_contains(el, "style", "color"))
                .map(|el| text_of(&el))
                .and_then(non_empty);

            Some(TrackingEvent {
                date,
                time,
                office: String::new(),
                event,
                location,
            })
        })
        .collect()
}

fn find_event_table<'a>(doc: &'a Html) -> Option<ElementRef<'a>> {
    let tables: Vec<ElementRef<'a>> = doc
        .select(&TABLE)
        .filter(|el| attr(el, "id") != Some(ARTICLE_TABLE_ID))
        .collect();

    let mut class_hints = EVENT_TABLE_HINTS.to_vec();
    class_hints.push("table");

    tables
        .iter()
        .find(|t| attr_contains_any(t, "id", &EVENT_TABLE_HINTS))
        .or_else(|| tables.iter().find(|t| attr_contains_any(t, "class", &class_hints)))
        .or_else(|| {
            tables.iter().find(|t| {
                t.select(&TR).next().is_some_and(|header| {
                    let text = text_of(&header).to_lowercase();
                    EVENT_HEADER_WORDS.iter().any(|word| text.contains(word))
                })
            })
        })
        .copied()
}

/// Grid layout: header row, then date | time | office | event | location.
fn parse_event_table(table: &ElementRef<'_>) -> Vec<TrackingEvent> {
    table
        .select(&TR)
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&CELL).map(|c| text_of(&c)).collect();
            if cells.len() < 3 {
                return None;
            }
            let cell = |i: usize| cells.get(i).cloned().unwrap_or_default();

            let event = TrackingEvent {
                date: cell(0),
                time: cell(1),
                office: cell(2),
                event: cell(3),
                location: cells.get(4).cloned(),
            };
            (!event.date.is_empty() || !event.event.is_empty()).then_some(event)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SummaryColumn {
    Origin,
    Destination,
    BookedOn,
    DeliveredOn,
    ArticleType,
}

impl SummaryColumn {
    fn from_header(header: &str) -> Option<Self> {
        if header.contains("origin") {
            Some(Self::Origin)
        } else if header.contains("destination") {
            Some(Self::Destination)
        } else if header.contains("booked on") || (header.contains("book") && header.contains("date")) {
            Some(Self::BookedOn)
        } else if header.contains("deliver") && header.contains("date") {
            Some(Self::DeliveredOn)
        } else if header.contains("type") {
            Some(Self::ArticleType)
        } else {
            None
        }
    }

    fn slot(self, summary: &mut Summary) -> &mut Option<String> {
        match self {
            Self::Origin => &mut summary.origin,
            Self::Destination => &mut summary.destination,
            Self::BookedOn => &mut summary.booked_on,
            Self::DeliveredOn => &mut summary.delivered_on,
            Self::ArticleType => &mut summary.article_type,
        }
    }
}

fn extract_summary(doc: &Html) -> Summary {
    let mut summary = Summary::default();
    // Columns the article table declares are authoritative, even when empty.
    let mut declared: Vec<SummaryColumn> = Vec::new();

    if let Some(table) = doc
        .select(&TABLE)
        .find(|el| attr(el, "id") == Some(ARTICLE_TABLE_ID))
    {
        let rows: Vec<ElementRef<'_>> = table.select(&TR).collect();
        if rows.len() >= 2 {
            let headers: Vec<String> = rows[0].select(&CELL).map(|c| text_of(&c).to_lowercase()).collect();
            let cells: Vec<String> = rows[1].select(&CELL).map(|c| text_of(&c)).collect();

            for (header, value) in headers.iter().zip(cells) {
                let Some(column) = SummaryColumn::from_header(header) else {
                    continue;
                };
                declared.push(column);
                let slot = column.slot(&mut summary);
                if slot.is_none() {
                    *slot = non_empty(value);
                }
            }
        }
    }

    if summary.delivered_on.is_none() {
        summary.delivered_on = doc
            .select(&SPAN)
            .filter(|el| attr_contains(el, "id", "label"))
            .find_map(|el| {
                DELIVERED_ON
                    .captures(&text_of(&el))
                    .map(|caps| caps[1].to_string())
            });
    }

    let fallbacks = [
        (SummaryColumn::Origin, &*ORIGIN_TEXT),
        (SummaryColumn::Destination, &*DESTINATION_TEXT),
        (SummaryColumn::BookedOn, &*BOOKED_ON_TEXT),
    ];
    let pending: Vec<_> = fallbacks
        .into_iter()
        .filter(|(column, _)| !declared.contains(column) && column.slot(&mut summary).is_none())
        .collect();

    if !pending.is_empty() {
        let text = doc.root_element().text().collect::<Vec<_>>().join("\n");
        for (column, pattern) in pending {
            *column.slot(&mut summary) = pattern
                .captures(&text)
                .map(|caps| caps[1].trim().to_string())
                .and_then(non_empty);
        }
    }

    summary
}

fn status_label(doc: &Html) -> Option<String> {
    doc.select(&SPAN)
        .filter(|el| attr_contains(el, "id", "label"))
        .map(|el| text_of(&el))
        .find(|text| classify_status(text).is_some())
}
