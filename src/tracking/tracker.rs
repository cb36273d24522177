//! Lookup orchestration.
//!
//! # Data Flow
//! ```text
//! lookup(number, mode)
//!     Demo → demo_record
//!     Live → UpstreamClient::fetch_results
//!          → MarkupParser::parse_results
//!          → derive_status + backfill_dates
//!          → TrackingRecord
//! ```
//!
//! Every failure is folded into the returned record; callers never see an `Err`.
//! A live lookup is bounded by `lookup_timeout_secs` across all of its steps.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::tracking::demo::demo_record;
use crate::tracking::number::TrackingNumber;
use crate::tracking::parser::{CeptParser, MarkupParser};
use crate::tracking::status::{backfill_dates, derive_status};
use crate::tracking::types::{LookupMode, TrackingError, TrackingRecord, TrackingResult, SOURCE};
use crate::tracking::upstream::UpstreamClient;

/// Resolves tracking numbers to records.
#[derive(Clone)]
pub struct Tracker {
    upstream: UpstreamClient,
    parser: Arc<dyn MarkupParser>,
}

impl Tracker {
    /// Create a tracker using the built-in portal parser.
    pub fn new(config: UpstreamConfig) -> TrackingResult<Self> {
        Self::with_parser(config, Arc::new(CeptParser))
    }

    /// Create a tracker with a custom markup parser.
    pub fn with_parser(config: UpstreamConfig, parser: Arc<dyn MarkupParser>) -> TrackingResult<Self> {
        Ok(Self {
            upstream: UpstreamClient::new(config)?,
            parser,
        })
    }

    /// Look up one tracking number.
    pub async fn lookup(&self, number: &TrackingNumber, mode: LookupMode) -> TrackingRecord {
        let start = Instant::now();

        let record = match mode {
            LookupMode::Demo => demo_record(number),
            LookupMode::Live => match self.lookup_within_deadline(number).await {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(
                        tracking_number = %number,
                        kind = e.kind().as_str(),
                        error = %e,
                        "Lookup failed"
                    );
                    TrackingRecord::failed(number, &e)
                }
            },
        };

        let outcome = if record.is_success() { "success" } else { "failure" };
        metrics::record_lookup(mode.as_str(), outcome, start);
        tracing::info!(
            tracking_number = %number,
            mode = mode.as_str(),
            outcome,
            status = record.status.as_deref().unwrap_or("-"),
            events = record.events.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Lookup complete"
        );

        record
    }

    async fn lookup_within_deadline(&self, number: &TrackingNumber) -> TrackingResult<TrackingRecord> {
        let deadline_secs = self.upstream.config().lookup_timeout_secs;
        tokio::time::timeout(Duration::from_secs(deadline_secs), self.lookup_live(number))
            .await
            .unwrap_or(Err(TrackingError::Timeout(deadline_secs)))
    }

    async fn lookup_live(&self, number: &TrackingNumber) -> TrackingResult<TrackingRecord> {
        let html = self.upstream.fetch_results(number, self.parser.as_ref()).await?;
        let page = self.parser.parse_results(&html)?;

        let status = derive_status(&page);
        let summary = page.summary;
        let mut booked_on = summary.booked_on;
        let mut delivered_on = summary.delivered_on;
        backfill_dates(&page.events, status.as_deref(), &mut booked_on, &mut delivered_on);

        Ok(TrackingRecord {
            tracking_number: number.to_string(),
            status,
            events: page.events,
            origin: summary.origin,
            destination: summary.destination,
            booked_on,
            delivered_on,
            article_type: summary.article_type,
            error: None,
            source: SOURCE,
        })
    }
}
