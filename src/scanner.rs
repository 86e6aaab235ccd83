use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

use crate::common::error::{Result, ScanError};
use crate::common::types::{FlightProvider, Location};
use crate::output::OfferSink;

/// Cooperative stop flag shared between the scan loop and a signal handler
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One route scanned over a date range
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub origin: Location,
    pub destination: Location,
    pub from_date: NaiveDate,
    /// Inclusive; `None` searches `from_date` only
    pub to_date: Option<NaiveDate>,
    pub adults: u32,
}

impl ScanRequest {
    fn last_date(&self) -> Result<NaiveDate> {
        match self.to_date {
            Some(to_date) if to_date < self.from_date => Err(ScanError::Config(format!(
                "end date {} is before start date {}",
                to_date, self.from_date
            ))),
            Some(to_date) => Ok(to_date),
            None => Ok(self.from_date),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub dates_searched: usize,
    pub offers_found: usize,
    pub cancelled: bool,
}

/// Runs a provider search for each date of a request and fans results out to sinks
pub struct Scanner<'a> {
    provider: &'a dyn FlightProvider,
    cancel: CancelToken,
}

impl<'a> Scanner<'a> {
    pub fn new(provider: &'a dyn FlightProvider, cancel: CancelToken) -> Self {
        Self { provider, cancel }
    }

    /// Scan every date of the request. Sinks are finished whatever the outcome.
    pub async fn run(
        &self,
        request: &ScanRequest,
        sinks: &mut [&mut dyn OfferSink],
    ) -> Result<ScanSummary> {
        let last_date = request.last_date()?;

        let outcome = self.scan_dates(request, last_date, sinks).await;

        let mut finished = Ok(());
        for sink in sinks.iter_mut() {
            if let Err(e) = sink.finish() {
                warn!("Failed to finish output: {}", e);
                if finished.is_ok() {
                    finished = Err(e);
                }
            }
        }

        let summary = outcome?;
        finished?;
        Ok(summary)
    }

    async fn scan_dates(
        &self,
        request: &ScanRequest,
        last_date: NaiveDate,
        sinks: &mut [&mut dyn OfferSink],
    ) -> Result<ScanSummary> {
        let mut summary = ScanSummary::default();
        let mut date = request.from_date;

        while date <= last_date {
            if self.cancel.is_cancelled() {
                info!("Scan cancelled before {}", date);
                summary.cancelled = true;
                break;
            }

            for sink in sinks.iter_mut() {
                sink.begin_date(date)?;
            }

            let result = self
                .provider
                .search(request.adults, date, &request.origin, &request.destination)
                .await?;
            info!(
                "{}: {} offers on {}",
                self.provider.provider_name(),
                result.offers.len(),
                date
            );

            summary.dates_searched += 1;
            summary.offers_found += result.offers.len();
            for sink in sinks.iter_mut() {
                sink.record(&result)?;
            }

            date = date + Duration::days(1);
        }

        Ok(summary)
    }
}
