use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::common::error::Result;
use crate::common::types::SearchResult;

pub mod console;
pub mod sheet;

pub use console::{print_suggestion, ConsolePrinter};
pub use sheet::{expand_home, SheetWriter};

/// Destination for the results of a scan.
///
/// The scanner calls `begin_date` before each search, `record` once per
/// searched date, and `finish` exactly once when the scan ends for any reason.
pub trait OfferSink {
    fn begin_date(&mut self, _date: NaiveDate) -> Result<()> {
        Ok(())
    }

    fn record(&mut self, result: &SearchResult) -> Result<()>;

    fn finish(&mut self) -> Result<()>;
}

pub(crate) fn format_timestamp(value: &DateTime<FixedOffset>) -> String {
    value.format("%Y-%m-%d %H:%M:%S%:z").to_string()
}
