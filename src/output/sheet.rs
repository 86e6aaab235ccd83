use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Writer, WriterBuilder};
use tracing::{debug, info};

use crate::common::constants::FLIGHT_DEFAULT_COLUMNS;
use crate::common::error::Result;
use crate::common::types::{FlightOffer, SearchResult};
use crate::normalize::format_duration;
use crate::output::{format_timestamp, OfferSink};

/// Keys every row carries beyond the default flight columns
const EXTRA_COLUMNS: [&str; 2] = ["search_date", "provider"];

/// Appends every offer of a scan to a CSV sheet.
///
/// A new file starts with a header row; an existing file keeps its own header
/// and rows are laid out against it, with unknown keys trailing.
pub struct SheetWriter {
    path: PathBuf,
    provider: &'static str,
    columns: Vec<String>,
    writer: Writer<File>,
    rows: usize,
}

impl SheetWriter {
    pub fn open(path: impl AsRef<Path>, provider: &'static str) -> Result<Self> {
        let path = expand_home(path.as_ref());
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let existing = read_header(&path)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if existing.is_some() && !ends_with_newline(&path)? {
            file.write_all(b"\n")?;
        }
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .has_headers(false)
            .from_writer(file);

        let columns = match existing {
            Some(header) => {
                debug!("Appending to {} with {} columns", path.display(), header.len());
                header
            }
            None => {
                let header: Vec<String> = FLIGHT_DEFAULT_COLUMNS
                    .iter()
                    .chain(EXTRA_COLUMNS.iter())
                    .map(|c| c.to_string())
                    .collect();
                writer.write_record(&header)?;
                header
            }
        };

        Ok(Self {
            path,
            provider,
            columns,
            writer,
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn row(&self, result: &SearchResult, offer: &FlightOffer) -> Vec<String> {
        let values = offer_values(result, offer, self.provider);

        let mut row: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                values
                    .iter()
                    .find(|(key, _)| *key == column.as_str())
                    .map(|(_, value)| value.clone())
                    .unwrap_or_default()
            })
            .collect();

        row.extend(
            values
                .into_iter()
                .filter(|(key, _)| !self.columns.iter().any(|column| column.as_str() == *key))
                .map(|(_, value)| value),
        );
        row
    }
}

impl OfferSink for SheetWriter {
    fn record(&mut self, result: &SearchResult) -> Result<()> {
        for offer in &result.offers {
            let row = self.row(result, offer);
            self.writer.write_record(&row)?;
            self.rows += 1;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        info!("Saved {} offers to {}", self.rows, self.path.display());
        Ok(())
    }
}

fn offer_values(
    result: &SearchResult,
    offer: &FlightOffer,
    provider: &str,
) -> Vec<(&'static str, String)> {
    let stops_detail = offer
        .stop_details
        .iter()
        .map(|stop| {
            format!(
                "{} {} -> {} {} ({})",
                stop.departure_location,
                format_timestamp(&stop.departure_time),
                stop.arrival_location,
                format_timestamp(&stop.arrival_time),
                format_duration(stop.duration())
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let discounts = offer
        .discounts
        .iter()
        .map(|d| format!("{} {} {}", d.amount, d.currency, d.reason))
        .collect::<Vec<_>>()
        .join("\n");

    vec![
        ("price", offer.price.to_string()),
        ("price_currency", offer.currency.clone()),
        ("departure_date", format_timestamp(&offer.departure_time)),
        ("arrival_date", format_timestamp(&offer.arrival_time)),
        ("departure_location", offer.departure_location.clone()),
        ("arrival_location", offer.arrival_location.clone()),
        ("duration", format_duration(offer.duration())),
        ("carrier", offer.carrier.clone()),
        ("stops", offer.stop_count().to_string()),
        ("stops_duration", format_duration(offer.stops_duration)),
        ("stops_detail", stops_detail),
        ("discounts", discounts),
        ("search_date", result.date.format("%Y-%m-%d").to_string()),
        ("provider", provider.to_string()),
    ]
}

/// First row of an existing, non-empty sheet
fn read_header(path: &Path) -> Result<Option<Vec<String>>> {
    if !path.exists() || fs::metadata(path)?.len() == 0 {
        return Ok(None);
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    match reader.records().next() {
        Some(record) => Ok(Some(record?.iter().map(str::to_string).collect())),
        None => Ok(None),
    }
}

fn ends_with_newline(path: &Path) -> Result<bool> {
    let mut file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Expand a leading `~` to the user's home directory
pub fn expand_home(path: &Path) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
