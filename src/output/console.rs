use std::io::{self, Stdout, Write};

use chrono::NaiveDate;

use crate::common::constants::NOT_AVAILABLE;
use crate::common::error::Result;
use crate::common::types::{FlightOffer, SearchResult, Suggestion};
use crate::normalize::format_duration;
use crate::output::{format_timestamp, OfferSink};

/// Human-readable scan output
pub struct ConsolePrinter<W: Write> {
    out: W,
    print_all: bool,
    print_detail: bool,
}

impl ConsolePrinter<Stdout> {
    pub fn stdout(print_all: bool, print_detail: bool) -> Self {
        Self::new(io::stdout(), print_all, print_detail)
    }
}

impl<W: Write> ConsolePrinter<W> {
    pub fn new(out: W, print_all: bool, print_detail: bool) -> Self {
        Self {
            out,
            print_all,
            print_detail,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn print_offer(&mut self, offer: &FlightOffer) -> io::Result<()> {
        let out = &mut self.out;
        writeln!(
            out,
            "  • ✈️  FOUND: {} {} - {} - 🕓 {} ✈️ ",
            offer.price,
            offer.currency,
            offer.carrier,
            format_duration(offer.duration())
        )?;

        if !self.print_detail {
            return Ok(());
        }

        writeln!(out, "  Departure: {}", format_timestamp(&offer.departure_time))?;
        writeln!(out, "  From: {}", offer.departure_location)?;
        writeln!(out, "  Arrival: {}", format_timestamp(&offer.arrival_time))?;
        writeln!(out, "  To: {}", offer.arrival_location)?;

        if offer.stop_count() > 1 {
            writeln!(
                out,
                "  Stops: {} - No Fly Duration: {}",
                offer.layover_count(),
                format_duration(offer.stops_duration)
            )?;
            for (index, stop) in offer.stop_details.iter().enumerate() {
                writeln!(out, "   • ✈️  STOP {}  ✈️ ", index + 1)?;
                writeln!(out, "   Departure: {}", format_timestamp(&stop.departure_time))?;
                writeln!(out, "   From: {}", stop.departure_location)?;
                writeln!(out, "   Arrival: {}", format_timestamp(&stop.arrival_time))?;
                writeln!(out, "   To: {}", stop.arrival_location)?;
                writeln!(out, "   Duration: {}", format_duration(stop.duration()))?;
            }
        }

        if !offer.discounts.is_empty() {
            writeln!(out, "  Available Discounts:")?;
            for discount in &offer.discounts {
                writeln!(
                    out,
                    "   Discount: {} {} {}",
                    discount.amount, discount.currency, discount.reason
                )?;
            }
        }

        writeln!(out)
    }
}

impl<W: Write> OfferSink for ConsolePrinter<W> {
    fn begin_date(&mut self, date: NaiveDate) -> Result<()> {
        writeln!(self.out, "Searching for {date} ...")?;
        Ok(())
    }

    fn record(&mut self, result: &SearchResult) -> Result<()> {
        // Offers arrive cheapest first
        for offer in &result.offers {
            self.print_offer(offer)?;
            if !self.print_detail || !self.print_all {
                break;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

fn kind_icon(kind: &str) -> &'static str {
    match kind {
        "CITY" => "🌆",
        "AIRPORT" => "✈️",
        "COUNTRY" => "🌎",
        "NEAREST" => "📍",
        "IATA_CODE" => "🌐",
        _ => "•",
    }
}

/// Render an autocomplete suggestion and its related locations, indented by depth
pub fn print_suggestion<W: Write>(out: &mut W, suggestion: &Suggestion, depth: usize) -> io::Result<()> {
    let head = "  ".repeat(depth);
    let body = "  ".repeat(depth + 1);
    let location = &suggestion.location;

    writeln!(out, "{head}• {} {}", suggestion.kind, kind_icon(&suggestion.kind))?;
    writeln!(out, "{body}Name: {}", location.name)?;
    match &location.geo_id {
        Some(geo_id) => writeln!(
            out,
            "{body}Geo: {geo_id} ({}) - IATA: {}",
            suggestion.geo_kind.as_deref().unwrap_or(NOT_AVAILABLE),
            location.iata
        )?,
        None => writeln!(out, "{body}IATA: {}", location.iata)?,
    }
    let city = location.city.as_deref().unwrap_or(NOT_AVAILABLE);
    match &suggestion.city_code {
        Some(code) => writeln!(
            out,
            "{body}City: {city} - {code} ({})",
            suggestion.metro_code.as_deref().unwrap_or(NOT_AVAILABLE)
        )?,
        None => writeln!(out, "{body}City: {city}")?,
    }
    writeln!(
        out,
        "{body}Country: {} ({})",
        location.country.as_deref().unwrap_or(NOT_AVAILABLE),
        suggestion.country_code.as_deref().unwrap_or(NOT_AVAILABLE)
    )?;
    writeln!(out, "{body}Location Names: {}", suggestion.aliases.join(", "))?;

    if !suggestion.related.is_empty() {
        writeln!(out, "{body}Related Locations:")?;
        for related in &suggestion.related {
            print_suggestion(out, related, depth + 1)?;
        }
    }
    Ok(())
}
