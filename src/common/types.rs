use crate::common::error::Result;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An airport or city resolved through a provider's lookup facility
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub iata: String,
    /// Provider-internal identifier (eDreams geo node); opaque to everything but the adapter
    pub geo_id: Option<String>,
    pub name: String,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// One autocomplete candidate, possibly carrying nested related locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub location: Location,
    pub kind: String,
    /// eDreams geo node type, e.g. "CITY" or "AIRPORT"
    pub geo_kind: Option<String>,
    pub city_code: Option<String>,
    /// Metropolitan area code grouping the city's airports
    pub metro_code: Option<String>,
    pub country_code: Option<String>,
    pub aliases: Vec<String>,
    pub related: Vec<Suggestion>,
}

impl Suggestion {
    /// Pre-order search of this suggestion and its related locations
    pub fn find_iata(&self, iata: &str) -> Option<&Location> {
        if self.location.iata.eq_ignore_ascii_case(iata) {
            return Some(&self.location);
        }
        self.related.iter().find_map(|related| related.find_iata(iata))
    }
}

/// An alternate fare component attached to an offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discount {
    pub amount: Decimal,
    pub currency: String,
    pub reason: String,
}

/// One flown segment of an offer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopDetail {
    pub departure_location: String,
    pub arrival_location: String,
    pub departure_time: DateTime<FixedOffset>,
    pub arrival_time: DateTime<FixedOffset>,
    pub flight_number: Option<String>,
}

impl StopDetail {
    pub fn duration(&self) -> Duration {
        self.arrival_time - self.departure_time
    }
}

/// A single priced one-way itinerary, normalized across providers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightOffer {
    pub price: Decimal,
    pub currency: String,
    pub departure_time: DateTime<FixedOffset>,
    pub arrival_time: DateTime<FixedOffset>,
    pub departure_location: String,
    pub arrival_location: String,
    pub carrier: String,
    /// Sum of the ground time between consecutive segments
    pub stops_duration: Duration,
    pub stop_details: Vec<StopDetail>,
    pub discounts: Vec<Discount>,
}

impl FlightOffer {
    pub fn duration(&self) -> Duration {
        self.arrival_time - self.departure_time
    }

    /// Number of flown segments. This is the value stored and exported as "stops".
    pub fn stop_count(&self) -> usize {
        self.stop_details.len()
    }

    /// Number of intermediate landings, as shown on the console
    pub fn layover_count(&self) -> usize {
        self.stop_count().saturating_sub(1)
    }
}

/// Offers found for one date, cheapest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub date: NaiveDate,
    pub offers: Vec<FlightOffer>,
}

impl SearchResult {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            offers: Vec::new(),
        }
    }
}

/// Core trait that every flight data provider must implement.
///
/// Implementations are only handed out after their session bootstrap
/// succeeded, so every method assumes a ready session.
#[async_trait::async_trait]
pub trait FlightProvider: Send + Sync {
    /// Display name of this provider
    fn provider_name(&self) -> &'static str;

    /// Resolve a user-supplied IATA code into a provider location
    async fn resolve_location(&self, iata: &str) -> Result<Location>;

    /// Search one-way offers for a single date
    async fn search(
        &self,
        adults: u32,
        date: NaiveDate,
        origin: &Location,
        destination: &Location,
    ) -> Result<SearchResult>;

    /// Free-text location lookup
    async fn autocomplete(&self, term: &str) -> Result<Vec<Suggestion>>;
}
