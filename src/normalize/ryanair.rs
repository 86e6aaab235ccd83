use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use super::base::{
    localize, null_as_empty, sort_by_price, FareComponent, FareSelection, LegTimeline,
};
use crate::common::constants::{NOT_AVAILABLE, RYANAIR_PROVIDER};
use crate::common::error::{Result, ScanError};
use crate::common::types::{FlightOffer, Location, SearchResult, StopDetail, Suggestion};

/// Body of `/api/booking/v4/{market}/availability`
#[derive(Debug, Deserialize)]
pub struct AvailabilityResponse {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub trips: Vec<Trip>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub origin: String,
    pub origin_name: String,
    pub destination: String,
    pub destination_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dates: Vec<TripDate>,
}

#[derive(Debug, Deserialize)]
pub struct TripDate {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub flights: Vec<Flight>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    #[serde(default)]
    pub fares_left: Option<i64>,
    #[serde(default)]
    pub flight_number: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub time: Vec<String>,
    #[serde(rename = "timeUTC", default, deserialize_with = "null_as_empty")]
    pub time_utc: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub segments: Vec<FlightSegment>,
    #[serde(default)]
    pub operated_by: Option<String>,
    #[serde(default)]
    pub regular_fare: Option<RegularFare>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSegment {
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub flight_number: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub time: Vec<String>,
    #[serde(rename = "timeUTC", default, deserialize_with = "null_as_empty")]
    pub time_utc: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegularFare {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fares: Vec<Fare>,
}

#[derive(Debug, Deserialize)]
pub struct Fare {
    #[serde(rename = "type", default)]
    pub fare_type: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

/// One airport from `/api/locate/v1/autocomplete/airports`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirportSuggestion {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub city: Option<NamedCode>,
    #[serde(default)]
    pub country: Option<NamedCode>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedCode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub mac_code: Option<String>,
}

impl From<AirportSuggestion> for Suggestion {
    fn from(airport: AirportSuggestion) -> Self {
        Suggestion {
            location: Location {
                iata: airport.code,
                geo_id: None,
                name: airport.name,
                city: airport.city.as_ref().map(|city| city.name.clone()),
                country: airport.country.as_ref().map(|country| country.name.clone()),
            },
            kind: "AIRPORT".to_string(),
            geo_kind: None,
            city_code: airport.city.as_ref().map(|city| city.code.clone()),
            metro_code: airport.city.and_then(|city| city.mac_code),
            country_code: airport.country.map(|country| country.code),
            aliases: airport.aliases,
            related: Vec::new(),
        }
    }
}

/// Map an availability response into the offers for `date`, cheapest first
pub fn normalize_availability(
    date: NaiveDate,
    response: AvailabilityResponse,
) -> Result<SearchResult> {
    let currency = response
        .currency
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let Some(trip) = response.trips.into_iter().next() else {
        return Ok(SearchResult::empty(date));
    };
    let departure_label = format!("{} - {}", trip.origin_name, trip.origin);
    let arrival_label = format!("{} - {}", trip.destination_name, trip.destination);

    let Some(trip_date) = trip.dates.into_iter().next() else {
        return Ok(SearchResult::empty(date));
    };

    let total = trip_date.flights.len();
    let mut offers = Vec::with_capacity(total);
    for flight in trip_date.flights {
        let labels = (departure_label.clone(), arrival_label.clone());
        let route = (trip.origin.as_str(), trip.destination.as_str());
        if let Some(offer) = normalize_flight(flight, &currency, route, labels)? {
            offers.push(offer);
        }
    }
    debug!("Normalized {} of {} Ryanair flights", offers.len(), total);

    sort_by_price(&mut offers);
    Ok(SearchResult { date, offers })
}

/// `None` for sold-out flights
fn normalize_flight(
    flight: Flight,
    currency: &str,
    route: (&str, &str),
    labels: (String, String),
) -> Result<Option<FlightOffer>> {
    if flight.fares_left == Some(0) {
        return Ok(None);
    }

    let components: Vec<FareComponent> = flight
        .regular_fare
        .map(|regular| regular.fares)
        .unwrap_or_default()
        .into_iter()
        .map(|fare| FareComponent {
            amount: fare.amount,
            currency: currency.to_string(),
            reason: fare.fare_type,
        })
        .collect();
    // No regular fare means nothing left to sell
    let Some(fares) = FareSelection::first(components) else {
        debug!("Skipping Ryanair flight {:?} without regular fares", flight.flight_number);
        return Ok(None);
    };

    let mut timeline = LegTimeline::new();
    for segment in &flight.segments {
        let (departure_time, arrival_time) = time_pair(&segment.time, &segment.time_utc)?;
        timeline.push(StopDetail {
            departure_location: segment.origin.clone(),
            arrival_location: segment.destination.clone(),
            departure_time,
            arrival_time,
            flight_number: segment.flight_number.clone(),
        });
    }
    if timeline.is_empty() {
        let (departure_time, arrival_time) = time_pair(&flight.time, &flight.time_utc)?;
        timeline.push(StopDetail {
            departure_location: route.0.to_string(),
            arrival_location: route.1.to_string(),
            departure_time,
            arrival_time,
            flight_number: flight.flight_number.clone(),
        });
    }

    let carrier = flight
        .operated_by
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| RYANAIR_PROVIDER.to_string());

    timeline.into_offer(fares, carrier, Some(labels)).map(Some)
}

/// Departure and arrival from a `[departure, arrival]` local pair and its UTC twin
fn time_pair(
    local: &[String],
    utc: &[String],
) -> Result<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
    let (Some(departure), Some(arrival)) = (local.first(), local.get(1)) else {
        return Err(ScanError::MissingField("time[0..2]".into()));
    };
    let departure = localize(departure, utc.first().map(String::as_str))?;
    let arrival = localize(arrival, utc.get(1).map(String::as_str))?;
    Ok((departure, arrival))
}
