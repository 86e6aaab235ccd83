use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::common::error::{Result, ScanError};
use crate::common::types::{Discount, FlightOffer, StopDetail};

/// Accumulates the flown segments of one itinerary in order.
///
/// The first pushed segment fixes the departure side of the offer, the last
/// one the arrival side; every gap between consecutive segments is summed
/// into the layover duration.
#[derive(Debug)]
pub struct LegTimeline {
    stops: Vec<StopDetail>,
    stops_duration: Duration,
}

impl LegTimeline {
    pub fn new() -> Self {
        Self {
            stops: Vec::new(),
            stops_duration: Duration::zero(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn push(&mut self, segment: StopDetail) {
        if let Some(previous) = self.stops.last() {
            self.stops_duration =
                self.stops_duration + (segment.departure_time - previous.arrival_time);
        }
        self.stops.push(segment);
    }

    pub fn stops_duration(&self) -> Duration {
        self.stops_duration
    }

    /// Build the offer. Offer endpoints come from the segments unless the
    /// provider labels its route separately (`route_labels`).
    pub fn into_offer(
        self,
        fares: FareSelection,
        carrier: String,
        route_labels: Option<(String, String)>,
    ) -> Result<FlightOffer> {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(ScanError::MissingField("itinerary has no segments".into())),
        };
        if fares.price < Decimal::ZERO {
            return Err(ScanError::InvalidPrice(fares.price));
        }

        let (departure_location, arrival_location) = route_labels.unwrap_or_else(|| {
            (first.departure_location.clone(), last.arrival_location.clone())
        });

        Ok(FlightOffer {
            price: fares.price,
            currency: fares.currency,
            departure_time: first.departure_time,
            arrival_time: last.arrival_time,
            departure_location,
            arrival_location,
            carrier,
            stops_duration: self.stops_duration,
            stop_details: self.stops,
            discounts: fares.discounts,
        })
    }
}

impl Default for LegTimeline {
    fn default() -> Self {
        Self::new()
    }
}

/// The displayed price and the remaining fare components of one offer
#[derive(Debug, Clone, PartialEq)]
pub struct FareSelection {
    pub price: Decimal,
    pub currency: String,
    pub discounts: Vec<Discount>,
}

/// A priced fare component as read from a provider payload
#[derive(Debug, Clone)]
pub struct FareComponent {
    pub amount: Decimal,
    pub currency: String,
    pub reason: String,
}

impl FareSelection {
    /// Pick the component `is_primary` accepts as the price (the first one if
    /// none does); all other components become discounts.
    pub fn select<F>(components: Vec<FareComponent>, is_primary: F) -> Option<Self>
    where
        F: Fn(&FareComponent) -> bool,
    {
        let primary_index = components.iter().position(&is_primary).unwrap_or(0);
        if primary_index >= components.len() {
            return None;
        }

        let mut price = None;
        let mut discounts = Vec::with_capacity(components.len().saturating_sub(1));
        for (index, component) in components.into_iter().enumerate() {
            if index == primary_index {
                price = Some((component.amount, component.currency));
            } else {
                discounts.push(Discount {
                    amount: component.amount,
                    currency: component.currency,
                    reason: component.reason,
                });
            }
        }

        let (price, currency) = price?;
        Some(Self {
            price,
            currency,
            discounts,
        })
    }
}

impl FareSelection {
    /// The first component is the price
    pub fn first(components: Vec<FareComponent>) -> Option<Self> {
        Self::select(components, |_| false)
    }
}

/// Stable ascending sort; equal prices keep their provider order
pub fn sort_by_price(offers: &mut [FlightOffer]) {
    offers.sort_by(|a, b| a.price.cmp(&b.price));
}

/// Parse an RFC 3339 timestamp ("2024-06-01T06:30:00Z", "...+02:00", fractions allowed)
pub fn parse_rfc3339(value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).map_err(|e| ScanError::InvalidTimestamp {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Parse an offset-less ISO timestamp ("2024-06-01T06:30:00.000")
pub fn parse_naive(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map_err(|e| {
        ScanError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Attach the offset implied by a local wall-clock time and its UTC counterpart.
/// Without a UTC counterpart the local time is taken as UTC.
pub fn localize(local: &str, utc: Option<&str>) -> Result<DateTime<FixedOffset>> {
    let local_time = parse_naive(local)?;
    let offset_seconds = match utc {
        Some(utc) => {
            let utc_time = parse_naive(utc.trim_end_matches('Z'))?;
            (local_time - utc_time).num_seconds()
        }
        None => 0,
    };

    let offset = i32::try_from(offset_seconds)
        .ok()
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| ScanError::InvalidTimestamp {
            value: local.to_string(),
            reason: format!("offset of {offset_seconds}s is out of range"),
        })?;

    offset
        .from_local_datetime(&local_time)
        .single()
        .ok_or_else(|| ScanError::InvalidTimestamp {
            value: local.to_string(),
            reason: "ambiguous local time".to_string(),
        })
}

/// Treat an explicit JSON `null` like a missing list
pub fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A display string from a field that is either plain text or an object with a `name`
pub fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Object(map) => map.get("name").and_then(text_of),
        _ => None,
    }
}

/// Render a duration as `H:MM:SS`, prefixed with `N day(s), ` past 24 hours
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();

    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    match days {
        0 => format!("{sign}{hours}:{minutes:02}:{seconds:02}"),
        1 => format!("{sign}1 day, {hours}:{minutes:02}:{seconds:02}"),
        n => format!("{sign}{n} days, {hours}:{minutes:02}:{seconds:02}"),
    }
}
