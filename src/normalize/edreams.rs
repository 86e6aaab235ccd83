use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::base::{
    null_as_empty, parse_rfc3339, sort_by_price, text_of, FareComponent, FareSelection,
    LegTimeline,
};
use crate::common::constants::{EDREAMS_PROVIDER, EDREAMS_UNDISCOUNTED_FEE};
use crate::common::error::{Result, ScanError};
use crate::common::types::{FlightOffer, Location, SearchResult, StopDetail, Suggestion};

/// GraphQL envelope of the `searchQuery` response
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<SearchData>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchData {
    #[serde(default)]
    pub search: Option<SearchPayload>,
}

#[derive(Debug, Deserialize)]
pub struct SearchPayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub itineraries: Vec<Itinerary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fees: Vec<Fee>,
    #[serde(default)]
    pub tickets_left: Option<i64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
pub struct Fee {
    pub price: Money,
    #[serde(rename = "type")]
    pub fee_type: FeeType,
}

#[derive(Debug, Deserialize)]
pub struct Money {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct FeeType {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct Leg {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub segments: Vec<Segment>,
}

#[derive(Debug, Deserialize)]
pub struct Segment {
    pub carrier: Carrier,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sections: Vec<Section>,
}

#[derive(Debug, Deserialize)]
pub struct Carrier {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub departure_date: String,
    pub arrival_date: String,
    pub departure: SectionLocation,
    pub destination: SectionLocation,
    #[serde(default)]
    pub flight_code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionLocation {
    pub name: Option<String>,
    pub city_name: Option<String>,
    pub country_name: Option<String>,
    pub location_type: Option<String>,
    pub iata: Option<String>,
}

impl SectionLocation {
    /// "Fiumicino - Rome - Italy - AIRPORT - FCO", skipping absent parts
    pub fn label(&self) -> String {
        [
            &self.name,
            &self.city_name,
            &self.country_name,
            &self.location_type,
            &self.iata,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" - ")
    }
}

/// One entry of the geo autocomplete response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteItem {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub geo_node_id: Option<i64>,
    #[serde(default)]
    pub geo_node_type: Option<String>,
    #[serde(default)]
    pub iata: Option<String>,
    #[serde(default)]
    pub city: Value,
    #[serde(default)]
    pub country: Value,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub location_names: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub related_locations: Vec<AutocompleteItem>,
}

impl From<AutocompleteItem> for Suggestion {
    fn from(item: AutocompleteItem) -> Self {
        Suggestion {
            location: Location {
                iata: item.iata.unwrap_or_default(),
                geo_id: item.geo_node_id.map(|id| id.to_string()),
                name: item.name,
                city: text_of(&item.city),
                country: text_of(&item.country),
            },
            kind: item.kind,
            geo_kind: item.geo_node_type,
            city_code: None,
            metro_code: None,
            country_code: item.country_code,
            aliases: item.location_names,
            related: item
                .related_locations
                .into_iter()
                .map(Suggestion::from)
                .collect(),
        }
    }
}

/// Map a GraphQL search response into the offers for `date`, cheapest first
pub fn normalize_search(date: NaiveDate, response: GraphQlResponse) -> Result<SearchResult> {
    let payload = response.data.and_then(|data| data.search);
    let Some(payload) = payload else {
        let message = response
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ScanError::Provider {
            provider: EDREAMS_PROVIDER,
            status: 200,
            message: if message.is_empty() {
                "search payload missing".to_string()
            } else {
                message
            },
        });
    };

    let total = payload.itineraries.len();
    let mut offers = Vec::with_capacity(total);
    for itinerary in payload.itineraries {
        if let Some(offer) = normalize_itinerary(itinerary)? {
            offers.push(offer);
        }
    }
    debug!("Normalized {} of {} eDreams itineraries", offers.len(), total);

    sort_by_price(&mut offers);
    Ok(SearchResult { date, offers })
}

/// `None` for sold-out itineraries
fn normalize_itinerary(itinerary: Itinerary) -> Result<Option<FlightOffer>> {
    if itinerary.tickets_left == Some(0) {
        return Ok(None);
    }

    let components = itinerary
        .fees
        .into_iter()
        .map(|fee| FareComponent {
            amount: fee.price.amount,
            currency: fee.price.currency,
            reason: fee.fee_type.id,
        })
        .collect();
    let fares = FareSelection::select(components, |c| c.reason == EDREAMS_UNDISCOUNTED_FEE)
        .ok_or_else(|| ScanError::MissingField("itinerary fees".into()))?;

    let segment = itinerary
        .legs
        .into_iter()
        .next()
        .and_then(|leg| leg.segments.into_iter().next())
        .ok_or_else(|| ScanError::MissingField("legs[0].segments[0]".into()))?;

    let mut timeline = LegTimeline::new();
    for section in segment.sections {
        timeline.push(StopDetail {
            departure_location: section.departure.label(),
            arrival_location: section.destination.label(),
            departure_time: parse_rfc3339(&section.departure_date)?,
            arrival_time: parse_rfc3339(&section.arrival_date)?,
            flight_number: section.flight_code,
        });
    }

    timeline.into_offer(fares, segment.carrier.name, None).map(Some)
}
