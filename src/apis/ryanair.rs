use std::time::Duration;

use chrono::NaiveDate;
use reqwest::header::REFERER;
use reqwest::StatusCode;
use tracing::{debug, info, instrument, warn};

use crate::apis::session::ProviderSession;
use crate::common::constants::{
    RYANAIR_AUTOCOMPLETE_PATH, RYANAIR_HOME_PATH, RYANAIR_NO_RESOURCE_MARKER, RYANAIR_PROVIDER,
};
use crate::common::error::{Result, ScanError};
use crate::common::types::{FlightProvider, Location, SearchResult, Suggestion};
use crate::config::{Config, RyanairConfig};
use crate::normalize::ryanair::{normalize_availability, AirportSuggestion, AvailabilityResponse};
use crate::registry::ProviderFactory;

/// Low-cost carrier adapter talking to the Ryanair booking API
pub struct RyanairProvider {
    session: ProviderSession,
    market: String,
    request_delay: Duration,
    home_url: String,
}

impl RyanairProvider {
    /// Open a session by loading the market home page, which sets the cookies
    /// the availability API expects.
    #[instrument(skip(config))]
    pub async fn connect(config: &Config) -> Result<Self> {
        let RyanairConfig {
            base_url,
            market,
            request_delay_ms,
        } = &config.ryanair;
        let session = ProviderSession::new(RYANAIR_PROVIDER, base_url, &config.http)?;

        session.get_ok(session.url(RYANAIR_HOME_PATH)?, None).await?;
        let home_url = format!("{}{}", session.base_url(), RYANAIR_HOME_PATH);

        info!("Ryanair session ready");
        Ok(Self {
            session,
            market: market.clone(),
            request_delay: Duration::from_millis(*request_delay_ms),
            home_url,
        })
    }

    fn availability_query(
        adults: u32,
        date: NaiveDate,
        origin: &Location,
        destination: &Location,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("ADT", adults.to_string()),
            ("CHD", "0".to_string()),
            ("Destination", destination.iata.clone()),
            ("Disc", "0".to_string()),
            ("INF", "0".to_string()),
            ("Origin", origin.iata.clone()),
            ("TEEN", "0".to_string()),
            ("promoCode", String::new()),
            ("IncludeConnectingFlights", "false".to_string()),
            ("DateOut", date.format("%Y-%m-%d").to_string()),
            ("FlexDaysOut", "0".to_string()),
            ("FlexDaysBeforeOut", "0".to_string()),
            ("RoundTrip", "false".to_string()),
            ("ToUs", "AGREED".to_string()),
        ]
    }
}

#[async_trait::async_trait]
impl FlightProvider for RyanairProvider {
    fn provider_name(&self) -> &'static str {
        RYANAIR_PROVIDER
    }

    #[instrument(skip(self))]
    async fn resolve_location(&self, iata: &str) -> Result<Location> {
        let not_found = || ScanError::LocationNotFound {
            provider: RYANAIR_PROVIDER,
            iata: iata.to_string(),
        };
        if iata.trim().is_empty() {
            return Err(not_found());
        }

        let suggestions = self.autocomplete(iata).await?;
        suggestions
            .into_iter()
            .map(|suggestion| suggestion.location)
            .find(|location| location.iata.eq_ignore_ascii_case(iata))
            .ok_or_else(not_found)
    }

    #[instrument(skip(self, origin, destination), fields(origin = %origin.iata, destination = %destination.iata))]
    async fn search(
        &self,
        adults: u32,
        date: NaiveDate,
        origin: &Location,
        destination: &Location,
    ) -> Result<SearchResult> {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        let url = self
            .session
            .url(&format!("/api/booking/v4/{}/availability", self.market))?;
        let response = self
            .session
            .client()
            .get(url)
            .query(&Self::availability_query(adults, date, origin, destination))
            .header(REFERER, self.home_url.as_str())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status == StatusCode::NOT_FOUND && body.contains(RYANAIR_NO_RESOURCE_MARKER) {
            warn!("No flight info for {} (or IP blocked)", date);
            return Ok(SearchResult::empty(date));
        }
        if !status.is_success() {
            return Err(self.session.provider_error(status, &body));
        }

        let availability: AvailabilityResponse = serde_json::from_str(&body)?;
        let result = normalize_availability(date, availability)?;
        debug!("Ryanair returned {} offers for {}", result.offers.len(), date);
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn autocomplete(&self, term: &str) -> Result<Vec<Suggestion>> {
        let url = self.session.url(RYANAIR_AUTOCOMPLETE_PATH)?;
        let response = self
            .session
            .client()
            .get(url)
            .query(&[("phrase", term), ("market", self.market.as_str())])
            .header(REFERER, self.home_url.as_str())
            .send()
            .await?;
        let response = self.session.ensure_success(response).await?;

        let airports: Vec<AirportSuggestion> = response.json().await?;
        Ok(airports.into_iter().map(Suggestion::from).collect())
    }
}

/// Registry entry for [`RyanairProvider`]
pub struct RyanairFactory;

#[async_trait::async_trait]
impl ProviderFactory for RyanairFactory {
    fn provider_name(&self) -> &'static str {
        RYANAIR_PROVIDER
    }

    async fn connect(&self, config: &Config) -> Result<Box<dyn FlightProvider>> {
        Ok(Box::new(RyanairProvider::connect(config).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_query_order_and_values() {
        let location = |iata: &str| Location {
            iata: iata.to_string(),
            geo_id: None,
            name: iata.to_string(),
            city: None,
            country: None,
        };
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let query = RyanairProvider::availability_query(1, date, &location("CIA"), &location("BVA"));

        let keys: Vec<_> = query.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys[0], "ADT");
        assert_eq!(keys[keys.len() - 1], "ToUs");
        assert!(query.contains(&("Origin", "CIA".to_string())));
        assert!(query.contains(&("Destination", "BVA".to_string())));
        assert!(query.contains(&("DateOut", "2024-06-01".to_string())));
        assert!(query.contains(&("IncludeConnectingFlights", "false".to_string())));
        assert!(query.contains(&("promoCode", String::new())));
    }
}
