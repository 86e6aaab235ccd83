use chrono::NaiveDate;
use reqwest::header::REFERER;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use crate::apis::session::ProviderSession;
use crate::common::constants::{
    EDREAMS_AUTOCOMPLETE_PATH, EDREAMS_GRAPHQL_PATH, EDREAMS_PROVIDER, EDREAMS_SESSION_COOKIE,
    EDREAMS_VISITOR_PATH, EDREAMS_VISIT_COOKIE,
};
use crate::common::error::{Result, ScanError};
use crate::common::types::{FlightProvider, Location, SearchResult, Suggestion};
use crate::config::Config;
use crate::normalize::edreams::{normalize_search, AutocompleteItem, GraphQlResponse};
use crate::registry::ProviderFactory;

const SEARCH_QUERY: &str = include_str!("edreams_search.graphql");

/// Metasearch adapter talking to the eDreams frontend GraphQL API
pub struct EDreamsProvider {
    session: ProviderSession,
    visit: String,
    jsession: String,
}

impl EDreamsProvider {
    /// Open a session: home page for the visit cookie, then the visitor
    /// endpoint for the JSESSION cookie. Both must answer 200.
    #[instrument(skip(config))]
    pub async fn connect(config: &Config) -> Result<Self> {
        let session =
            ProviderSession::new(EDREAMS_PROVIDER, &config.edreams.base_url, &config.http)?;

        let home = session.get_ok(session.url("/")?, None).await?;
        let visitor = session
            .get_ok(session.url(EDREAMS_VISITOR_PATH)?, Some(session.base_url()))
            .await?;

        // Read from the Set-Cookie headers: the jar would filter path-scoped
        // cookies out of requests to the GraphQL endpoint.
        let graphql_url = session.url(EDREAMS_GRAPHQL_PATH)?;
        let responses = [&home, &visitor];
        let visit = session.issued_cookie(&responses, &graphql_url, EDREAMS_VISIT_COOKIE)?;
        let jsession = session.issued_cookie(&responses, &graphql_url, EDREAMS_SESSION_COOKIE)?;

        info!("eDreams session ready");
        Ok(Self {
            session,
            visit,
            jsession,
        })
    }

    fn search_body(
        adults: u32,
        date: NaiveDate,
        origin: &Location,
        destination: &Location,
    ) -> Value {
        json!({
            "query": SEARCH_QUERY,
            "variables": {
                "searchRequest": {
                    "buyPath": 71,
                    "tripType": "ONE_WAY",
                    "itinerary": {
                        "numAdults": adults,
                        "numChildren": 0,
                        "numInfants": 0,
                        "cabinClass": "TOURIST",
                        "resident": false,
                        "mainAirportsOnly": false,
                        "externalSelection": null,
                        "segments": [{
                            "date": date.format("%Y-%m-%d").to_string(),
                            "departure": {"iata": origin.iata, "geoNodeId": geo_node(origin)},
                            "destination": {"iata": destination.iata, "geoNodeId": geo_node(destination)}
                        }]
                    }
                }
            }
        })
    }

    fn autocomplete_path(term: &str) -> String {
        format!(
            "{EDREAMS_AUTOCOMPLETE_PATH};searchWord={};departureOrArrival=ARRIVAL;\
             addSearchByCountry=true;addSearchByRegion=true;nearestLocations=true;product=FLIGHT",
            urlencoding::encode(term)
        )
    }
}

/// Geo node ids are numeric on the wire
fn geo_node(location: &Location) -> Value {
    match location.geo_id.as_deref() {
        Some(id) => id.parse::<i64>().map(Value::from).unwrap_or_else(|_| Value::from(id)),
        None => Value::Null,
    }
}

#[async_trait::async_trait]
impl FlightProvider for EDreamsProvider {
    fn provider_name(&self) -> &'static str {
        EDREAMS_PROVIDER
    }

    #[instrument(skip(self))]
    async fn resolve_location(&self, iata: &str) -> Result<Location> {
        let not_found = || ScanError::LocationNotFound {
            provider: EDREAMS_PROVIDER,
            iata: iata.to_string(),
        };
        if iata.trim().is_empty() {
            return Err(not_found());
        }

        let suggestions = self.autocomplete(iata).await?;
        suggestions
            .iter()
            .find_map(|suggestion| suggestion.find_iata(iata))
            .cloned()
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
        let url = self.session.url(EDREAMS_GRAPHQL_PATH)?;
        let referer = format!("{}/travel/", self.session.base_url());

        let response = self
            .session
            .client()
            .post(url)
            .header("X-Visit", self.visit.as_str())
            .header("X-Of1jsessionid", self.jsession.as_str())
            .header(REFERER, referer)
            .json(&Self::search_body(adults, date, origin, destination))
            .send()
            .await?;
        let response = self.session.ensure_success(response).await?;

        let body: GraphQlResponse = response.json().await?;
        let result = normalize_search(date, body)?;
        debug!("eDreams returned {} offers for {}", result.offers.len(), date);
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn autocomplete(&self, term: &str) -> Result<Vec<Suggestion>> {
        let url = self.session.url(&Self::autocomplete_path(term))?;
        let response = self
            .session
            .get_ok(url, Some(self.session.base_url()))
            .await?;

        let items: Vec<AutocompleteItem> = response.json().await?;
        Ok(items.into_iter().map(Suggestion::from).collect())
    }
}

/// Registry entry for [`EDreamsProvider`]
pub struct EDreamsFactory;

#[async_trait::async_trait]
impl ProviderFactory for EDreamsFactory {
    fn provider_name(&self) -> &'static str {
        EDREAMS_PROVIDER
    }

    async fn connect(&self, config: &Config) -> Result<Box<dyn FlightProvider>> {
        Ok(Box::new(EDreamsProvider::connect(config).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(iata: &str, geo_id: Option<&str>) -> Location {
        Location {
            iata: iata.to_string(),
            geo_id: geo_id.map(str::to_string),
            name: iata.to_string(),
            city: None,
            country: None,
        }
    }

    #[test]
    fn test_search_body_carries_one_way_request() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let body = EDreamsProvider::search_body(
            2,
            date,
            &location("FCO", Some("1204")),
            &location("CDG", None),
        );

        let request = &body["variables"]["searchRequest"];
        assert_eq!(request["tripType"], "ONE_WAY");
        assert_eq!(request["buyPath"], 71);
        assert_eq!(request["itinerary"]["numAdults"], 2);
        let segment = &request["itinerary"]["segments"][0];
        assert_eq!(segment["date"], "2024-06-01");
        assert_eq!(segment["departure"]["geoNodeId"], 1204);
        assert!(segment["destination"]["geoNodeId"].is_null());
        assert!(body["query"].as_str().unwrap().starts_with("query searchQuery"));
    }

    #[test]
    fn test_autocomplete_path_encodes_term() {
        let path = EDreamsProvider::autocomplete_path("New York");
        assert!(path.starts_with(
            "/frontend-home/service/geo/autocomplete;searchWord=New%20York;departureOrArrival=ARRIVAL;"
        ));
        assert!(path.ends_with(";product=FLIGHT"));
    }
}
