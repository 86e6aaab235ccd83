#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use flyscanner::apis::{EDreamsProvider, RyanairProvider};
    use flyscanner::common::{FlightProvider, Location, ScanError};
    use flyscanner::config::Config;
    use flyscanner::ProviderRegistry;
    use mockito::{Matcher, Server, ServerGuard};
    use rust_decimal::Decimal;
    use serde_json::json;

    fn config_for(server: &ServerGuard) -> Config {
        let mut config = Config::default();
        config.edreams.base_url = server.url();
        config.ryanair.base_url = server.url();
        config.ryanair.request_delay_ms = 0;
        config.http.timeout_seconds = 5;
        config
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn edreams_location(iata: &str, geo_node_id: i64, kind: &str, related: serde_json::Value) -> serde_json::Value {
        json!({
            "type": kind,
            "name": format!("{iata} name"),
            "geoNodeId": geo_node_id,
            "geoNodeType": kind,
            "iata": iata,
            "city": "Rome",
            "country": "Italy",
            "countryCode": "IT",
            "locationNames": ["Roma"],
            "relatedLocations": related
        })
    }

    fn edreams_search_response() -> serde_json::Value {
        let section = |from: &str, to: &str, departure: &str, arrival: &str| {
            json!({
                "departureDate": departure,
                "arrivalDate": arrival,
                "departure": {"name": from, "cityName": from, "countryName": "X", "locationType": "AIRPORT", "iata": from},
                "destination": {"name": to, "cityName": to, "countryName": "Y", "locationType": "AIRPORT", "iata": to},
                "flightCode": "100"
            })
        };
        let itinerary = |amount: f64, tickets_left: i64| {
            json!({
                "fees": [{"price": {"amount": amount, "currency": "EUR"}, "type": {"id": "MEMBER_PRICE_POLICY_UNDISCOUNTED"}}],
                "ticketsLeft": tickets_left,
                "legs": [{"segments": [{
                    "carrier": {"name": "Air France"},
                    "sections": [section("FCO", "CDG", "2024-06-01T07:00:00+02:00", "2024-06-01T09:10:00+02:00")]
                }]}]
            })
        };

        json!({
            "data": {"search": {"itineraries": [
                itinerary(120.0, 3),
                itinerary(15.0, 0),
                itinerary(89.5, 9)
            ]}}
        })
    }

    async fn mock_edreams_bootstrap(server: &mut ServerGuard) -> (mockito::Mock, mockito::Mock) {
        let home = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("set-cookie", "viI=visit-123; Path=/")
            .with_body("<html></html>")
            .create_async()
            .await;
        let visitor = server
            .mock("GET", "/travel/service/frontendapi/getVisitInformation")
            .match_header("referer", Matcher::Regex("^http://".to_string()))
            .with_status(200)
            .with_header("set-cookie", "OF1JSESSIONID=session-456; Path=/")
            .with_body("{}")
            .create_async()
            .await;
        (home, visitor)
    }

    #[tokio::test]
    async fn test_edreams_search_sends_session_headers() {
        let mut server = Server::new_async().await;
        let (home, visitor) = mock_edreams_bootstrap(&mut server).await;
        let graphql = server
            .mock("POST", "/frontend-api/service/graphql")
            .match_header("x-visit", "visit-123")
            .match_header("x-of1jsessionid", "session-456")
            .match_body(Matcher::PartialJson(json!({
                "variables": {"searchRequest": {"tripType": "ONE_WAY"}}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(edreams_search_response().to_string())
            .create_async()
            .await;

        let provider = EDreamsProvider::connect(&config_for(&server)).await.unwrap();
        let origin = Location {
            iata: "FCO".to_string(),
            geo_id: Some("1".to_string()),
            name: "Fiumicino".to_string(),
            city: None,
            country: None,
        };
        let destination = Location {
            iata: "CDG".to_string(),
            geo_id: Some("2".to_string()),
            name: "Charles de Gaulle".to_string(),
            city: None,
            country: None,
        };
        let result = provider.search(1, date(), &origin, &destination).await.unwrap();

        home.assert_async().await;
        visitor.assert_async().await;
        graphql.assert_async().await;

        assert_eq!(result.date, date());
        // sold-out itinerary dropped, rest cheapest first
        assert_eq!(result.offers.len(), 2);
        assert_eq!(result.offers[0].price, "89.5".parse::<Decimal>().unwrap());
        assert_eq!(result.offers[1].price, Decimal::from(120));
        assert_eq!(result.offers[0].carrier, "Air France");
    }

    #[tokio::test]
    async fn test_edreams_path_scoped_session_cookie_is_sent() {
        let mut server = Server::new_async().await;
        let _home = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("set-cookie", "viI=visit-123; Path=/")
            .create_async()
            .await;
        let _visitor = server
            .mock("GET", "/travel/service/frontendapi/getVisitInformation")
            .with_status(200)
            .with_header("set-cookie", "OF1JSESSIONID=session-456; Path=/travel")
            .with_body("{}")
            .create_async()
            .await;
        let graphql = server
            .mock("POST", "/frontend-api/service/graphql")
            .match_header("x-visit", "visit-123")
            .match_header("x-of1jsessionid", "session-456")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"data": {"search": {"itineraries": []}}}).to_string())
            .create_async()
            .await;

        let provider = EDreamsProvider::connect(&config_for(&server)).await.unwrap();
        let location = Location {
            iata: "FCO".to_string(),
            geo_id: None,
            name: "Fiumicino".to_string(),
            city: None,
            country: None,
        };
        let result = provider.search(1, date(), &location, &location).await.unwrap();

        graphql.assert_async().await;
        assert!(result.offers.is_empty());
    }

    #[tokio::test]
    async fn test_edreams_missing_session_cookie_fails_connect() {
        let mut server = Server::new_async().await;
        let _home = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("set-cookie", "viI=visit-123; Path=/")
            .create_async()
            .await;
        let _visitor = server
            .mock("GET", "/travel/service/frontendapi/getVisitInformation")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let result = EDreamsProvider::connect(&config_for(&server)).await;

        assert!(matches!(
            result,
            Err(ScanError::Session { provider: "eDreams", cookie: "OF1JSESSIONID" })
        ));
    }

    #[tokio::test]
    async fn test_edreams_bootstrap_failure_is_provider_error() {
        let mut server = Server::new_async().await;
        let _home = server
            .mock("GET", "/")
            .with_status(503)
            .create_async()
            .await;

        let result = EDreamsProvider::connect(&config_for(&server)).await;

        assert!(matches!(
            result,
            Err(ScanError::Provider { provider: "eDreams", status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_edreams_resolves_nested_airport() {
        let mut server = Server::new_async().await;
        let _bootstrap = mock_edreams_bootstrap(&mut server).await;
        let autocomplete = server
            .mock(
                "GET",
                Matcher::Regex("^/frontend-home/service/geo/autocomplete;searchWord=FCO;".to_string()),
            )
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([edreams_location(
                    "ROM",
                    1204,
                    "CITY",
                    json!([edreams_location("FCO", 1205, "AIRPORT", json!(null))])
                )])
                .to_string(),
            )
            .expect(2)
            .create_async()
            .await;

        let provider = EDreamsProvider::connect(&config_for(&server)).await.unwrap();
        let location = provider.resolve_location("FCO").await.unwrap();
        assert_eq!(location.iata, "FCO");
        assert_eq!(location.geo_id.as_deref(), Some("1205"));

        // re-resolving the returned code yields the same code
        let again = provider.resolve_location(&location.iata).await.unwrap();
        assert_eq!(again.iata, location.iata);
        autocomplete.assert_async().await;
    }

    #[tokio::test]
    async fn test_ryanair_no_resource_is_empty_result() {
        let mut server = Server::new_async().await;
        let _home = server.mock("GET", "/it/it").with_status(200).create_async().await;
        let availability = server
            .mock("GET", "/api/booking/v4/it-it/availability")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("Origin".into(), "CIA".into()),
                Matcher::UrlEncoded("Destination".into(), "BVA".into()),
                Matcher::UrlEncoded("DateOut".into(), "2024-06-01".into()),
                Matcher::UrlEncoded("ADT".into(), "2".into()),
            ]))
            .with_status(404)
            .with_body(r#"{"Message":"No HTTP resource was found that matches the request URI"}"#)
            .create_async()
            .await;

        let provider = RyanairProvider::connect(&config_for(&server)).await.unwrap();
        let origin = Location {
            iata: "CIA".to_string(),
            geo_id: None,
            name: "Roma Ciampino".to_string(),
            city: None,
            country: None,
        };
        let destination = Location {
            iata: "BVA".to_string(),
            ..origin.clone()
        };

        let result = provider.search(2, date(), &origin, &destination).await.unwrap();

        availability.assert_async().await;
        assert_eq!(result.date, date());
        assert!(result.offers.is_empty());
    }

    #[tokio::test]
    async fn test_ryanair_server_error_is_provider_error() {
        let mut server = Server::new_async().await;
        let _home = server.mock("GET", "/it/it").with_status(200).create_async().await;
        let _availability = server
            .mock("GET", "/api/booking/v4/it-it/availability")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let provider = RyanairProvider::connect(&config_for(&server)).await.unwrap();
        let location = Location {
            iata: "CIA".to_string(),
            geo_id: None,
            name: "Roma Ciampino".to_string(),
            city: None,
            country: None,
        };

        let result = provider.search(1, date(), &location, &location).await;

        match result {
            Err(ScanError::Provider { provider, status, message }) => {
                assert_eq!(provider, "Ryanair");
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ryanair_resolve_requires_exact_code() {
        let mut server = Server::new_async().await;
        let _home = server.mock("GET", "/it/it").with_status(200).create_async().await;
        let _autocomplete = server
            .mock("GET", "/api/locate/v1/autocomplete/airports")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {"name": "Roma Ciampino", "code": "CIA", "city": {"name": "Roma", "code": "ROME"},
                     "country": {"name": "Italia", "code": "it"}, "aliases": []},
                    {"name": "Roma Fiumicino", "code": "FCO", "city": {"name": "Roma", "code": "ROME"},
                     "country": {"name": "Italia", "code": "it"}, "aliases": ["Leonardo da Vinci"]}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let provider = RyanairProvider::connect(&config_for(&server)).await.unwrap();

        let fco = provider.resolve_location("fco").await.unwrap();
        assert_eq!(fco.iata, "FCO");
        assert_eq!(fco.city.as_deref(), Some("Roma"));

        let missing = provider.resolve_location("BVA").await;
        assert!(matches!(
            missing,
            Err(ScanError::LocationNotFound { provider: "Ryanair", iata }) if iata == "BVA"
        ));
    }

    #[tokio::test]
    async fn test_registry_connects_by_name() {
        let mut server = Server::new_async().await;
        let home = server.mock("GET", "/it/it").with_status(200).create_async().await;

        let registry = ProviderRegistry::new();
        let provider = registry
            .connect("RYANAIR", &config_for(&server))
            .await
            .unwrap();

        home.assert_async().await;
        assert_eq!(provider.provider_name(), "Ryanair");
    }
}
