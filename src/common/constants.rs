/// Provider name constants to ensure consistency across the codebase.
/// These are the display names accepted on the command line (case-insensitively).
pub const EDREAMS_PROVIDER: &str = "eDreams";
pub const RYANAIR_PROVIDER: &str = "Ryanair";

pub const DEFAULT_PROVIDER: &str = EDREAMS_PROVIDER;

// Browser-like defaults sent with every provider request
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/98.0.4758.82 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-GB,en-US;q=0.9,en;q=0.8";
pub const DEFAULT_REFERER: &str = "https://www.google.com/";

// eDreams endpoints
pub const EDREAMS_BASE_URL: &str = "https://www.edreams.com";
pub const EDREAMS_VISITOR_PATH: &str = "/travel/service/frontendapi/getVisitInformation";
pub const EDREAMS_GRAPHQL_PATH: &str = "/frontend-api/service/graphql";
pub const EDREAMS_AUTOCOMPLETE_PATH: &str = "/frontend-home/service/geo/autocomplete";
pub const EDREAMS_VISIT_COOKIE: &str = "viI";
pub const EDREAMS_SESSION_COOKIE: &str = "OF1JSESSIONID";
/// Fee type id of the fare that is shown as the itinerary price
pub const EDREAMS_UNDISCOUNTED_FEE: &str = "MEMBER_PRICE_POLICY_UNDISCOUNTED";

// Ryanair endpoints
pub const RYANAIR_BASE_URL: &str = "https://www.ryanair.com";
pub const RYANAIR_HOME_PATH: &str = "/it/it";
pub const RYANAIR_DEFAULT_MARKET: &str = "it-it";
pub const RYANAIR_AUTOCOMPLETE_PATH: &str = "/api/locate/v1/autocomplete/airports";
/// Body fragment Ryanair sends with a 404 when a route has no availability (or the IP is blocked)
pub const RYANAIR_NO_RESOURCE_MARKER: &str = "No HTTP resource was found";
pub const RYANAIR_DEFAULT_DELAY_MS: u64 = 1000;

pub const NOT_AVAILABLE: &str = "N/D";

/// Columns every saved sheet starts with, in order
pub const FLIGHT_DEFAULT_COLUMNS: [&str; 12] = [
    "price",
    "price_currency",
    "departure_date",
    "arrival_date",
    "departure_location",
    "arrival_location",
    "duration",
    "carrier",
    "stops",
    "stops_duration",
    "stops_detail",
    "discounts",
];

pub const DEFAULT_SAVE_PATH: &str = "~/Desktop/FlyScannerTrips.csv";
