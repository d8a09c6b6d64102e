use crate::config::{ApiConfig, SearchConfig};
use crate::models::{
    Airport, AirportSearchResponse, FlightSearchOutcome, FlightSearchResponse,
    NearbyAirportsResponse, SearchParams,
};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use tracing::error;

const RETRY_LATER_MESSAGE: &str = "Failed to fetch flight data. Please try again later.";

/// Client for the sky-scrapper aggregator. All configuration (base URL,
/// RapidAPI headers, market defaults) is injected at construction; nothing
/// here reads globals. Cloneable so each fetch task can own one.
#[derive(Clone)]
pub struct SkyApi {
    client: Client,
    base_url: String,
    search: SearchConfig,
}

impl SkyApi {
    pub fn new(api: &ApiConfig, search: SearchConfig) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(host) = HeaderValue::from_str(&api.rapidapi_host) {
            headers.insert("X-RapidAPI-Host", host);
        }
        if let Ok(key) = HeaderValue::from_str(&api.rapidapi_key) {
            headers.insert("X-RapidAPI-Key", key);
        }

        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .default_headers(headers)
                .build()
                .unwrap(),
            base_url: api.base_url.trim_end_matches('/').to_string(),
            search,
        }
    }

    /// Free-text airport search. Returns an empty list on any transport or
    /// decode failure; retrying is the cache's job, not this layer's.
    pub async fn search_airports(&self, query: &str) -> Vec<Airport> {
        let url = format!("{}/flights/searchAirport", self.base_url);
        let res = self
            .client
            .get(url)
            .query(&[("query", query)])
            .send()
            .await;

        match decode::<AirportSearchResponse>(res).await {
            Ok(body) => body.data.into_iter().map(Airport::from).collect(),
            Err(e) => {
                error!("Error searching airports: {}", e);
                Vec::new()
            }
        }
    }

    /// Airports around a coordinate. Element 0 is always the airport for the
    /// coordinate itself, followed by nearby airports in remote order.
    pub async fn nearby_airports(&self, lat: f64, lon: f64) -> Vec<Airport> {
        let url = format!("{}/flights/getNearByAirports", self.base_url);
        let res = self
            .client
            .get(url)
            .query(&[("lat", lat), ("lng", lon)])
            .send()
            .await;

        match decode::<NearbyAirportsResponse>(res).await {
            Ok(body) => body.data.into_airports(),
            Err(e) => {
                error!("Error fetching nearby airports: {}", e);
                Vec::new()
            }
        }
    }

    /// Flight search for a frozen parameter snapshot. Failures come back as
    /// [`FlightSearchOutcome::Error`] with a user-facing message.
    pub async fn search_flights(&self, params: &SearchParams) -> FlightSearchOutcome {
        let adults = params.adults.unwrap_or(self.search.adults).to_string();
        let currency = params
            .currency
            .clone()
            .unwrap_or_else(|| self.search.currency.clone());

        let mut query = vec![
            ("originSkyId", params.origin_sky_id.as_str()),
            ("originEntityId", params.origin_entity_id.as_str()),
            ("destinationSkyId", params.destination_sky_id.as_str()),
            ("destinationEntityId", params.destination_entity_id.as_str()),
            ("date", params.departure_date.as_str()),
            ("adult", adults.as_str()),
            ("currency", currency.as_str()),
            ("countryCode", self.search.country_code.as_str()),
            ("market", self.search.market.as_str()),
        ];
        if let Some(return_date) = &params.return_date {
            query.push(("returnDate", return_date.as_str()));
        }

        let url = format!("{}/flights/searchFlights", self.base_url);
        let res = self.client.get(url).query(&query).send().await;

        match decode::<FlightSearchResponse>(res).await {
            Ok(body) => FlightSearchOutcome::Success(body.data.itineraries),
            Err(e) => {
                error!("Error searching flights: {}", e);
                FlightSearchOutcome::Error(RETRY_LATER_MESSAGE.to_string())
            }
        }
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    res: Result<reqwest::Response, reqwest::Error>,
) -> Result<T, reqwest::Error> {
    res?.error_for_status()?.json::<T>().await
}
