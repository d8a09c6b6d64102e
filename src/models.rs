use serde::{Deserialize, Serialize};

/// A normalized place identifier produced from the aggregator's airport
/// responses. `sky_id` + `entity_id` jointly identify the place for query
/// purposes; the remaining fields are display-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airport {
    pub sky_id: String,
    pub entity_id: String,
    pub name: String,
    pub city: String,
    pub country: String,
}

/// Parameters for a flight search. The form mutates a draft of these; at
/// submit time the draft is frozen into an immutable snapshot which keys
/// the flight query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SearchParams {
    pub origin_sky_id: String,
    pub origin_entity_id: String,
    pub destination_sky_id: String,
    pub destination_entity_id: String,
    pub departure_date: String,
    pub return_date: Option<String>,
    pub adults: Option<u32>,
    pub currency: Option<String>,
}

impl SearchParams {
    /// A search is dispatchable only when both place-identifier pairs and
    /// the departure date are populated.
    pub fn is_complete(&self) -> bool {
        !self.origin_sky_id.is_empty()
            && !self.origin_entity_id.is_empty()
            && !self.destination_sky_id.is_empty()
            && !self.destination_entity_id.is_empty()
            && !self.departure_date.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Price {
    #[serde(default)]
    pub raw: f64,
    #[serde(default)]
    pub formatted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_code: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Carrier {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub alternate_id: String,
    #[serde(default)]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Carriers {
    #[serde(default)]
    pub marketing: Vec<Carrier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub flight_number: String,
    #[serde(default)]
    pub departure: String,
    #[serde(default)]
    pub arrival: String,
    #[serde(default)]
    pub duration_in_minutes: u32,
    #[serde(default)]
    pub marketing_carrier: Option<Carrier>,
}

/// One directional origin -> destination trip within an itinerary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    #[serde(default)]
    pub id: String,
    pub origin: Place,
    pub destination: Place,
    #[serde(default)]
    pub duration_in_minutes: u32,
    #[serde(default)]
    pub stop_count: u32,
    #[serde(default)]
    pub departure: String,
    #[serde(default)]
    pub arrival: String,
    #[serde(default)]
    pub carriers: Carriers,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

/// One priced flight offer composed of one or more legs. Sourced entirely
/// from the aggregator response, never mutated locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Itinerary {
    pub id: String,
    pub price: Price,
    #[serde(default)]
    pub legs: Vec<Leg>,
    #[serde(default)]
    pub tags: Vec<String>,
}

// Equality on the id is what the cache and tests need; `price.raw` is an
// f64 and would block deriving Eq anyway.
impl PartialEq for Itinerary {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Outcome of a flight search as surfaced to the UI: either a (possibly
/// empty) itinerary list or a user-facing error message. Transport errors
/// never escape the API client as anything else.
#[derive(Debug, Clone, PartialEq)]
pub enum FlightSearchOutcome {
    Success(Vec<Itinerary>),
    Error(String),
}

// ---------------------------------------------------------------------------
// Raw wire envelopes. The aggregator nests display text under `presentation`
// and query identifiers under `navigation.relevantFlightParams`; everything
// below exists only to be flattened into the types above.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPresentation {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub suggestion_title: String,
    #[serde(default)]
    pub subtitle: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFlightParams {
    #[serde(default)]
    pub sky_id: String,
    #[serde(default)]
    pub entity_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNavigation {
    #[serde(default)]
    pub relevant_flight_params: RawFlightParams,
}

/// An entry from the text-search endpoint: identifiers at the top level,
/// display text under `presentation`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSearchPlace {
    #[serde(default)]
    pub sky_id: String,
    #[serde(default)]
    pub entity_id: String,
    #[serde(default)]
    pub presentation: RawPresentation,
}

impl From<RawSearchPlace> for Airport {
    fn from(raw: RawSearchPlace) -> Self {
        Self {
            sky_id: raw.sky_id,
            entity_id: raw.entity_id,
            name: raw.presentation.suggestion_title,
            city: raw.presentation.title,
            country: raw.presentation.subtitle,
        }
    }
}

/// An entry from the nearby-airports endpoint: identifiers live under
/// `navigation.relevantFlightParams` rather than at the top level.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNearbyPlace {
    #[serde(default)]
    pub presentation: RawPresentation,
    #[serde(default)]
    pub navigation: RawNavigation,
}

impl From<RawNearbyPlace> for Airport {
    fn from(raw: RawNearbyPlace) -> Self {
        Self {
            sky_id: raw.navigation.relevant_flight_params.sky_id,
            entity_id: raw.navigation.relevant_flight_params.entity_id,
            name: raw.presentation.suggestion_title,
            city: raw.presentation.title,
            country: raw.presentation.subtitle,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirportSearchResponse {
    #[serde(default)]
    pub data: Vec<RawSearchPlace>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NearbyAirportsData {
    pub current: RawNearbyPlace,
    #[serde(default)]
    pub nearby: Vec<RawNearbyPlace>,
}

impl NearbyAirportsData {
    /// Flattens the envelope, keeping the coordinate's own airport as
    /// element 0 followed by the nearby airports in remote order.
    pub fn into_airports(self) -> Vec<Airport> {
        let mut airports = Vec::with_capacity(1 + self.nearby.len());
        airports.push(Airport::from(self.current));
        airports.extend(self.nearby.into_iter().map(Airport::from));
        airports
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NearbyAirportsResponse {
    pub data: NearbyAirportsData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlightSearchData {
    #[serde(default)]
    pub itineraries: Vec<Itinerary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlightSearchResponse {
    pub data: FlightSearchData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_place_flattens_presentation() {
        let json = r#"{
            "skyId": "LOND",
            "entityId": "27544008",
            "presentation": {
                "title": "London",
                "suggestionTitle": "London (Any)",
                "subtitle": "United Kingdom"
            }
        }"#;
        let raw: RawSearchPlace = serde_json::from_str(json).unwrap();
        let airport = Airport::from(raw);
        assert_eq!(airport.sky_id, "LOND");
        assert_eq!(airport.entity_id, "27544008");
        assert_eq!(airport.name, "London (Any)");
        assert_eq!(airport.city, "London");
        assert_eq!(airport.country, "United Kingdom");
    }

    #[test]
    fn nearby_place_takes_ids_from_navigation() {
        let json = r#"{
            "presentation": {
                "title": "San Francisco",
                "suggestionTitle": "San Francisco International (SFO)",
                "subtitle": "United States"
            },
            "navigation": {
                "entityId": "95673990",
                "entityType": "AIRPORT",
                "localizedName": "San Francisco International",
                "relevantFlightParams": {
                    "skyId": "SFO",
                    "entityId": "95673990",
                    "flightPlaceType": "AIRPORT",
                    "localizedName": "San Francisco International"
                }
            }
        }"#;
        let raw: RawNearbyPlace = serde_json::from_str(json).unwrap();
        let airport = Airport::from(raw);
        assert_eq!(airport.sky_id, "SFO");
        assert_eq!(airport.entity_id, "95673990");
        assert_eq!(airport.name, "San Francisco International (SFO)");
    }

    #[test]
    fn nearby_list_puts_current_airport_first() {
        fn place(sky_id: &str) -> RawNearbyPlace {
            RawNearbyPlace {
                presentation: RawPresentation {
                    title: sky_id.to_string(),
                    suggestion_title: format!("{sky_id} Airport"),
                    subtitle: "Testland".to_string(),
                },
                navigation: RawNavigation {
                    relevant_flight_params: RawFlightParams {
                        sky_id: sky_id.to_string(),
                        entity_id: format!("entity-{sky_id}"),
                    },
                },
            }
        }

        let data = NearbyAirportsData {
            current: place("SFO"),
            nearby: vec![place("OAK"), place("SJC")],
        };
        let airports = data.into_airports();
        let codes: Vec<&str> = airports.iter().map(|a| a.sky_id.as_str()).collect();
        assert_eq!(codes, vec!["SFO", "OAK", "SJC"]);
    }

    #[test]
    fn itinerary_envelope_unwraps_to_list() {
        let json = r#"{
            "status": true,
            "timestamp": 1717200000,
            "data": {
                "itineraries": [{
                    "id": "itin-1",
                    "price": { "raw": 420.5, "formatted": "$421" },
                    "legs": [{
                        "id": "leg-1",
                        "origin": { "id": "LHR", "name": "London Heathrow", "displayCode": "LHR", "city": "London", "country": "UK" },
                        "destination": { "id": "JFK", "name": "New York JFK", "displayCode": "JFK", "city": "New York", "country": "US" },
                        "durationInMinutes": 465,
                        "stopCount": 0,
                        "departure": "2024-06-01T09:00:00",
                        "arrival": "2024-06-01T12:45:00",
                        "carriers": { "marketing": [{ "id": -32090, "name": "British Airways", "alternateId": "BA" }] },
                        "segments": []
                    }],
                    "tags": ["cheapest"]
                }],
                "context": { "status": "complete", "totalResults": 1 }
            }
        }"#;
        let res: FlightSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(res.data.itineraries.len(), 1);
        let itin = &res.data.itineraries[0];
        assert_eq!(itin.id, "itin-1");
        assert_eq!(itin.price.formatted, "$421");
        assert_eq!(itin.legs[0].stop_count, 0);
        assert_eq!(itin.legs[0].carriers.marketing[0].alternate_id, "BA");
    }

    #[test]
    fn incomplete_params_are_not_dispatchable() {
        let mut params = SearchParams {
            origin_sky_id: "LHR".into(),
            origin_entity_id: "entity1".into(),
            destination_sky_id: "JFK".into(),
            destination_entity_id: "entity2".into(),
            departure_date: "2024-06-01".into(),
            ..Default::default()
        };
        assert!(params.is_complete());

        params.departure_date.clear();
        assert!(!params.is_complete());

        params.departure_date = "2024-06-01".into();
        params.destination_entity_id.clear();
        assert!(!params.is_complete());
    }
}
