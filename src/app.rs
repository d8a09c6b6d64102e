use crate::airport_search::AirportSearchController;
use crate::cache::{CacheOptions, QueryCache};
use crate::config::Config;
use crate::events::Event;
use crate::flight_search::{FlightSearchController, FlightSearchState};
use crate::models::{Airport, SearchParams};
use chrono::{Duration as ChronoDuration, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

const NEARBY_STALE: Duration = Duration::from_secs(30 * 60);
const NEARBY_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Network work the main loop must spawn. Controllers and the app only
/// describe fetches; `main.rs` owns the API client and the task spawning.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchRequest {
    Airports { term: String },
    Nearby { lat: f64, lon: f64 },
    Flights { params: SearchParams },
}

/// Form fields in tab order.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Focus {
    Origin,
    Destination,
    DepartureDate,
    ReturnDate,
    Search,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Origin => Focus::Destination,
            Focus::Destination => Focus::DepartureDate,
            Focus::DepartureDate => Focus::ReturnDate,
            Focus::ReturnDate => Focus::Search,
            Focus::Search => Focus::Origin,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Origin => Focus::Search,
            Focus::Destination => Focus::Origin,
            Focus::DepartureDate => Focus::Destination,
            Focus::ReturnDate => Focus::DepartureDate,
            Focus::Search => Focus::ReturnDate,
        }
    }
}

pub struct App {
    pub focus: Focus,
    pub origin_text: String,
    pub destination_text: String,
    pub selected_option: usize,
    pub airport_search: AirportSearchController,
    pub flight_search: FlightSearchController,
    pub should_quit: bool,

    coords: Option<(f64, f64)>,
    nearby_cache: QueryCache<(i64, i64), Vec<Airport>>,
    pending: Vec<FetchRequest>,
}

/// Micro-degree key for the nearby cache; f64 coordinates are not hashable.
fn coord_key(lat: f64, lon: f64) -> (i64, i64) {
    ((lat * 1e6).round() as i64, (lon * 1e6).round() as i64)
}

impl App {
    pub fn new(config: &Config) -> Self {
        let tomorrow = (Local::now() + ChronoDuration::days(1))
            .format("%Y-%m-%d")
            .to_string();
        let draft = SearchParams {
            departure_date: tomorrow,
            adults: Some(config.search.adults),
            currency: Some(config.search.currency.clone()),
            ..Default::default()
        };

        Self {
            focus: Focus::Origin,
            origin_text: String::new(),
            destination_text: String::new(),
            selected_option: 0,
            airport_search: AirportSearchController::new(),
            flight_search: FlightSearchController::new(draft),
            should_quit: false,
            coords: None,
            nearby_cache: QueryCache::new(CacheOptions {
                stale_time: NEARBY_STALE,
                retention_time: NEARBY_RETENTION,
                retry_limit: 1,
            }),
            pending: Vec::new(),
        }
    }

    /// Routes one loop event into state changes and queued fetches.
    pub fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Tick => self.on_tick(now),
            Event::Input(key) => self.handle_key(key, now),
            Event::LocationFix(coords) => {
                // A missing fix is silent: the form just has no nearby list.
                self.coords = coords;
            }
            Event::NearbyResults(airports) => {
                if let Some((lat, lon)) = self.coords {
                    self.nearby_cache
                        .complete_ok(&coord_key(lat, lon), airports.clone(), now);
                }
                self.airport_search.set_nearby(airports);
            }
            Event::AirportResults { term, airports } => {
                self.airport_search.apply_results(&term, airports, now);
                self.clamp_selection();
            }
            Event::FlightResults { params, outcome } => {
                if let Some(fetch) = self.flight_search.apply_outcome(&params, outcome, now) {
                    self.pending.push(FetchRequest::Flights {
                        params: fetch.params,
                    });
                }
            }
        }
    }

    /// Drains the fetches queued since the last call; the main loop spawns
    /// one task per request.
    pub fn take_fetches(&mut self) -> Vec<FetchRequest> {
        std::mem::take(&mut self.pending)
    }

    fn on_tick(&mut self, now: Instant) {
        if let Some(fetch) = self.airport_search.poll(now) {
            self.pending.push(FetchRequest::Airports { term: fetch.term });
        }
        if let Some(fetch) = self.flight_search.poll(now) {
            self.pending.push(FetchRequest::Flights {
                params: fetch.params,
            });
        }
        if let Some((lat, lon)) = self.coords {
            let obs = self.nearby_cache.observe(&coord_key(lat, lon), true, now);
            if obs.fetch_needed {
                self.pending.push(FetchRequest::Nearby { lat, lon });
            }
        }
        self.clamp_selection();
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Esc => {
                if matches!(self.flight_search.state(), FlightSearchState::Error(_)) {
                    self.flight_search.dismiss_error();
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Tab => {
                self.focus = self.focus.next();
                self.selected_option = 0;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
                self.selected_option = 0;
            }
            KeyCode::Down => {
                let len = self.airport_search.options().len();
                if self.is_airport_field() && len > 0 {
                    self.selected_option = (self.selected_option + 1) % len;
                }
            }
            KeyCode::Up => {
                let len = self.airport_search.options().len();
                if self.is_airport_field() && len > 0 {
                    self.selected_option =
                        self.selected_option.checked_sub(1).unwrap_or(len - 1);
                }
            }
            KeyCode::Enter => match self.focus {
                Focus::Origin | Focus::Destination => self.choose_option(),
                Focus::Search => self.submit(),
                _ => self.focus = self.focus.next(),
            },
            KeyCode::Char(c) => self.type_char(c, now),
            KeyCode::Backspace => self.erase_char(now),
            _ => {}
        }
    }

    fn is_airport_field(&self) -> bool {
        matches!(self.focus, Focus::Origin | Focus::Destination)
    }

    fn type_char(&mut self, c: char, now: Instant) {
        match self.focus {
            Focus::Origin => {
                self.origin_text.push(c);
                // Editing the text invalidates any previously chosen airport.
                self.flight_search.draft.origin_sky_id.clear();
                self.flight_search.draft.origin_entity_id.clear();
                self.airport_search.on_input(&self.origin_text, now);
            }
            Focus::Destination => {
                self.destination_text.push(c);
                self.flight_search.draft.destination_sky_id.clear();
                self.flight_search.draft.destination_entity_id.clear();
                self.airport_search.on_input(&self.destination_text, now);
            }
            Focus::DepartureDate => self.flight_search.draft.departure_date.push(c),
            Focus::ReturnDate => {
                let date = self
                    .flight_search
                    .draft
                    .return_date
                    .get_or_insert_with(String::new);
                date.push(c);
            }
            Focus::Search => {}
        }
    }

    fn erase_char(&mut self, now: Instant) {
        match self.focus {
            Focus::Origin => {
                self.origin_text.pop();
                self.flight_search.draft.origin_sky_id.clear();
                self.flight_search.draft.origin_entity_id.clear();
                self.airport_search.on_input(&self.origin_text, now);
            }
            Focus::Destination => {
                self.destination_text.pop();
                self.flight_search.draft.destination_sky_id.clear();
                self.flight_search.draft.destination_entity_id.clear();
                self.airport_search.on_input(&self.destination_text, now);
            }
            Focus::DepartureDate => {
                self.flight_search.draft.departure_date.pop();
            }
            Focus::ReturnDate => {
                if let Some(date) = self.flight_search.draft.return_date.as_mut() {
                    date.pop();
                    if date.is_empty() {
                        self.flight_search.draft.return_date = None;
                    }
                }
            }
            Focus::Search => {}
        }
    }

    fn choose_option(&mut self) {
        let Some(airport) = self.airport_search.options().get(self.selected_option).cloned()
        else {
            return;
        };
        match self.focus {
            Focus::Origin => {
                self.origin_text = airport.name.clone();
                self.flight_search.draft.origin_sky_id = airport.sky_id;
                self.flight_search.draft.origin_entity_id = airport.entity_id;
            }
            Focus::Destination => {
                self.destination_text = airport.name.clone();
                self.flight_search.draft.destination_sky_id = airport.sky_id;
                self.flight_search.draft.destination_entity_id = airport.entity_id;
            }
            _ => return,
        }
        self.focus = self.focus.next();
        self.selected_option = 0;
    }

    fn submit(&mut self) {
        // Refused, not errored: the button stays disabled until complete.
        self.flight_search.submit();
    }

    fn clamp_selection(&mut self) {
        let len = self.airport_search.options().len();
        if len == 0 {
            self.selected_option = 0;
        } else if self.selected_option >= len {
            self.selected_option = len - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::airport_search::DEBOUNCE;
    use crate::config::{ApiConfig, LocationConfig, SearchConfig};
    use crate::models::FlightSearchOutcome;

    fn test_config() -> Config {
        Config {
            api: ApiConfig {
                base_url: "https://example.test/api/v1".into(),
                rapidapi_host: "example.test".into(),
                rapidapi_key: "k".into(),
            },
            search: SearchConfig {
                currency: "AED".into(),
                market: "en-AE".into(),
                country_code: "AE".into(),
                adults: 1,
            },
            location: LocationConfig {
                auto_detect: false,
                manual_lat: 0.0,
                manual_lon: 0.0,
            },
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn airport(sky_id: &str) -> Airport {
        Airport {
            sky_id: sky_id.to_string(),
            entity_id: format!("entity-{sky_id}"),
            name: format!("{sky_id} Airport"),
            city: sky_id.to_string(),
            country: "Testland".to_string(),
        }
    }

    #[test]
    fn location_fix_triggers_one_nearby_fetch() {
        let mut app = App::new(&test_config());
        let now = Instant::now();
        app.handle_event(Event::LocationFix(Some((51.5, -0.12))), now);
        app.handle_event(Event::Tick, now);
        assert_eq!(
            app.take_fetches(),
            vec![FetchRequest::Nearby { lat: 51.5, lon: -0.12 }]
        );

        // Further ticks within the freshness window stay quiet.
        app.handle_event(Event::NearbyResults(vec![airport("LCY")]), now);
        app.handle_event(Event::Tick, now + Duration::from_secs(60));
        assert!(app.take_fetches().is_empty());
        assert_eq!(app.airport_search.options()[0].sky_id, "LCY");
    }

    #[test]
    fn geolocation_denied_means_no_fetch_and_empty_options() {
        let mut app = App::new(&test_config());
        let now = Instant::now();
        app.handle_event(Event::LocationFix(None), now);
        app.handle_event(Event::Tick, now);
        assert!(app.take_fetches().is_empty());
        assert!(app.airport_search.options().is_empty());
    }

    #[test]
    fn typing_in_origin_field_debounces_into_one_airport_fetch() {
        let mut app = App::new(&test_config());
        let start = Instant::now();
        for (i, c) in "lon".chars().enumerate() {
            let now = start + Duration::from_millis(50 * i as u64);
            app.handle_event(Event::Input(key(KeyCode::Char(c))), now);
            app.handle_event(Event::Tick, now);
        }
        assert!(app.take_fetches().is_empty());

        app.handle_event(Event::Tick, start + Duration::from_millis(100) + DEBOUNCE);
        assert_eq!(
            app.take_fetches(),
            vec![FetchRequest::Airports { term: "lon".into() }]
        );
    }

    #[test]
    fn selecting_airports_enables_submission() {
        let mut app = App::new(&test_config());
        let now = Instant::now();
        assert!(!app.flight_search.can_submit());

        for c in "lon".chars() {
            app.handle_event(Event::Input(key(KeyCode::Char(c))), now);
        }
        app.handle_event(Event::Tick, now + DEBOUNCE);
        app.take_fetches();
        app.handle_event(
            Event::AirportResults {
                term: "lon".into(),
                airports: vec![airport("LHR"), airport("LGW")],
            },
            now + DEBOUNCE,
        );
        app.handle_event(Event::Tick, now + DEBOUNCE);
        app.handle_event(Event::Input(key(KeyCode::Enter)), now + DEBOUNCE);
        assert_eq!(app.flight_search.draft.origin_sky_id, "LHR");
        assert_eq!(app.focus, Focus::Destination);

        for c in "par".chars() {
            app.handle_event(Event::Input(key(KeyCode::Char(c))), now + DEBOUNCE);
        }
        app.handle_event(Event::Tick, now + DEBOUNCE * 2);
        app.take_fetches();
        app.handle_event(
            Event::AirportResults {
                term: "par".into(),
                airports: vec![airport("CDG")],
            },
            now + DEBOUNCE * 2,
        );
        app.handle_event(Event::Tick, now + DEBOUNCE * 2);
        app.handle_event(Event::Input(key(KeyCode::Enter)), now + DEBOUNCE * 2);
        assert_eq!(app.flight_search.draft.destination_sky_id, "CDG");

        // Departure date defaulted to tomorrow, so the form is now complete.
        assert!(app.flight_search.can_submit());
    }

    #[test]
    fn failed_flight_fetch_is_retried_then_reported() {
        let mut app = App::new(&test_config());
        let now = Instant::now();
        app.flight_search.draft = SearchParams {
            origin_sky_id: "LHR".into(),
            origin_entity_id: "e1".into(),
            destination_sky_id: "JFK".into(),
            destination_entity_id: "e2".into(),
            departure_date: "2024-06-01".into(),
            ..Default::default()
        };
        app.focus = Focus::Search;
        app.handle_event(Event::Input(key(KeyCode::Enter)), now);
        app.handle_event(Event::Tick, now);
        let fetches = app.take_fetches();
        let FetchRequest::Flights { params } = &fetches[0] else {
            panic!("expected flight fetch");
        };

        let outcome = FlightSearchOutcome::Error("Failed to fetch flight data.".into());
        app.handle_event(
            Event::FlightResults {
                params: params.clone(),
                outcome: outcome.clone(),
            },
            now,
        );
        assert_eq!(app.take_fetches().len(), 1); // automatic retry

        app.handle_event(
            Event::FlightResults {
                params: params.clone(),
                outcome,
            },
            now,
        );
        assert!(app.take_fetches().is_empty());
        app.handle_event(Event::Tick, now);
        assert!(matches!(
            app.flight_search.state(),
            FlightSearchState::Error(_)
        ));

        // Esc dismisses the notice instead of quitting while it is shown.
        app.handle_event(Event::Input(key(KeyCode::Esc)), now);
        assert!(!app.should_quit);
        assert_eq!(*app.flight_search.state(), FlightSearchState::Idle);
    }
}
