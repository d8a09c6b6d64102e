use color_eyre::Result;
use ratatui::{backend::CrosstermBackend, Terminal};
use skysearch::{
    api::SkyApi,
    app::{App, FetchRequest},
    config::Config,
    events::{Event, EventHandler},
    location, logging, ui,
};
use std::{io, time::Instant};
use tokio::sync::mpsc::UnboundedSender;

#[tokio::main]
async fn main() -> Result<()> {
    // Instrumentation and safety
    let _log_guard = logging::initialize_logging();
    install_panic_hook();
    color_eyre::install()?;

    let config = Config::load();
    let api = SkyApi::new(&config.api, config.search.clone());

    // Ready terminal and state
    let mut terminal = setup_terminal()?;
    let mut app = App::new(&config);
    let mut events = EventHandler::new(100); // Ticks drive the 300ms debounce

    // One best-effort geolocation fix per session; failure just means no
    // nearby-airport suggestions.
    let location_tx = events.tx.clone();
    let location_config = config.location.clone();
    tokio::spawn(async move {
        let fix = location::resolve_location(&location_config).await;
        let _ = location_tx.send(Event::LocationFix(fix));
    });

    // Main loop
    while !app.should_quit {
        terminal.draw(|f| ui::render(f, &app))?;

        if let Some(event) = events.next().await {
            app.handle_event(event, Instant::now());
        }

        for request in app.take_fetches() {
            spawn_fetch(request, api.clone(), events.tx.clone());
        }
    }

    restore_terminal(terminal)?;
    Ok(())
}

/// Runs one network request off the loop thread. The completion event
/// carries the dispatch key (term or parameter snapshot), so the cache can
/// file the response under the key that requested it.
fn spawn_fetch(request: FetchRequest, api: SkyApi, tx: UnboundedSender<Event>) {
    tokio::spawn(async move {
        let event = match request {
            FetchRequest::Airports { term } => {
                let airports = api.search_airports(&term).await;
                Event::AirportResults { term, airports }
            }
            FetchRequest::Nearby { lat, lon } => {
                Event::NearbyResults(api.nearby_airports(lat, lon).await)
            }
            FetchRequest::Flights { params } => {
                let outcome = api.search_flights(&params).await;
                Event::FlightResults { params, outcome }
            }
        };
        let _ = tx.send(event);
    });
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(
        stdout,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::cursor::Hide
    )?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    Ok(())
}

fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Force terminal cleanup!
        crossterm::terminal::disable_raw_mode().ok();
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show
        )
        .ok();
        original_hook(panic_info);
    }));
}
