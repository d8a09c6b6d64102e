//! TUI rendering for skysearch.
//!
//! This module handles all rendering using the `ratatui` crate: the search
//! form (origin/destination autocomplete, dates, search action), the
//! suggestion dropdown, and the results pane with its loading, error,
//! no-results, and itinerary-list states. No fetch or cache logic lives
//! here; everything is drawn from [`App`] state.

use crate::app::{App, Focus};
use crate::flight_search::FlightSearchState;
use crate::models::Itinerary;
use ratatui::{prelude::*, widgets::*};

/// Renders one frame based on current application state.
pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // title
            Constraint::Length(3),  // origin / destination
            Constraint::Length(3),  // dates + search button
            Constraint::Min(5),     // dropdown or results
            Constraint::Length(1),  // key hints
        ])
        .split(f.size());

    let title = Paragraph::new("Flight Search")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(title, chunks[0]);

    render_airport_row(f, app, chunks[1]);
    render_action_row(f, app, chunks[2]);

    if app.airport_search.options().is_empty() || !is_airport_focus(app.focus) {
        render_results(f, app, chunks[3]);
    } else {
        render_dropdown(f, app, chunks[3]);
    }

    let hints = Paragraph::new("Tab: next field | Enter: select/search | Esc: dismiss/quit")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(hints, chunks[4]);
}

fn is_airport_focus(focus: Focus) -> bool {
    matches!(focus, Focus::Origin | Focus::Destination)
}

fn field_block(title: &str, focused: bool) -> Block {
    let style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Block::default().borders(Borders::ALL).title(title).border_style(style)
}

fn render_airport_row(f: &mut Frame, app: &App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let loading_suffix = if app.airport_search.is_loading() { " ..." } else { "" };

    let origin = Paragraph::new(format!("{}{}", app.origin_text, loading_suffix))
        .block(field_block("From", app.focus == Focus::Origin));
    f.render_widget(origin, cols[0]);

    let destination = Paragraph::new(format!("{}{}", app.destination_text, loading_suffix))
        .block(field_block("To", app.focus == Focus::Destination));
    f.render_widget(destination, cols[1]);
}

fn render_action_row(f: &mut Frame, app: &App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Percentage(35),
            Constraint::Percentage(30),
        ])
        .split(area);

    let draft = &app.flight_search.draft;

    let departure = Paragraph::new(draft.departure_date.as_str())
        .block(field_block("Departure", app.focus == Focus::DepartureDate));
    f.render_widget(departure, cols[0]);

    let return_date = Paragraph::new(draft.return_date.as_deref().unwrap_or(""))
        .block(field_block("Return (optional)", app.focus == Focus::ReturnDate));
    f.render_widget(return_date, cols[1]);

    // The search action is disabled, not failing, while fields are missing.
    let (label, style) = if app.flight_search.is_loading() {
        ("Searching...", Style::default().fg(Color::Yellow))
    } else if app.flight_search.can_submit() {
        ("Search Flights", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
    } else {
        ("Search Flights (fill all fields)", Style::default().fg(Color::DarkGray))
    };
    let button = Paragraph::new(label)
        .alignment(Alignment::Center)
        .style(style)
        .block(field_block("", app.focus == Focus::Search));
    f.render_widget(button, cols[2]);
}

fn render_dropdown(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .airport_search
        .options()
        .iter()
        .enumerate()
        .map(|(i, airport)| {
            let style = if i == app.selected_option {
                Style::default()
                    .fg(Color::Cyan)
                    .bg(Color::Rgb(30, 30, 60))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(
                "{}  ({}, {})",
                airport.name, airport.city, airport.country
            ))
            .style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Airports"));
    f.render_widget(list, area);
}

fn render_results(f: &mut Frame, app: &App, area: Rect) {
    match app.flight_search.state() {
        FlightSearchState::Idle => {
            let help = Paragraph::new("Pick airports and dates, then search.")
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL).title("Flights"));
            f.render_widget(help, area);
        }
        FlightSearchState::Loading => {
            let loading = Paragraph::new("Searching flights...")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().borders(Borders::ALL).title("Flights"));
            f.render_widget(loading, area);
        }
        FlightSearchState::Error(message) => {
            let notice = Paragraph::new(format!("{message} (Esc to dismiss)"))
                .style(Style::default().fg(Color::Red))
                .block(Block::default().borders(Borders::ALL).title("Error"));
            f.render_widget(notice, area);
        }
        FlightSearchState::Success(itineraries) if itineraries.is_empty() => {
            let notice = Paragraph::new(
                "No flights found for your search criteria. Please try different dates or airports.",
            )
            .style(Style::default().fg(Color::Blue))
            .block(Block::default().borders(Borders::ALL).title("Flights"));
            f.render_widget(notice, area);
        }
        FlightSearchState::Success(itineraries) => {
            let items: Vec<ListItem> = itineraries.iter().map(itinerary_line).collect();
            let list = List::new(items).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Available Flights ({})", itineraries.len())),
            );
            f.render_widget(list, area);
        }
    }
}

fn itinerary_line(itinerary: &Itinerary) -> ListItem {
    let Some(leg) = itinerary.legs.first() else {
        return ListItem::new(format!("{}  {}", itinerary.price.formatted, itinerary.id));
    };

    let carrier = leg
        .carriers
        .marketing
        .first()
        .map(|c| c.name.as_str())
        .unwrap_or("Unknown carrier");
    let stops = match leg.stop_count {
        0 => "non-stop".to_string(),
        1 => "1 stop".to_string(),
        n => format!("{n} stops"),
    };
    let hours = leg.duration_in_minutes / 60;
    let minutes = leg.duration_in_minutes % 60;

    let mut line = format!(
        "{:>10}  {} -> {}  {}h {:02}m  {}  {}",
        itinerary.price.formatted,
        leg.origin.display_code,
        leg.destination.display_code,
        hours,
        minutes,
        stops,
        carrier,
    );
    if itinerary.tags.iter().any(|t| t == "cheapest") {
        line.push_str("  [cheapest]");
    }
    ListItem::new(line)
}
