//! User location resolution for the skysearch client.
//!
//! Provides a single public function, [`resolve_location`], which returns
//! the coordinates used to seed the nearby-airports lookup. Location comes
//! from IP geolocation (IpApi) when `auto_detect` is on, or from the manual
//! coordinates in the config otherwise.

use crate::config::LocationConfig;
use ipgeolocate::{Locator, Service};
use tracing::{info, warn};

/// Resolves the user's approximate location, once per session.
///
/// Returns `None` when geolocation fails (network error, service outage,
/// unparseable response). A missing fix is not an error anywhere in the app:
/// the airport form simply has no nearby suggestions until the user types.
pub async fn resolve_location(config: &LocationConfig) -> Option<(f64, f64)> {
    if !config.auto_detect {
        return Some((config.manual_lat, config.manual_lon));
    }

    // Using IpApi as the service, it's pretty reliable.
    match Locator::get("1.1.1.1", Service::IpApi).await {
        Ok(loc) => {
            let lat = loc.latitude.parse::<f64>().ok()?;
            let lon = loc.longitude.parse::<f64>().ok()?;
            info!("Geolocation successful - ({}, {})", lat, lon);
            Some((lat, lon))
        }
        Err(e) => {
            warn!("Geolocation unavailable: {}. No nearby airports offered.", e);
            None
        }
    }
}
