/// Fire-and-forget platform actions. Nothing they return is consumed.
pub trait ExternalActions: Send + Sync {
    fn dial(&self, phone: &str);

    fn open_directions(&self, lat: f64, lng: f64);
}

pub fn dial_uri(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    format!("tel:{digits}")
}

pub fn directions_url(lat: f64, lng: f64) -> String {
    format!("https://www.google.com/maps/search/?api=1&query={lat},{lng}")
}

/// Host without a phone or browser: the action is only logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingActions;

impl ExternalActions for LoggingActions {
    fn dial(&self, phone: &str) {
        tracing::info!(uri = %dial_uri(phone), "dial requested");
    }

    fn open_directions(&self, lat: f64, lng: f64) {
        tracing::info!(url = %directions_url(lat, lng), "directions requested");
    }
}
