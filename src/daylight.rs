use chrono::{DateTime, Datelike, Utc};
use sunrise::sunrise_sunset;

/// Polling window for the day `now` falls on: sunrise and sunset at the
/// coordinate, widened by `margin_minutes` on both ends. Unix timestamps.
pub fn sun_window(
    latitude: f64,
    longitude: f64,
    margin_minutes: i64,
    now: DateTime<Utc>,
) -> (i64, i64) {
    let (sunrise, sunset) = sunrise_sunset(latitude, longitude, now.year(), now.month(), now.day());
    let margin = margin_minutes * 60;
    (sunrise - margin, sunset + margin)
}

/// Whether `now` is inside the widened daylight window. The inverter is
/// unpowered outside it, so polling then only produces timeouts.
pub fn is_sun_up(latitude: f64, longitude: f64, margin_minutes: i64, now: DateTime<Utc>) -> bool {
    let (start, end) = sun_window(latitude, longitude, margin_minutes, now);
    let now = now.timestamp();
    now > start && now < end
}
