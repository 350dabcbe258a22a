//! sunrise-sunset.org API client and conversion to Japan local time.
//!
//! The lookup requests `formatted=0` so the API returns ISO-8601 UTC
//! timestamps and the day length as integer seconds. All instants are
//! converted to Asia/Tokyo before display.

use chrono::DateTime;
use chrono_tz::Asia::Tokyo;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.sunrise-sunset.org";

/// Client for the sunrise-sunset.org JSON API.
#[derive(Clone)]
pub struct SunTimesClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum SunTimesError {
    #[error("sun-times request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("sun-times api error: {0}")]
    Api(String),
    #[error("sun-times timestamp parse failed: {0}")]
    Time(#[from] chrono::ParseError),
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    status: String,
    results: Option<LookupResults>,
}

#[derive(Debug, Deserialize)]
struct LookupResults {
    sunrise: String,
    sunset: String,
    solar_noon: String,
    day_length: i64,
}

/// One instant in Japan local time: full ISO-8601 offset form and HH:MM:SS display form.
#[derive(Debug, Clone)]
pub struct LocalInstant {
    pub iso: String,
    pub time: String,
}

/// Sun times for one location, converted to Asia/Tokyo.
#[derive(Debug, Clone)]
pub struct SunTimes {
    pub sunrise: LocalInstant,
    pub sunset: LocalInstant,
    pub solar_noon: LocalInstant,
    /// Day length rendered H:MM:SS (hours unpadded).
    pub day_length: String,
}

impl SunTimesClient {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// GET /json?lat=..&lng=..&formatted=0 — look up sun times for a coordinate.
    /// Coordinates are passed through as received; the API enforces its own bounds.
    pub async fn lookup(&self, latitude: f64, longitude: f64) -> Result<SunTimes, SunTimesError> {
        let url = format!(
            "{}/json?lat={}&lng={}&formatted=0",
            self.base_url, latitude, longitude
        );
        let res = self.client.get(&url).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SunTimesError::Api(format!("{} {}", status, body)));
        }
        let data: LookupResponse = res.json().await?;
        if data.status != "OK" {
            return Err(SunTimesError::Api(format!("status {}", data.status)));
        }
        let results = data
            .results
            .ok_or_else(|| SunTimesError::Api("missing results".to_string()))?;
        Ok(SunTimes {
            sunrise: to_japan_time(&results.sunrise)?,
            sunset: to_japan_time(&results.sunset)?,
            solar_noon: to_japan_time(&results.solar_noon)?,
            day_length: format_day_length(results.day_length),
        })
    }
}

/// Parse an ISO-8601 timestamp with UTC offset and convert to Asia/Tokyo.
fn to_japan_time(timestamp: &str) -> Result<LocalInstant, chrono::ParseError> {
    let parsed = DateTime::parse_from_rfc3339(timestamp)?;
    let local = parsed.with_timezone(&Tokyo);
    Ok(LocalInstant {
        iso: local.format("%Y-%m-%dT%H:%M:%S%z").to_string(),
        time: local.format("%H:%M:%S").to_string(),
    })
}

/// Render a day length in seconds as H:MM:SS.
fn format_day_length(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{}:{:02}:{:02}", hours, minutes, secs)
}
