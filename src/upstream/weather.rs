//! Open-Meteo geocoding and current-weather client.

use serde::{Deserialize, Serialize};
use tracing::field::Empty;
use tracing::Instrument;

use crate::upstream::client::UpstreamClient;
use crate::upstream::types::{UpstreamError, UpstreamResult};

const SERVICE: &str = "weather";

/// A resolved place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Observed conditions at a location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentWeather {
    pub time: String,
    pub temperature_c: f64,
    pub humidity_percent: Option<f64>,
    pub wind_speed_kmh: f64,
    pub weather_code: u32,
    pub description: &'static str,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<Location>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: ForecastCurrent,
}

#[derive(Debug, Deserialize)]
struct ForecastCurrent {
    time: String,
    temperature_2m: f64,
    #[serde(default)]
    relative_humidity_2m: Option<f64>,
    wind_speed_10m: f64,
    weather_code: u32,
}

#[derive(Clone)]
pub struct WeatherApi {
    client: UpstreamClient,
    geocoding_url: String,
    forecast_url: String,
}

impl WeatherApi {
    pub fn new(client: UpstreamClient, geocoding_url: String, forecast_url: String) -> Self {
        Self {
            client,
            geocoding_url,
            forecast_url,
        }
    }

    /// Resolve a city name to its best match.
    pub async fn geocode(&self, city: &str) -> UpstreamResult<Location> {
        let span = tracing::info_span!(
            "weather.geocode",
            weather.city = %city,
            weather.results = Empty,
        );

        async {
            let response: GeocodingResponse = self
                .client
                .get_json(
                    SERVICE,
                    &self.geocoding_url,
                    &[
                        ("name", city.to_string()),
                        ("count", "1".to_string()),
                        ("language", "en".to_string()),
                        ("format", "json".to_string()),
                    ],
                )
                .await?;

            tracing::Span::current().record("weather.results", response.results.len() as u64);
            response
                .results
                .into_iter()
                .next()
                .ok_or_else(|| UpstreamError::NotFound(format!("No location found for '{}'", city)))
        }
        .instrument(span)
        .await
    }

    /// Fetch current conditions for a coordinate pair.
    pub async fn current(&self, latitude: f64, longitude: f64) -> UpstreamResult<CurrentWeather> {
        let span = tracing::info_span!(
            "weather.current",
            weather.latitude = latitude,
            weather.longitude = longitude,
            weather.temperature_c = Empty,
            weather.code = Empty,
        );

        async {
            let response: ForecastResponse = self
                .client
                .get_json(
                    SERVICE,
                    &self.forecast_url,
                    &[
                        ("latitude", latitude.to_string()),
                        ("longitude", longitude.to_string()),
                        (
                            "current",
                            "temperature_2m,relative_humidity_2m,wind_speed_10m,weather_code".to_string(),
                        ),
                    ],
                )
                .await?;

            let current = response.current;
            let span = tracing::Span::current();
            span.record("weather.temperature_c", current.temperature_2m);
            span.record("weather.code", current.weather_code);

            Ok(CurrentWeather {
                time: current.time,
                temperature_c: current.temperature_2m,
                humidity_percent: current.relative_humidity_2m,
                wind_speed_kmh: current.wind_speed_10m,
                weather_code: current.weather_code,
                description: describe_weather_code(current.weather_code),
            })
        }
        .instrument(span)
        .await
    }
}

/// Human-readable WMO weather interpretation code.
pub fn describe_weather_code(code: u32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 | 63 | 65 => "Rain",
        66 | 67 => "Freezing rain",
        71 | 73 | 75 => "Snow fall",
        77 => "Snow grains",
        80..=82 => "Rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_codes() {
        assert_eq!(describe_weather_code(0), "Clear sky");
        assert_eq!(describe_weather_code(48), "Fog");
        assert_eq!(describe_weather_code(81), "Rain showers");
        assert_eq!(describe_weather_code(99), "Thunderstorm with hail");
        assert_eq!(describe_weather_code(42), "Unknown");
    }

    #[test]
    fn test_geocoding_without_results_field() {
        let parsed: GeocodingResponse = serde_json::from_str(r#"{"generationtime_ms":0.5}"#).unwrap();
        assert!(parsed.results.is_empty());
    }

    #[test]
    fn test_forecast_parsing() {
        let parsed: ForecastResponse = serde_json::from_str(
            r#"{
                "latitude": 52.52,
                "current": {
                    "time": "2024-05-01T12:00",
                    "interval": 900,
                    "temperature_2m": 18.4,
                    "relative_humidity_2m": 55,
                    "wind_speed_10m": 11.2,
                    "weather_code": 2
                }
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.current.weather_code, 2);
        assert_eq!(parsed.current.relative_humidity_2m, Some(55.0));
    }
}
