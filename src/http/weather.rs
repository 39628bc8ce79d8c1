use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::http::response::{ApiError, Traced};
use crate::http::server::AppState;
use crate::upstream::{CurrentWeather, Location};

#[derive(Debug, Default, Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct WeatherResponse {
    pub location: Location,
    pub current: CurrentWeather,
}

/// Coordinates given explicitly, or `None` when the city must be geocoded.
fn explicit_coordinates(query: &WeatherQuery) -> Result<Option<(f64, f64)>, ApiError> {
    match (query.lat, query.lon) {
        (None, None) => Ok(None),
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(ApiError::BadRequest(
                    "'lat' must be within [-90, 90]".to_string(),
                ));
            }
            if !(-180.0..=180.0).contains(&lon) {
                return Err(ApiError::BadRequest(
                    "'lon' must be within [-180, 180]".to_string(),
                ));
            }
            Ok(Some((lat, lon)))
        }
        _ => Err(ApiError::BadRequest(
            "'lat' and 'lon' must be given together".to_string(),
        )),
    }
}

pub async fn get_weather(
    State(state): State<AppState>,
    query: Result<Query<WeatherQuery>, QueryRejection>,
) -> Result<Traced<WeatherResponse>, ApiError> {
    let Query(query) = query?;
    let weather = &state.upstreams.weather;

    let location = match explicit_coordinates(&query)? {
        Some((latitude, longitude)) => Location {
            name: query
                .city
                .clone()
                .unwrap_or_else(|| format!("{:.4},{:.4}", latitude, longitude)),
            country: None,
            latitude,
            longitude,
            timezone: None,
        },
        None => {
            let city = query
                .city
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(&state.config.upstream.default_city);
            weather.geocode(city).await?
        }
    };

    let current = weather.current(location.latitude, location.longitude).await?;

    state.logger.info(
        "Weather lookup completed",
        &[
            ("weather.location", location.name.as_str().into()),
            ("weather.temperature_c", current.temperature_c.into()),
            ("weather.code", i64::from(current.weather_code).into()),
        ],
    );

    Ok(Traced::new(WeatherResponse { location, current }))
}
