//! External API subsystem.
//!
//! # Data Flow
//! ```text
//! handler
//!     → weather.rs / quotes.rs / jokes.rs (domain span, response mapping)
//!     → client.rs (client span, traceparent injection, timeout, metrics)
//!     → public REST API
//! ```

pub mod client;
pub mod jokes;
pub mod quotes;
pub mod types;
pub mod weather;

pub use client::UpstreamClient;
pub use jokes::{Joke, JokesApi};
pub use quotes::{Quote, QuotesApi};
pub use types::{UpstreamError, UpstreamResult};
pub use weather::{CurrentWeather, Location, WeatherApi};

use crate::config::UpstreamConfig;

/// All upstream clients sharing one connection pool.
#[derive(Clone)]
pub struct Upstreams {
    pub weather: WeatherApi,
    pub quotes: QuotesApi,
    pub jokes: JokesApi,
}

impl Upstreams {
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let client = UpstreamClient::new(config)?;
        Ok(Self {
            weather: WeatherApi::new(
                client.clone(),
                config.geocoding_url.clone(),
                config.forecast_url.clone(),
            ),
            quotes: QuotesApi::new(client.clone(), config.quotes_url.clone()),
            jokes: JokesApi::new(client, config.jokes_url.clone()),
        })
    }
}
