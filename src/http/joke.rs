use axum::extract::State;

use crate::http::response::{ApiError, Traced};
use crate::http::server::AppState;
use crate::upstream::Joke;

pub async fn get_joke(State(state): State<AppState>) -> Result<Traced<Joke>, ApiError> {
    let joke = state.upstreams.jokes.random().await?;

    state.logger.info(
        "Joke fetched",
        &[
            ("joke.id", joke.id.into()),
            ("joke.category", joke.category.as_str().into()),
        ],
    );

    Ok(Traced::new(joke))
}
