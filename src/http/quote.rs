use axum::extract::State;

use crate::http::response::{ApiError, Traced};
use crate::http::server::AppState;
use crate::upstream::Quote;

pub async fn get_quote(State(state): State<AppState>) -> Result<Traced<Quote>, ApiError> {
    let quote = state.upstreams.quotes.random().await?;

    state.logger.info(
        "Quote fetched",
        &[
            ("quote.id", quote.id.into()),
            ("quote.author", quote.author.as_str().into()),
            ("quote.length", quote.text.chars().count().into()),
        ],
    );

    Ok(Traced::new(quote))
}
