//! Random joke client.

use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::upstream::client::UpstreamClient;
use crate::upstream::types::UpstreamResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joke {
    pub id: u64,
    #[serde(rename(deserialize = "type"))]
    pub category: String,
    pub setup: String,
    pub punchline: String,
}

#[derive(Clone)]
pub struct JokesApi {
    client: UpstreamClient,
    url: String,
}

impl JokesApi {
    pub fn new(client: UpstreamClient, url: String) -> Self {
        Self { client, url }
    }

    pub async fn random(&self) -> UpstreamResult<Joke> {
        let span = tracing::info_span!(
            "joke.fetch",
            joke.id = tracing::field::Empty,
            joke.category = tracing::field::Empty,
        );

        async {
            let joke: Joke = self.client.get_json("jokes", &self.url, &[]).await?;
            let span = tracing::Span::current();
            span.record("joke.id", joke.id);
            span.record("joke.category", joke.category.as_str());
            Ok(joke)
        }
        .instrument(span)
        .await
    }
}
