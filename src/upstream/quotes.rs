//! Random quote client.

use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::upstream::client::UpstreamClient;
use crate::upstream::types::UpstreamResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub id: u64,
    pub text: String,
    pub author: String,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    id: u64,
    quote: String,
    author: String,
}

impl From<QuoteResponse> for Quote {
    fn from(response: QuoteResponse) -> Self {
        Self {
            id: response.id,
            text: response.quote,
            author: response.author,
        }
    }
}

#[derive(Clone)]
pub struct QuotesApi {
    client: UpstreamClient,
    url: String,
}

impl QuotesApi {
    pub fn new(client: UpstreamClient, url: String) -> Self {
        Self { client, url }
    }

    pub async fn random(&self) -> UpstreamResult<Quote> {
        let span = tracing::info_span!("quote.fetch", quote.author = tracing::field::Empty);

        async {
            let response: QuoteResponse = self.client.get_json("quotes", &self.url, &[]).await?;
            tracing::Span::current().record("quote.author", response.author.as_str());
            Ok(Quote::from(response))
        }
        .instrument(span)
        .await
    }
}
