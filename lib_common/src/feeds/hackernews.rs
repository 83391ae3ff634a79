//! Hacker News feed client.
//!
//! A thin [`DocumentSource`] implementation over the Firebase API, built on
//! `reqwest_middleware` with exponential-backoff retries for transient
//! transport failures. Business-level retry (the one-poll-interval wait) is
//! the aggregator's job, not this client's.

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use url::Url;

use super::{DocumentSource, FeedDocument, FetchError};

/// The public Hacker News Firebase API root.
pub const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0/";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "mentions-counter/0.1";

/// Asynchronous Hacker News API client.
pub struct HackerNewsClient {
    /// The underlying middleware-enabled client.
    inner: ClientWithMiddleware,
    /// The base URL to which all relative paths are joined.
    base_url: Url,
}

impl HackerNewsClient {
    /// Create a client rooted at `base_url` (must be absolute and end with
    /// a slash for relative joins to land under it).
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let url = Url::parse(base_url)?;

        // Configure an exponential backoff policy with 3 retries
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

        let client = ClientBuilder::new(
            reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_default(), // Fallback to a default client if builder fails.
        )
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build();

        Ok(Self {
            inner: client,
            base_url: url,
        })
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let full_url = self.base_url.join(path)?;
        let response = self.inner.get(full_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.json::<T>().await?)
    }
}

impl DocumentSource for HackerNewsClient {
    fn latest_id(&self) -> impl Future<Output = Result<u64, FetchError>> + Send {
        async move { self.get_json::<u64>("maxitem.json").await }
    }

    fn document(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<Option<FeedDocument>, FetchError>> + Send {
        async move {
            // A null body decodes to None: the id exists in the sequence but
            // carries no document.
            self.get_json::<Option<FeedDocument>>(&format!("item/{id}.json"))
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_relative_base_url() {
        assert!(matches!(
            HackerNewsClient::new("not-a-url"),
            Err(FetchError::Url(_))
        ));
    }

    #[test]
    fn document_payload_decodes() {
        let doc: Option<FeedDocument> = serde_json::from_str(
            r#"{"by":"someone","id":101,"score":3,"time":1,"title":"Show HN: thing","type":"story","kids":[1,2]}"#,
        )
        .unwrap();
        assert_eq!(
            doc,
            Some(FeedDocument {
                id: 101,
                kind: "story".to_string(),
                title: "Show HN: thing".to_string(),
                deleted: false,
            })
        );
    }

    #[test]
    fn null_payload_decodes_to_none() {
        let doc: Option<FeedDocument> = serde_json::from_str("null").unwrap();
        assert_eq!(doc, None);
    }

    #[test]
    fn deleted_item_without_title_decodes() {
        let doc: Option<FeedDocument> =
            serde_json::from_str(r#"{"id":102,"type":"story","deleted":true}"#).unwrap();
        let doc = doc.unwrap();
        assert!(doc.deleted);
        assert_eq!(doc.title, "");
    }
}
