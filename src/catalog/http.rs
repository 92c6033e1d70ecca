use super::{search_endpoint, Segment, SegmentPage, SegmentSource};
use crate::config::Config;
use crate::request::{ApiResult, RequestClient, RequestConfig, RequestError, RequestState};
use async_trait::async_trait;
use tokio::sync::watch;

/// Segment search over the remote catalog API.
pub struct Catalog {
    client: RequestClient,
}

impl Catalog {
    pub fn new(config: &Config) -> Result<Self, RequestError> {
        Ok(Self {
            client: RequestClient::new(config)?,
        })
    }

    pub fn from_client(client: RequestClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RequestClient {
        &self.client
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.client.subscribe()
    }
}

#[async_trait]
impl SegmentSource for Catalog {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn search(&self, query: &str) -> ApiResult<Vec<Segment>> {
        let page: Option<SegmentPage> = self
            .client
            .send(&search_endpoint(query), RequestConfig::get())
            .await?;
        Ok(page.map(|p| p.list))
    }

    fn state(&self) -> RequestState {
        self.client.state()
    }

    fn session(&self) -> Self {
        Self {
            client: self.client.session(),
        }
    }
}
