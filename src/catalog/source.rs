use super::Segment;
use crate::request::{ApiResult, RequestState};
use async_trait::async_trait;

/// Anything that can answer a segment search.
#[async_trait]
pub trait SegmentSource: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &'static str;

    /// One search round trip. `Ok(None)` means the reply carried no data.
    async fn search(&self, query: &str) -> ApiResult<Vec<Segment>>;

    /// Loading/error state of this handle.
    fn state(&self) -> RequestState;

    /// A handle on the same backend with its own, fresh request state.
    fn session(&self) -> Self
    where
        Self: Sized;
}
