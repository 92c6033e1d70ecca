//! # Segmento
//!
//! Confirm or change the business segment of a profile by searching the
//! remote segment catalog.
//!
//! ## Architecture
//!
//! ```text
//! keystrokes → search::DebouncedSearch → catalog::Catalog → request::RequestClient → HTTP
//!                      │
//!                      └→ candidates → flow::SelectionFlow (Confirming ⇄ Searching)
//! ```
//!
//! ```no_run
//! use segmento_lib::{Catalog, Config, SelectionFlow};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let catalog = Catalog::new(&config)?;
//!     let mut flow = SelectionFlow::start(catalog, &config).await;
//!
//!     flow.edit().input("barb");
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod flow;
pub mod request;
pub mod search;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{Catalog, Segment, SegmentPage, SegmentSource};
pub use config::{Config, ConfigError};
pub use flow::{FlowState, SelectionFlow};
pub use request::{ApiResult, Method, RequestBody, RequestClient, RequestConfig, RequestError, RequestState};
pub use search::{DebouncedSearch, SearchExit, SearchState};
