//! Lead data sources.
//!
//! A source fetches up to a requested number of leads for one partition,
//! persists them, and reports how many it actually obtained. The batch executor
//! treats it as an opaque, slow, fallible remote operation.

mod http;
mod parse;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::catalog::Partition;
use crate::store::StoreError;

pub use http::HttpLeadSource;
pub use parse::decode_leads;

/// Why a single partition fetch failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
    #[error("upstream returned HTTP {status}")]
    Http { status: u32 },
    #[error("transport: {0}")]
    Transport(String),
    #[error("decode response: {0}")]
    Decode(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("fetch cancelled")]
    Cancelled,
}

/// Fetches and persists leads for one partition.
///
/// Implementations should return early with [`FetchError::Cancelled`] once
/// `cancel` fires; the executor never kills an in-flight call.
#[async_trait]
pub trait LeadSource: Send + Sync {
    async fn fetch_and_store(
        &self,
        cancel: &CancellationToken,
        partition: &Partition,
        target: u32,
    ) -> Result<u32, FetchError>;
}
