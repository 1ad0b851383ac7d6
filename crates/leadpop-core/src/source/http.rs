//! HTTP lead source backed by libcurl.
//!
//! Issues `GET {base_url}?industry=..&country=..&limit=N`, decodes the JSON
//! body, and writes the leads to the lead database. The blocking transfer runs
//! on the blocking pool and aborts from the progress callback once cancelled.

use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::parse::decode_leads;
use super::{FetchError, LeadSource};
use crate::catalog::Partition;
use crate::config::SourceConfig;
use crate::store::LeadDb;

/// Value stored in the `source` column for leads written by this source.
const SOURCE_NAME: &str = "http";

#[derive(Debug, Clone)]
pub struct HttpLeadSource {
    db: LeadDb,
    cfg: SourceConfig,
}

impl HttpLeadSource {
    pub fn new(db: LeadDb, cfg: SourceConfig) -> Self {
        Self { db, cfg }
    }

    fn request_url(&self, partition: &Partition, target: u32) -> Result<String, FetchError> {
        let limit = target.to_string();
        let url = url::Url::parse_with_params(
            &self.cfg.base_url,
            &[
                ("industry", partition.industry.as_str()),
                ("country", partition.country.as_str()),
                ("limit", limit.as_str()),
            ],
        )
        .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", self.cfg.base_url, e)))?;
        Ok(url.into())
    }
}

#[async_trait]
impl LeadSource for HttpLeadSource {
    async fn fetch_and_store(
        &self,
        cancel: &CancellationToken,
        partition: &Partition,
        target: u32,
    ) -> Result<u32, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let url = self.request_url(partition, target)?;
        let request = Request {
            url,
            api_key: self.cfg.api_key.clone(),
            connect_timeout: Duration::from_secs(self.cfg.connect_timeout_secs),
            timeout: Duration::from_secs(self.cfg.request_timeout_secs),
        };
        let abort = cancel.clone();
        let body = tokio::task::spawn_blocking(move || get_body(&request, &abort))
            .await
            .map_err(|e| FetchError::Transport(format!("fetch task join: {}", e)))??;

        let leads = decode_leads(&body, target as usize)?;
        let written = self.db.insert_leads(partition, &leads, SOURCE_NAME).await?;
        tracing::debug!(
            partition = %partition,
            target,
            received = leads.len(),
            written,
            "leads stored"
        );
        Ok(u32::try_from(written).unwrap_or(u32::MAX))
    }
}

struct Request {
    url: String,
    api_key: Option<String>,
    connect_timeout: Duration,
    timeout: Duration,
}

/// Performs the GET and returns the response body.
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
fn get_body(req: &Request, cancel: &CancellationToken) -> Result<Vec<u8>, FetchError> {
    let transport = |e: curl::Error| FetchError::Transport(e.to_string());
    let mut body = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(&req.url).map_err(transport)?;
    easy.follow_location(true).map_err(transport)?;
    easy.connect_timeout(req.connect_timeout).map_err(transport)?;
    easy.timeout(req.timeout).map_err(transport)?;
    easy.progress(true).map_err(transport)?;

    let mut list = curl::easy::List::new();
    list.append("Accept: application/json").map_err(transport)?;
    if let Some(key) = &req.api_key {
        list.append(&format!("Authorization: Bearer {}", key.trim()))
            .map_err(transport)?;
    }
    easy.http_headers(list).map_err(transport)?;

    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(transport)?;
        // Returning false aborts the transfer.
        transfer
            .progress_function(|_, _, _, _| !cancel.is_cancelled())
            .map_err(transport)?;
        if let Err(e) = transfer.perform() {
            if e.is_aborted_by_callback() || cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }
            return Err(transport(e));
        }
    }

    let code = easy.response_code().map_err(transport)?;
    if !(200..300).contains(&code) {
        return Err(FetchError::Http { status: code });
    }
    Ok(body)
}
