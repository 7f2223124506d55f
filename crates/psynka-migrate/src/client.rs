use std::time::Duration;

use psynka_common::{Error, Result};
use psynka_config::SupabaseConfig;
use serde_json::json;
use tracing::debug;

/// How much of a failing response body to keep as diagnostic text.
const BODY_SNIPPET_LEN: usize = 200;

/// A single RPC or probe call that did not succeed. `status` is `None`
/// when the request never got a response (connect error, timeout).
#[derive(Debug, Clone)]
pub struct RpcFailure {
    pub status: Option<u16>,
    pub detail: String,
}

impl std::fmt::Display for RpcFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {status}: {}", self.detail),
            None => write!(f, "{}", self.detail),
        }
    }
}

/// Thin client over the Supabase REST surface: the `exec_sql` RPC for
/// running statements and per-table resource queries for existence probes.
///
/// The service-role key travels in both the `apikey` header and as a
/// bearer token, which is what PostgREST expects for service-level access.
pub struct SupabaseClient {
    http: reqwest::Client,
    rpc_url: String,
    rest_url: String,
    api_key: String,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Error::Rpc(format!("failed to build http client: {e}")))?;

        let base = config.url.trim_end_matches('/');
        Ok(Self {
            http,
            rpc_url: format!("{base}/rest/v1/rpc/{}", config.exec_sql_function),
            rest_url: format!("{base}/rest/v1"),
            api_key: config.service_role_key.clone(),
        })
    }

    /// Execute one SQL statement through the RPC endpoint. Any non-2xx
    /// response or transport error comes back as an `RpcFailure`.
    pub async fn exec_sql(&self, sql: &str) -> std::result::Result<(), RpcFailure> {
        debug!("exec_sql: {} bytes", sql.len());
        let response = self
            .http
            .post(&self.rpc_url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&json!({ "sql": sql }))
            .send()
            .await
            .map_err(|e| RpcFailure {
                status: None,
                detail: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(RpcFailure {
            status: Some(status.as_u16()),
            detail: snippet(&body),
        })
    }

    /// Zero-row probe: ask the table for no rows at all. A 2xx means the
    /// table exists and is queryable under the current credential.
    pub async fn probe_table(&self, table: &str) -> std::result::Result<(), RpcFailure> {
        let response = self
            .http
            .get(format!("{}/{table}", self.rest_url))
            .query(&[("select", "*"), ("limit", "0")])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| RpcFailure {
                status: None,
                detail: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(RpcFailure {
            status: Some(status.as_u16()),
            detail: snippet(&body),
        })
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= BODY_SNIPPET_LEN {
        return trimmed.to_string();
    }
    let mut cut = BODY_SNIPPET_LEN;
    while !trimmed.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…", &trimmed[..cut])
}
