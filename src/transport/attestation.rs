// Attestation network HTTP client
// This file implements the message-fetch capability over the attestation
// network's REST API and the stablecoin issuer's attestation service

use crate::errors::FetchError;
use crate::message::SignedMessage;
use crate::metrics::{REQ_ERRORS, REQ_LATENCY};
use crate::transport::MessageFetcher;
use crate::types::ChainId;
use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, Deserialize)]
struct VaaPage {
    #[serde(default)]
    data: Vec<VaaRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VaaRecord {
    vaa: String,
    emitter_chain: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct CircleAttestation {
    status: String,
    attestation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AttestationApi {
    http: Client,
    base: Url,
    cctp_base: Option<Url>,
}

impl AttestationApi {
    pub fn new(base: Url) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .build()
            .map_err(|e| FetchError::Transport(format!("build http client: {e}")))?;
        Ok(Self {
            http,
            base,
            cctp_base: None,
        })
    }

    pub fn with_cctp(mut self, cctp_base: Url) -> Self {
        self.cctp_base = Some(cctp_base);
        self
    }

    fn retry_policy() -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: Duration::from_millis(250),
            max_interval: Duration::from_secs(5),
            max_elapsed_time: Some(Duration::from_secs(20)),
            multiplier: 2.0,
            ..Default::default()
        }
    }

    /// GET `url` as JSON. `Ok(None)` on 404; server errors and transport
    /// failures are retried with backoff.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        method: &'static str,
    ) -> Result<Option<T>, FetchError> {
        let _timer = REQ_LATENCY
            .with_label_values(&["attestation", method])
            .start_timer();

        let result = retry(Self::retry_policy(), || {
            let http = self.http.clone();
            let url = url.clone();
            async move {
                let resp = http.get(url).send().await.map_err(|e| {
                    backoff::Error::transient(FetchError::Transport(format!("{method}: {e}")))
                })?;
                let status = resp.status();
                if status == StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                    return Err(backoff::Error::transient(FetchError::Transport(format!(
                        "{method}: http {status}"
                    ))));
                }
                if !status.is_success() {
                    return Err(backoff::Error::permanent(FetchError::Transport(format!(
                        "{method}: http {status}"
                    ))));
                }
                resp.json::<T>().await.map(Some).map_err(|e| {
                    backoff::Error::permanent(FetchError::Decode(format!("{method}: {e}")))
                })
            }
        })
        .await;

        if result.is_err() {
            REQ_ERRORS.with_label_values(&["attestation", method]).inc();
        }
        result
    }
}

#[async_trait]
impl MessageFetcher for AttestationApi {
    #[tracing::instrument(skip_all, fields(tx = %tx_id, chain = %chain))]
    async fn fetch(&self, tx_id: &str, chain: ChainId) -> Result<SignedMessage, FetchError> {
        let mut url = self
            .base
            .join("api/v1/vaas/")
            .map_err(|e| FetchError::Transport(format!("bad attestation url: {e}")))?;
        url.query_pairs_mut().append_pair("txHash", tx_id);

        let not_found = || FetchError::NotFound {
            tx_id: tx_id.to_string(),
            chain,
        };
        let page: VaaPage = self.get_json(url, "vaas_by_tx").await?.ok_or_else(not_found)?;
        let record = page
            .data
            .into_iter()
            .find(|r| r.emitter_chain.map(|c| c == chain.0).unwrap_or(true))
            .ok_or_else(not_found)?;

        let bytes = B64
            .decode(record.vaa.as_bytes())
            .map_err(|e| FetchError::Decode(format!("vaa base64: {e}")))?;
        let message = SignedMessage::parse(&bytes).map_err(|e| FetchError::Decode(e.to_string()))?;
        debug!(sequence = message.sequence, emitter = %message.emitter_chain, "fetched signed message");
        Ok(message)
    }

    async fn fetch_cctp_attestation(&self, message_hash: &[u8; 32]) -> Result<Vec<u8>, FetchError> {
        let Some(cctp_base) = &self.cctp_base else {
            return Err(FetchError::Unavailable(
                "cctp attestation source not configured".into(),
            ));
        };
        let url = cctp_base
            .join(&format!("attestations/0x{}", hex::encode(message_hash)))
            .map_err(|e| FetchError::Transport(format!("bad cctp attestation url: {e}")))?;

        let attestation: CircleAttestation = self
            .get_json(url, "cctp_attestation")
            .await?
            .ok_or_else(|| FetchError::Unavailable("attestation not indexed yet".into()))?;
        match (attestation.status.as_str(), attestation.attestation) {
            ("complete", Some(sig)) => hex::decode(sig.trim_start_matches("0x"))
                .map_err(|e| FetchError::Decode(format!("cctp attestation hex: {e}"))),
            (status, _) => Err(FetchError::Unavailable(format!("attestation {status}"))),
        }
    }
}
