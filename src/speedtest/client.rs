//! HTTP client speaking the speedtest.net protocol

use super::servers::{mean_latency, pick_best, LATENCY_PENALTY};
use super::{BandwidthMeter, SpeedtestConfig, SpeedtestServer};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use futures::future;
use futures::stream::{self, StreamExt};
use parking_lot::{Mutex, RwLock};
use reqwest::{header, Body, Client};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

const FILLER: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const UPLOAD_PREFIX: &[u8] = b"content1=";
const UPLOAD_CHUNK: usize = 16 * 1024;

/// Build an upload body of exactly `size` bytes (never shorter than the prefix)
pub fn upload_payload(size: usize) -> Vec<u8> {
    let mut body = Vec::with_capacity(size.max(UPLOAD_PREFIX.len()));
    body.extend_from_slice(UPLOAD_PREFIX);
    body.extend(FILLER.iter().copied().cycle().take(size.saturating_sub(UPLOAD_PREFIX.len())));
    body
}

/// Throughput in bits per second
fn bits_per_second(bytes: u64, elapsed: Duration) -> Result<f64> {
    let secs = elapsed.as_secs_f64();
    if bytes == 0 || secs <= 0.0 {
        return Err(AppError::speedtest(format!(
            "Transfer too small to measure ({} bytes in {:?})",
            bytes, elapsed
        )));
    }
    Ok(bytes as f64 * 8.0 / secs)
}

/// Bytes moved by the transfers of one measurement
#[derive(Default)]
struct TransferTally {
    moved: AtomicU64,
    last_error: Mutex<Option<AppError>>,
}

impl TransferTally {
    fn add(&self, bytes: usize) {
        self.moved.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    fn retract(&self, bytes: u64) {
        self.moved.fetch_sub(bytes, Ordering::Relaxed);
    }

    fn moved(&self) -> u64 {
        self.moved.load(Ordering::Relaxed)
    }

    fn fail(&self, url: &Url, error: AppError) {
        debug!(%url, error = %error, "Transfer failed");
        *self.last_error.lock() = Some(error);
    }

    /// Throughput over `elapsed`. When nothing moved, the last transfer
    /// error is returned if there was one.
    fn throughput(&self, elapsed: Duration) -> Result<f64> {
        let moved = self.moved();
        if moved == 0 {
            if let Some(e) = self.last_error.lock().take() {
                return Err(e);
            }
        }
        bits_per_second(moved, elapsed)
    }
}

/// [`BandwidthMeter`] backed by speedtest.net servers
pub struct SpeedtestClient {
    http: Client,
    config: SpeedtestConfig,
    selected: RwLock<Option<SpeedtestServer>>,
}

impl SpeedtestClient {
    pub fn new(config: SpeedtestConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            selected: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &SpeedtestConfig {
        &self.config
    }

    /// Download the server list
    pub async fn fetch_servers(&self) -> Result<Vec<SpeedtestServer>> {
        let servers: Vec<SpeedtestServer> = self
            .http
            .get(&self.config.servers_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if servers.is_empty() {
            return Err(AppError::speedtest(format!(
                "Server list at {} is empty",
                self.config.servers_url
            )));
        }

        debug!(count = servers.len(), "Fetched speedtest server list");
        Ok(servers)
    }

    /// One `latency.txt` round trip; failures score [`LATENCY_PENALTY`]
    async fn latency_sample(&self, url: &Url) -> Duration {
        let started = Instant::now();
        let response = match self.http.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(%url, error = %e, "Latency request failed");
                return LATENCY_PENALTY;
            }
        };

        if !response.status().is_success() {
            debug!(%url, status = %response.status(), "Latency request rejected");
            return LATENCY_PENALTY;
        }

        match response.text().await {
            Ok(body) if body.starts_with("test=test") => started.elapsed(),
            _ => LATENCY_PENALTY,
        }
    }

    /// Mean latency to `server`, in seconds
    pub async fn server_latency(&self, server: &SpeedtestServer) -> f64 {
        let url = match server.resource("latency.txt") {
            Ok(url) => url,
            Err(e) => {
                warn!(server = %server.host, error = %e, "Unusable server URL");
                return LATENCY_PENALTY.as_secs_f64();
            }
        };

        let mut scores = Vec::with_capacity(self.config.latency_samples);
        for _ in 0..self.config.latency_samples {
            scores.push(self.latency_sample(&url).await);
        }
        mean_latency(&scores)
    }

    /// Latency-test the head of the list and return the fastest server
    pub async fn select_best(&self, servers: &[SpeedtestServer]) -> Result<SpeedtestServer> {
        let candidates = &servers[..servers.len().min(self.config.candidate_count)];

        let scored: Vec<(SpeedtestServer, f64)> = stream::iter(candidates)
            .then(|server| async move { (server.clone(), self.server_latency(server).await) })
            .collect()
            .await;

        for (server, latency) in &scored {
            debug!(server = %server.host, latency_ms = latency * 1000.0, "Candidate latency");
        }

        let (best, latency) = pick_best(scored)?;
        info!(
            server = %best.host,
            sponsor = %best.sponsor,
            latency_ms = latency * 1000.0,
            "Selected speedtest server"
        );
        Ok(best)
    }

    /// The selected server, selecting one first if needed
    async fn ensure_server(&self) -> Result<SpeedtestServer> {
        if let Some(server) = self.selected_server() {
            return Ok(server);
        }

        info!("No speedtest server selected yet, selecting one now");
        self.refresh_servers().await
    }

    /// Run `transfers` a few at a time until they finish or the test
    /// duration runs out, and return the measured interval
    async fn drive<I>(&self, transfers: I) -> Duration
    where
        I: IntoIterator,
        I::Item: Future<Output = ()>,
    {
        let started = Instant::now();
        let deadline = started + self.config.test_duration;

        let all = stream::iter(transfers)
            .buffer_unordered(self.config.concurrency.max(1))
            .for_each(|()| future::ready(()));
        if tokio::time::timeout_at(deadline, all).await.is_err() {
            debug!(duration = ?self.config.test_duration, "Test duration reached, dropping transfers in flight");
        }

        started.elapsed().min(self.config.test_duration)
    }

    async fn download_one(&self, url: Url, tally: &TransferTally) {
        if let Err(e) = self.stream_download(&url, tally).await {
            tally.fail(&url, e);
        }
    }

    /// Count body bytes as they arrive
    async fn stream_download(&self, url: &Url, tally: &TransferTally) -> Result<()> {
        let mut body = self
            .http
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .bytes_stream();

        while let Some(chunk) = body.next().await {
            tally.add(chunk?.len());
        }
        Ok(())
    }

    /// Stream `payload` in chunks, counting each chunk as it is handed to the
    /// connection. A rejected upload takes its bytes back out of the tally.
    async fn upload_one(&self, url: Url, payload: Vec<u8>, tally: Arc<TransferTally>) {
        let length = payload.len();
        let sent = Arc::new(AtomicU64::new(0));

        let chunks: Vec<Vec<u8>> = payload.chunks(UPLOAD_CHUNK).map(<[u8]>::to_vec).collect();
        let body = {
            let tally = Arc::clone(&tally);
            let sent = Arc::clone(&sent);
            Body::wrap_stream(stream::iter(chunks).map(move |chunk| {
                tally.add(chunk.len());
                sent.fetch_add(chunk.len() as u64, Ordering::Relaxed);
                Ok::<_, std::io::Error>(chunk)
            }))
        };

        let result = self
            .http
            .post(url.clone())
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::CONTENT_LENGTH, length)
            .body(body)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        if let Err(e) = result {
            if e.is_status() {
                tally.retract(sent.load(Ordering::Relaxed));
            }
            tally.fail(&url, e.into());
        }
    }
}

#[async_trait]
impl BandwidthMeter for SpeedtestClient {
    async fn refresh_servers(&self) -> Result<SpeedtestServer> {
        let servers = self.fetch_servers().await?;
        let best = self.select_best(&servers).await?;
        *self.selected.write() = Some(best.clone());
        Ok(best)
    }

    async fn measure_download(&self) -> Result<f64> {
        let server = self.ensure_server().await?;

        let mut urls = Vec::new();
        for size in &self.config.download_sizes {
            let url = server.resource(&format!("random{}x{}.jpg", size, size))?;
            urls.extend(std::iter::repeat(url).take(self.config.requests_per_size));
        }

        let tally = TransferTally::default();
        let elapsed = self
            .drive(urls.into_iter().map(|url| self.download_one(url, &tally)))
            .await;

        let bps = tally.throughput(elapsed)?;
        debug!(server = %server.host, bytes = tally.moved(), bps, "Download measured");
        Ok(bps)
    }

    async fn measure_upload(&self) -> Result<f64> {
        let server = self.ensure_server().await?;
        let url = server.upload_url()?;

        let mut bodies = Vec::new();
        for size in &self.config.upload_sizes {
            let payload = upload_payload(*size);
            bodies.extend(std::iter::repeat(payload).take(self.config.requests_per_size));
        }

        let tally = Arc::new(TransferTally::default());
        let elapsed = self
            .drive(
                bodies
                    .into_iter()
                    .map(|body| self.upload_one(url.clone(), body, Arc::clone(&tally))),
            )
            .await;

        let bps = tally.throughput(elapsed)?;
        debug!(server = %server.host, bytes = tally.moved(), bps, "Upload measured");
        Ok(bps)
    }

    fn selected_server(&self) -> Option<SpeedtestServer> {
        self.selected.read().clone()
    }
}
