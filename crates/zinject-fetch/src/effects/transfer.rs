use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::effects::http::HttpClient;
use crate::error::{FetchError, Result};

type Outcome = Option<Result<Bytes>>;

/// One in-flight download.
///
/// Cloning a `Transfer` gives another handle onto the same download: every
/// handle observes the same outcome, and any of them may abort it.
#[derive(Clone, Debug)]
pub struct Transfer {
    url: Arc<str>,
    expected_size: Option<u64>,
    cancel: CancellationToken,
    outcome: watch::Receiver<Outcome>,
}

impl Transfer {
    /// Start downloading `url` in a background task.
    ///
    /// With `expected_size` set, a body of any other length fails with
    /// `SizeMismatch` once it has been received in full.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start<C: HttpClient + 'static>(
        client: Arc<C>,
        url: &str,
        expected_size: Option<u64>,
        headers: Arc<[(String, String)]>,
    ) -> Self {
        let url: Arc<str> = Arc::from(url);
        let (tx, rx) = watch::channel(None);
        let cancel = CancellationToken::new();

        let task_url = Arc::clone(&url);
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = task_cancel.cancelled() => {
                    tracing::debug!("download of {} aborted", task_url);
                    Err(FetchError::Aborted { url: task_url.to_string() })
                }
                result = receive(client.as_ref(), &task_url, &headers, expected_size) => result,
            };
            tx.send_replace(Some(outcome));
        });

        Self {
            url,
            expected_size,
            cancel,
            outcome: rx,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn expected_size(&self) -> Option<u64> {
        self.expected_size
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.borrow().is_some()
    }

    /// Abort the download. Safe to call at any time; does nothing once the
    /// download has finished.
    pub fn abort(&self) {
        self.cancel.cancel();
    }

    /// Wait for the download to finish and return the body.
    ///
    /// Fails with `Aborted` if the transfer was aborted by any handle.
    pub async fn wait(&self) -> Result<Bytes> {
        let mut rx = self.outcome.clone();
        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(outcome) => (*outcome).clone(),
            Err(_) => None,
        };
        outcome.unwrap_or_else(|| {
            Err(FetchError::Aborted {
                url: self.url.to_string(),
            })
        })
    }
}

async fn receive<C: HttpClient>(
    client: &C,
    url: &str,
    headers: &[(String, String)],
    expected_size: Option<u64>,
) -> Result<Bytes> {
    let failed = |e: C::Error| FetchError::Transfer {
        url: url.to_string(),
        message: e.to_string(),
    };

    let mut stream = client.stream(url, headers).await.map_err(failed)?;
    let mut body = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk.map_err(failed)?);
    }

    let actual = body.len() as u64;
    if let Some(expected) = expected_size
        && actual != expected
    {
        return Err(FetchError::SizeMismatch {
            url: url.to_string(),
            expected,
            actual,
        });
    }

    tracing::debug!("downloaded {} ({} bytes)", url, actual);
    Ok(body.freeze())
}

/// Registry of live transfers, at most one per URL.
pub struct Downloads<C> {
    client: Arc<C>,
    headers: Arc<[(String, String)]>,
    live: Mutex<HashMap<String, Transfer>>,
}

impl<C: HttpClient + 'static> Downloads<C> {
    pub fn new(client: C, headers: Vec<(String, String)>) -> Self {
        Self {
            client: Arc::new(client),
            headers: headers.into(),
            live: Mutex::new(HashMap::new()),
        }
    }

    /// Get a transfer for `url`.
    ///
    /// An unfinished transfer of the same URL is joined unless `force` is
    /// set, in which case it is aborted and a fresh one started.
    ///
    /// # Panics
    ///
    /// Panics if a new transfer has to be started outside a Tokio runtime.
    pub fn get(&self, url: &str, expected_size: Option<u64>, force: bool) -> Transfer {
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        live.retain(|_, t| !t.is_finished());

        if let Some(existing) = live.get(url) {
            if !force {
                tracing::debug!("joining existing download of {}", url);
                return existing.clone();
            }
            tracing::info!("aborting existing download of {} (forced)", url);
            existing.abort();
        }

        let transfer = Transfer::start(
            Arc::clone(&self.client),
            url,
            expected_size,
            Arc::clone(&self.headers),
        );
        live.insert(url.to_string(), transfer.clone());
        transfer
    }

    /// URLs with a transfer still running.
    pub fn in_flight(&self) -> Vec<String> {
        let live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        live.iter()
            .filter(|(_, t)| !t.is_finished())
            .map(|(url, _)| url.clone())
            .collect()
    }
}
