#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use zinject_archive::{UnpackOptions, unpack_archive_over};
use zinject_fetch::{
    BoxStream, DirStore, FetchContext, FetchError, Fetcher, FetcherConfig, Handler, HttpClient,
    ImplDigest, Implementation, Interface, KeyFetcher, MemoryFeedCache, PendingFeed, Result,
    Signature, SignatureStatus, SignatureVerifier, TrustDb,
};
use zinject_store::manifest::manifest_digest;
use zinject_verify::Algorithm;

pub const FEED: &str = "http://example.com/prog.xml";
pub const MIRROR: &str = "http://mirror.example.com/0mirror";

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct MockError(String);

#[derive(Clone)]
struct Route {
    body: Bytes,
    failure: Option<String>,
    delay: Duration,
}

#[derive(Default)]
struct ClientState {
    routes: HashMap<String, Route>,
    requests: HashMap<String, usize>,
    served: HashMap<String, usize>,
    headers: Vec<(String, String)>,
}

/// An [`HttpClient`] serving canned bodies, optionally after a delay.
#[derive(Clone, Default)]
pub struct MockClient {
    state: Arc<Mutex<ClientState>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, body: impl Into<Bytes>) -> &Self {
        self.route(url, body.into(), None, Duration::ZERO)
    }

    pub fn serve_after(&self, url: &str, body: impl Into<Bytes>, delay: Duration) -> &Self {
        self.route(url, body.into(), None, delay)
    }

    pub fn fail(&self, url: &str, message: &str) -> &Self {
        self.route(url, Bytes::new(), Some(message.to_string()), Duration::ZERO)
    }

    pub fn fail_after(&self, url: &str, message: &str, delay: Duration) -> &Self {
        self.route(url, Bytes::new(), Some(message.to_string()), delay)
    }

    fn route(&self, url: &str, body: Bytes, failure: Option<String>, delay: Duration) -> &Self {
        let mut state = self.state.lock().unwrap();
        state.routes.insert(
            url.to_string(),
            Route {
                body,
                failure,
                delay,
            },
        );
        self
    }

    /// How many requests for `url` were started.
    pub fn requests(&self, url: &str) -> usize {
        self.state.lock().unwrap().requests.get(url).copied().unwrap_or(0)
    }

    /// How many requests for `url` ran to the end of their delay.
    pub fn served(&self, url: &str) -> usize {
        self.state.lock().unwrap().served.get(url).copied().unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.state.lock().unwrap().requests.values().sum()
    }

    pub fn last_headers(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().headers.clone()
    }
}

impl HttpClient for MockClient {
    type Error = MockError;

    fn stream(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<
        Output = std::result::Result<
            BoxStream<'static, std::result::Result<Bytes, MockError>>,
            MockError,
        >,
    > + Send {
        let route = {
            let mut state = self.state.lock().unwrap();
            *state.requests.entry(url.to_string()).or_default() += 1;
            state.headers = headers.to_vec();
            state.routes.get(url).cloned()
        };
        let state = Arc::clone(&self.state);
        let url = url.to_string();

        async move {
            let Some(route) = route else {
                return Err(MockError(format!("404 not found: {url}")));
            };
            if !route.delay.is_zero() {
                tokio::time::sleep(route.delay).await;
            }
            *state.lock().unwrap().served.entry(url).or_default() += 1;
            if let Some(message) = route.failure {
                return Err(MockError(message));
            }

            let split = route.body.len() / 2;
            let chunks = vec![
                Ok(route.body.slice(..split)),
                Ok(route.body.slice(split..)),
            ];
            let stream: BoxStream<'static, _> = Box::pin(futures_util::stream::iter(chunks));
            Ok(stream)
        }
    }
}

/// A feed body as understood by [`MockVerifier`]: `<fingerprint> <year> <label>`.
pub fn feed_body(fingerprint: &str, year: i32, label: &str) -> Bytes {
    Bytes::from(format!("{fingerprint} {year} {label}"))
}

/// Reads signatures out of bodies made by [`feed_body`]. Keys it does not
/// know yet give `MissingKey` signatures.
#[derive(Default)]
pub struct MockVerifier {
    known_keys: Mutex<HashSet<String>>,
}

impl MockVerifier {
    pub fn knowing(fingerprints: &[&str]) -> Self {
        Self {
            known_keys: Mutex::new(fingerprints.iter().map(|f| f.to_string()).collect()),
        }
    }

    pub fn learn(&self, fingerprint: &str) {
        self.known_keys.lock().unwrap().insert(fingerprint.to_string());
    }
}

impl SignatureVerifier for MockVerifier {
    fn verify(&self, _feed_url: &str, body: &[u8]) -> Result<Vec<Signature>> {
        let text = String::from_utf8_lossy(body);
        let mut words = text.split_whitespace();
        let (Some(fingerprint), Some(Ok(year))) = (words.next(), words.next().map(str::parse))
        else {
            return Ok(Vec::new());
        };
        let signed_at = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap();
        let mut signature = Signature::valid(fingerprint, signed_at);
        if !self.known_keys.lock().unwrap().contains(fingerprint) {
            signature.status = SignatureStatus::MissingKey;
        }
        Ok(vec![signature])
    }
}

/// Makes every missing key known, recording which key mirror was offered.
pub struct MockKeyFetcher {
    verifier: Arc<MockVerifier>,
    pub key_mirrors: Mutex<Vec<Option<String>>>,
}

impl MockKeyFetcher {
    pub fn new(verifier: Arc<MockVerifier>) -> Self {
        Self {
            verifier,
            key_mirrors: Mutex::new(Vec::new()),
        }
    }

    pub fn key_mirrors(&self) -> Vec<Option<String>> {
        self.key_mirrors.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeyFetcher for MockKeyFetcher {
    async fn download_keys(&self, pending: &PendingFeed, key_mirror: Option<&str>) -> Result<()> {
        self.key_mirrors
            .lock()
            .unwrap()
            .push(key_mirror.map(str::to_string));
        for signature in &pending.signatures {
            if signature.status == SignatureStatus::MissingKey {
                self.verifier.learn(&signature.fingerprint);
            }
        }
        Ok(())
    }
}

/// A handler that approves a fixed set of keys and records everything else.
#[derive(Default)]
pub struct RecordingHandler {
    approve: Vec<String>,
    pub confirmations: Mutex<Vec<Vec<String>>>,
    pub errors: Mutex<Vec<FetchError>>,
    pub added: Mutex<Vec<(String, PathBuf)>>,
}

impl RecordingHandler {
    pub fn approving(fingerprints: &[&str]) -> Self {
        Self {
            approve: fingerprints.iter().map(|f| f.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn errors(&self) -> Vec<FetchError> {
        self.errors.lock().unwrap().clone()
    }

    pub fn added(&self) -> Vec<(String, PathBuf)> {
        self.added.lock().unwrap().clone()
    }

    pub fn confirmations(&self) -> Vec<Vec<String>> {
        self.confirmations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Handler for RecordingHandler {
    async fn confirm_trust_keys(
        &self,
        _iface: &Interface,
        _pending: &PendingFeed,
        fingerprints: &[String],
    ) -> Result<Vec<String>> {
        self.confirmations.lock().unwrap().push(fingerprints.to_vec());
        Ok(fingerprints
            .iter()
            .filter(|f| self.approve.contains(f))
            .cloned()
            .collect())
    }

    fn impl_added_to_store(&self, implementation: &Implementation, path: &Path) {
        self.added
            .lock()
            .unwrap()
            .push((implementation.id.clone(), path.to_path_buf()));
    }

    fn report_error(&self, error: &FetchError) {
        self.errors.lock().unwrap().push(error.clone());
    }
}

/// A fetcher wired to mocks, with a store in a temporary directory.
pub struct Harness {
    pub client: MockClient,
    pub fetcher: Fetcher<MockClient>,
    pub store: Arc<DirStore>,
    pub cache: Arc<MemoryFeedCache>,
    pub verifier: Arc<MockVerifier>,
    pub key_fetcher: Arc<MockKeyFetcher>,
    pub handler: Arc<RecordingHandler>,
    _store_dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(
            FetcherConfig::default().feed_mirror(None),
            TrustDb::new(),
            MockVerifier::default(),
            RecordingHandler::default(),
        )
    }

    pub fn build(
        config: FetcherConfig,
        trust: TrustDb,
        verifier: MockVerifier,
        handler: RecordingHandler,
    ) -> Self {
        let store_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DirStore::new(store_dir.path()));
        let cache = Arc::new(MemoryFeedCache::with_trust(trust));
        let verifier = Arc::new(verifier);
        let key_fetcher = Arc::new(MockKeyFetcher::new(Arc::clone(&verifier)));
        let handler = Arc::new(handler);
        let client = MockClient::new();

        let ctx = FetchContext::new(
            store.clone(),
            cache.clone(),
            verifier.clone(),
            key_fetcher.clone(),
            handler.clone(),
        );
        let fetcher = Fetcher::new(client.clone(), ctx, config);

        Self {
            client,
            fetcher,
            store,
            cache,
            verifier,
            key_fetcher,
            handler,
            _store_dir: store_dir,
        }
    }

    pub fn store_root(&self) -> &Path {
        self.store.root()
    }

    /// Entries left in the store's staging area.
    pub fn leftover_staging(&self) -> usize {
        match std::fs::read_dir(self.store_root().join(".tmp")) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }
}

/// A gzipped tarball of regular files.
pub fn tar_gz(files: &[(&str, &str)]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_mode(0o644);
        header.set_size(content.len() as u64);
        builder.append_data(&mut header, path, content.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// A gzipped tarball holding a single directory entry.
pub fn tar_gz_dir(path: &str) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Directory);
    header.set_mode(0o755);
    header.set_size(0);
    builder.append_data(&mut header, path, std::io::empty()).unwrap();
    builder.into_inner().unwrap().finish().unwrap()
}

/// The digest of unpacking `archives` over each other, in order.
pub fn digest_of(archives: &[(&str, &[u8])]) -> ImplDigest {
    let dir = tempfile::tempdir().unwrap();
    for (url, body) in archives {
        unpack_archive_over(url, Cursor::new(body), dir.path(), &UnpackOptions::default()).unwrap();
    }
    ImplDigest::new(
        Algorithm::Sha256,
        manifest_digest(dir.path(), Algorithm::Sha256).unwrap(),
    )
}

/// A gzipped tarball holding a single symlink.
pub fn tar_gz_symlink(path: &str, target: &str) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Symlink);
    header.set_size(0);
    builder.append_link(&mut header, path, target).unwrap();
    builder.into_inner().unwrap().finish().unwrap()
}
