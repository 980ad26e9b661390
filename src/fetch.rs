use std::io::Read;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use log::info;

use crate::error::FetchError;
use crate::texture::Texture;

pub trait ImageSource: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> Result<RgbaImage, FetchError>;
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking HTTP GET, no retries. Only connecting is bounded by a timeout;
/// a stalled transfer blocks until the server gives up.
pub struct HttpImageSource {
    agent: ureq::Agent,
    size: u32,
}

impl HttpImageSource {
    pub fn new(size: u32) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(CONNECT_TIMEOUT)
                .build(),
            size,
        }
    }
}

impl ImageSource for HttpImageSource {
    fn fetch(&self, url: &str) -> Result<RgbaImage, FetchError> {
        let network = |source: Box<dyn std::error::Error + Send + Sync>| FetchError::Network {
            url: url.to_owned(),
            source,
        };

        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|err| network(Box::new(err)))?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|err| network(Box::new(err)))?;

        decode(&bytes, self.size)
    }
}

pub fn decode(bytes: &[u8], size: u32) -> Result<RgbaImage, FetchError> {
    let image = image::load_from_memory(bytes)?.to_rgba8();

    if image.dimensions() == (size, size) {
        return Ok(image);
    }

    Ok(imageops::resize(&image, size, size, FilterType::Triangle))
}

/// Runs fetches on a worker thread so the frame loop keeps going. At most
/// one fetch is in flight.
pub struct BackgroundLoader<S> {
    source: Arc<S>,
    pending: Option<Receiver<Result<RgbaImage, FetchError>>>,
}

impl<S: ImageSource> BackgroundLoader<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self {
            source,
            pending: None,
        }
    }

    /// Start fetching `url`. Returns false if a fetch is already running.
    pub fn request(&mut self, url: &str) -> bool {
        if self.pending.is_some() {
            return false;
        }

        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let url = url.to_owned();

        info!("refreshing background from {url}");

        thread::spawn(move || {
            let result = source.fetch(&url);

            // The receiver is gone only if the app already shut down.
            let _ = tx.send(result);
        });

        self.pending = Some(rx);
        true
    }

    pub fn in_flight(&self) -> bool {
        self.pending.is_some()
    }

    pub fn poll(&mut self) -> Option<Result<Texture, FetchError>> {
        let rx = self.pending.as_ref()?;

        let result = match rx.try_recv() {
            Ok(result) => result.map(|image| Texture::from_rgba(&image)),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(FetchError::Disconnected),
        };

        self.pending = None;
        Some(result)
    }
}
