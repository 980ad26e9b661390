use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to fetch image from {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image loader stopped without a result")]
    Disconnected,
}
