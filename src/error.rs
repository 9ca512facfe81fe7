//! Errors raised while loading scenes and writing images
//!
//! Geometric degeneracies (misses, absorbed rays) are not errors; they are `None` results of
//! the hit and scatter queries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scene description error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed PPM data: {0}")]
    Ppm(String),
}

pub type Result<T> = std::result::Result<T, Error>;
