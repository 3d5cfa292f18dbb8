use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Registry at {url} does not speak the V2 API (status {status})")]
    VersionCheck { url: String, status: StatusCode },

    #[error("Registry API error: {context} returned status {status}: {body}")]
    RegistryApi {
        context: String,
        status: StatusCode,
        body: String,
    },

    #[error("Missing Docker-Content-Digest header for {image}:{tag}")]
    MissingDigest { image: String, tag: String },

    #[error("Error while deleting {image}:{tag}: HTTP code {status}")]
    DeleteRejected {
        image: String,
        tag: String,
        status: StatusCode,
    },
}
