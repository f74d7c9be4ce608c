use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed landmarks: expected at least {expected} points, got {actual}")]
    MalformedLandmarks { expected: usize, actual: usize },

    #[error("no binding for channel '{channel}' in asset {asset_id}")]
    BindingNotFound { channel: String, asset_id: u64 },

    #[error("no scene graph attached")]
    SceneUnavailable,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("recording deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
