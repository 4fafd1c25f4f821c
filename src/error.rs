use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodesimError {
    #[error("File not found: {0}")]
    MissingFile(String),

    #[error("Please select both files")]
    EmptyFilename,

    #[error("Invalid file type '{filename}'. Allowed: {allowed}")]
    DisallowedExtension { filename: String, allowed: String },

    #[error("File extensions must match. Got: .{first} and .{second}")]
    MismatchedExtensions { first: String, second: String },

    #[error("File '{filename}' is {size} bytes, over the {limit} byte limit")]
    FileTooLarge {
        filename: String,
        size: u64,
        limit: u64,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CodesimError {
    /// True for errors caused by what the caller submitted rather than by
    /// something failing inside the tool.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingFile(_)
                | Self::EmptyFilename
                | Self::DisallowedExtension { .. }
                | Self::MismatchedExtensions { .. }
                | Self::FileTooLarge { .. }
        )
    }
}

pub type CodesimResult<T> = Result<T, CodesimError>;
