use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no creator registered for kind {0:?}")]
    UnknownKind(String),

    #[error("creating {name:?} failed: {source}")]
    Create {
        name: String,
        #[source]
        source: objreg_creators::CreateError,
    },

    #[error("registry rejected object {0:?}")]
    Rejected(String),

    #[error("type error: {0}")]
    Type(#[from] objreg_types::TypeError),

    #[error("creator error: {0}")]
    Creator(#[from] objreg_creators::CreatorError),

    #[error("stream error: {0}")]
    Persist(#[from] objreg_persist::PersistError),
}

pub type SdkResult<T> = Result<T, SdkError>;
