use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while describing a stack.
/// All of these are fatal: a stack is either fully described or not at all.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid domain name {name:?}\n{reason}")]
    InvalidDomainName { name: String, reason: String },

    #[error("Invalid bucket name {name:?}\n{reason}")]
    InvalidBucketName { name: String, reason: String },

    #[error("Invalid resource name {name:?}\n{reason}")]
    InvalidResourceName { name: String, reason: String },

    #[error("Invalid stack name {name:?}\n{reason}")]
    InvalidStackName { name: String, reason: String },

    #[error("Invalid region code {0:?}\nMust be one of {1:?}")]
    InvalidRegion(String, &'static [&'static str]),

    #[error("Invalid account id {0:?}\nMust be exactly 12 digits")]
    InvalidAccount(String),

    #[error("Duplicate logical id '{0}'. Every resource in a stack must have a unique name")]
    DuplicateLogicalId(String),

    #[error("Validation failed on resource '{resource}'\n{reason}")]
    Validation { resource: String, reason: String },

    #[error("{construct}: {reason}")]
    Construct { construct: &'static str, reason: String },

    #[error("No hosted zone found for {domain}. Register the domain in Route 53 first, which creates its hosted zone")]
    HostedZoneNotFound { domain: String },

    #[error("Failed to serialize template\n{0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("AWS request failed\n{0}")]
    Aws(String),
}

impl Error {
    pub fn construct(construct: &'static str, reason: impl Into<String>) -> Self {
        Error::Construct { construct, reason: reason.into() }
    }
}
