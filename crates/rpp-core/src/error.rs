//! Error types for the RPP registry backend
//!
//! Every engine signals failures as variants of [`Error`] rather than raw
//! store errors. The router maps each variant to a fixed HTTP status code
//! and a short `status_message`; the [`std::fmt::Display`] text becomes the
//! `result` field of the response envelope.

use thiserror::Error;

use crate::traits::registry_store::StoreError;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a not-yet-registered name is refused registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unregisterable {
    /// First label is shorter than two characters
    LabelTooShort,
    /// First label starts with a zero
    LeadingZero,
}

impl std::fmt::Display for Unregisterable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LabelTooShort => write!(f, "Domains must be at least two characters"),
            Self::LeadingZero => write!(f, "Domains must not start with a zero"),
        }
    }
}

/// Core error taxonomy for the registry
///
/// One variant per failure mode named in the protocol contract. Variants
/// carry whatever the wire message needs (usually the resource name).
#[derive(Error, Debug)]
pub enum Error {
    /// The domain name is already taken
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// The resource does not exist
    #[error("{0} does not exist")]
    DoesNotExist(String),

    /// A lookup target does not exist (read-path wording)
    #[error("{0} NOT found")]
    NotFound(String),

    /// The resource is a reserved registry record and cannot be deleted
    #[error("{0} cannot be deleted")]
    Immutable(String),

    /// The domain quota has been reached
    #[error("Too many domains already")]
    TooManyDomains,

    /// The contact quota has been reached
    #[error("Too many contacts already")]
    TooManyContacts,

    /// The store detected a serialization/isolation violation
    #[error("Internal conflict")]
    Conflict,

    /// The request body did not decode against the expected schema
    #[error("Invalid JSON body ({detail}) for {target}")]
    SchemaValidation { target: String, detail: String },

    /// The request body was not JSON at all
    #[error("Invalid JSON body for {0}")]
    MalformedBody(String),

    /// The request carried no body where one is required
    #[error("No JSON body to {0}")]
    EmptyBody(String),

    /// No usable credentials were presented
    #[error("You must authenticate {0}")]
    Unauthenticated(String),

    /// Credentials were presented but did not verify
    #[error("You must authenticate properly")]
    WrongCredentials,

    /// The caller is not the sponsoring registrar of the domain
    #[error("You ({caller}) are not the registrar of {domain} ({owner})")]
    NotOwner {
        caller: u32,
        domain: String,
        owner: u32,
    },

    /// The caller did not initiate the pending transfer
    #[error("This is not your transfer")]
    NotYourTransfer,

    /// The caller is not the current registrar of the transferred domain
    #[error("This is not your domain currently")]
    NotCurrentRegistrar,

    /// No pending transfer exists for the domain
    #[error("No pending transfer of {0} to act on")]
    NoPendingTransfer(String),

    /// The domain name is not under the registry's top-level label
    #[error("Domain name must be under .{0}")]
    NotUnderTld(String),

    /// The name fails the registerability rule
    #[error("Domain {name} cannot be registered because {reason}")]
    NotRegisterable { name: String, reason: Unregisterable },

    /// The HTTP method is not supported for the target resource
    #[error("Method {method} not supported{context}")]
    UnsupportedMethod { method: String, context: String },

    /// The path names an unknown domain sub-operation
    #[error("Unknown operation {operation} for domain {domain}")]
    UnknownOperation { operation: String, domain: String },

    /// The transfer sub-action is not one of cancelation/approval/rejection
    #[error("Unknown transfer extra command {0}")]
    UnknownTransferAction(String),

    /// The path has too many or empty segments
    #[error("Invalid path syntax for {0}")]
    InvalidPath(String),

    /// The path does not start with a known resource prefix
    #[error("Path must start with /domains, /entities or be /list-domains")]
    BadPathPrefix,

    /// Unexpected internal failure
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Create an unsupported-method error without extra context
    pub fn method(method: impl Into<String>) -> Self {
        Self::UnsupportedMethod {
            method: method.into(),
            context: String::new(),
        }
    }

    /// Create an unsupported-method error scoped to a resource
    pub fn method_for(method: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UnsupportedMethod {
            method: method.into(),
            context: format!(" {}", context.into()),
        }
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The HTTP status code the router answers with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::AlreadyExists(_) => 412,
            Self::DoesNotExist(_) | Self::NotFound(_) => 404,
            Self::Immutable(_) => 423,
            Self::TooManyDomains | Self::TooManyContacts => 400,
            Self::Conflict | Self::Internal(_) => 500,
            Self::SchemaValidation { .. } | Self::MalformedBody(_) | Self::EmptyBody(_) => 400,
            Self::Unauthenticated(_) | Self::WrongCredentials => 401,
            Self::NotOwner { .. } | Self::NotYourTransfer | Self::NotCurrentRegistrar => 403,
            Self::NoPendingTransfer(_) => 404,
            Self::NotUnderTld(_) | Self::NotRegisterable { .. } => 400,
            Self::UnsupportedMethod { .. } => 405,
            Self::UnknownOperation { .. } | Self::UnknownTransferAction(_) => 400,
            Self::InvalidPath(_) | Self::BadPathPrefix => 400,
        }
    }

    /// The short status message carried next to the status code
    pub fn status_message(&self) -> String {
        match self {
            Self::AlreadyExists(_) => "Exists".to_string(),
            Self::DoesNotExist(_) | Self::NotFound(_) => "Not found".to_string(),
            Self::Immutable(_) => "Immutable".to_string(),
            Self::TooManyDomains | Self::TooManyContacts => "Too many".to_string(),
            Self::Conflict => "Conflict".to_string(),
            Self::Internal(_) => "Internal error".to_string(),
            Self::SchemaValidation { .. } => "Invalid JSON".to_string(),
            Self::MalformedBody(_) => "Invalid".to_string(),
            Self::EmptyBody(_) => "Empty".to_string(),
            Self::Unauthenticated(_) => "Unauthenticated".to_string(),
            Self::WrongCredentials => "Wrong password".to_string(),
            Self::NotOwner { .. } => "Forbidden".to_string(),
            Self::NotYourTransfer | Self::NotCurrentRegistrar => "Not yours".to_string(),
            Self::NoPendingTransfer(_) => "No transfer".to_string(),
            Self::NotUnderTld(tld) => format!("Domain name must be under .{tld}"),
            Self::NotRegisterable { .. } => "Invalid".to_string(),
            Self::UnsupportedMethod { method, context } => {
                format!("Method {method} not supported{context}")
            }
            Self::UnknownOperation { .. } => "Unknown operation".to_string(),
            Self::UnknownTransferAction(_) => "Unknown transfer extra command".to_string(),
            Self::InvalidPath(_) => "Invalid path syntax".to_string(),
            Self::BadPathPrefix => {
                "Path must start with /domains, /entities or be /list-domains".to_string()
            }
        }
    }
}

/// Store failures the engines did not handle explicitly surface as internal
/// errors; conflicts keep their own variant so the client knows to retry.
impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::Conflict,
            StoreError::AlreadyExists => Self::Internal("Unexpected duplicate row".to_string()),
            StoreError::Backend(msg) => Self::Internal(msg),
        }
    }
}
