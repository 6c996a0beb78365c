use thiserror::Error;

/// Failures inside a single provider round trip.
///
/// None of these leave the adapter: [`crate::ResponseProviderAdapter::request`]
/// logs them and answers with zero replies.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider credential is not configured")]
    MissingCredential,

    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("provider returned an empty body")]
    EmptyBody,

    #[error("provider payload rejected ({bytes} bytes): {reason}")]
    Validation { reason: String, bytes: usize },
}

/// Rejections of a user-authored message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyMessage,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("an account with this email already exists")]
    AlreadyRegistered,

    #[error("user not found, please sign up")]
    NotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("avatar image is {0} bytes, the limit is {limit}", limit = crate::identity::MAX_AVATAR_BYTES)]
    AvatarTooLarge(usize),

    #[error("avatar image is not a base64 data URL")]
    InvalidAvatar,

    #[error("password hashing failed: {0}")]
    Hash(String),
}
