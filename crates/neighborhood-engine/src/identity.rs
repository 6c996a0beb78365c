use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use tracing::info;
use uuid::Uuid;

use neighborhood_types::models::User;

use crate::error::IdentityError;

/// Largest accepted decoded avatar image.
pub const MAX_AVATAR_BYTES: usize = 500_000;

/// A registered user and their password hash.
#[derive(Debug, Clone)]
pub struct Account {
    pub user: User,
    pub password_hash: String,
}

/// Long-lived account storage, keyed by normalized email.
pub trait IdentityStore: Send + Sync {
    fn get_by_key(&self, key: &str) -> Option<Account>;
    fn put(&self, key: &str, account: Account);
}

#[derive(Default)]
pub struct InMemoryIdentityStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn get_by_key(&self, key: &str) -> Option<Account> {
        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        accounts.get(key).cloned()
    }

    fn put(&self, key: &str, account: Account) {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        accounts.insert(key.to_string(), account);
    }
}

pub fn account_key(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create an account and return its user.
pub fn register(
    store: &dyn IdentityStore,
    username: &str,
    email: &str,
    password: &str,
) -> Result<User, IdentityError> {
    let username = required("username", username)?;
    let email = required("email", email)?;
    if password.trim().is_empty() {
        return Err(IdentityError::MissingField("password"));
    }

    let key = account_key(email);
    if store.get_by_key(&key).is_some() {
        return Err(IdentityError::AlreadyRegistered);
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| IdentityError::Hash(e.to_string()))?
        .to_string();

    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: email.to_string(),
        avatar_color: random_avatar_color(),
        avatar_image: None,
        bio: None,
    };
    store.put(
        &key,
        Account {
            user: user.clone(),
            password_hash,
        },
    );

    info!("Registered {} ({})", user.username, user.id);
    Ok(user)
}

/// Check credentials and return the stored user.
pub fn authenticate(
    store: &dyn IdentityStore,
    email: &str,
    password: &str,
) -> Result<User, IdentityError> {
    let account = store
        .get_by_key(&account_key(email))
        .ok_or(IdentityError::NotFound)?;

    let parsed_hash = PasswordHash::new(&account.password_hash)
        .map_err(|e| IdentityError::Hash(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| IdentityError::InvalidCredentials)?;

    Ok(account.user)
}

/// Apply profile edits for `current` and write them back to the store.
pub fn update_profile(
    store: &dyn IdentityStore,
    current: &User,
    username: &str,
    bio: Option<String>,
    avatar_image: Option<String>,
) -> Result<User, IdentityError> {
    let username = required("username", username)?;
    if let Some(image) = avatar_image.as_deref() {
        validate_avatar(image)?;
    }

    let updated = User {
        username: username.to_string(),
        bio: bio.map(|b| b.trim().to_string()).filter(|b| !b.is_empty()),
        avatar_image,
        ..current.clone()
    };

    let key = account_key(&current.email);
    if let Some(mut account) = store.get_by_key(&key) {
        account.user = updated.clone();
        store.put(&key, account);
    }

    Ok(updated)
}

/// Accepts `data:image/<type>;base64,<payload>` with a decoded payload of at
/// most [`MAX_AVATAR_BYTES`].
pub fn validate_avatar(data_url: &str) -> Result<(), IdentityError> {
    let (header, payload) = data_url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or(IdentityError::InvalidAvatar)?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or(IdentityError::InvalidAvatar)?;
    if !mime.starts_with("image/") {
        return Err(IdentityError::InvalidAvatar);
    }

    let bytes = B64.decode(payload).map_err(|_| IdentityError::InvalidAvatar)?;
    if bytes.len() > MAX_AVATAR_BYTES {
        return Err(IdentityError::AvatarTooLarge(bytes.len()));
    }
    Ok(())
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, IdentityError> {
    let value = value.trim();
    if value.is_empty() {
        Err(IdentityError::MissingField(field))
    } else {
        Ok(value)
    }
}

fn random_avatar_color() -> String {
    format!("#{:06x}", rand::random::<u32>() & 0x00ff_ffff)
}
