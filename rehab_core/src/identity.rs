//! User registration and authentication.
//!
//! Passwords are stored as bcrypt hashes. [`IdentityProvider`] answers
//! "who is the caller" for every authenticated operation.

use crate::store::RecordStore;
use crate::{Error, Result, User, UserProfile};
use uuid::Uuid;

/// Username/password pair presented by a caller
#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Resolves caller credentials to an authenticated user
pub trait IdentityProvider {
    fn authenticate(&self, credentials: &Credentials) -> Result<UserProfile>;
}

/// Identity provider backed by the users table of a record store
pub struct StoreIdentity<'a, S> {
    store: &'a S,
}

impl<'a, S: RecordStore> StoreIdentity<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }
}

impl<S: RecordStore> IdentityProvider for StoreIdentity<'_, S> {
    fn authenticate(&self, credentials: &Credentials) -> Result<UserProfile> {
        let user = self
            .store
            .read(|tables| Ok(tables.user_by_name(&credentials.username).cloned()))?;

        // Same error for unknown user and wrong password
        let invalid = || Error::Unauthorized("invalid credentials".into());
        let user = user.ok_or_else(invalid)?;

        if !bcrypt::verify(&credentials.password, &user.password_hash)? {
            tracing::warn!("Failed login for '{}'", credentials.username);
            return Err(invalid());
        }

        tracing::debug!("Authenticated '{}'", user.username);
        Ok(UserProfile::from(&user))
    }
}

/// Register a new user
pub fn register<S: RecordStore>(
    store: &S,
    username: &str,
    password: &str,
    bcrypt_cost: u32,
) -> Result<UserProfile> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::Validation("username must not be empty".into()));
    }
    if password.is_empty() {
        return Err(Error::Validation("password must not be empty".into()));
    }

    // Hash outside the lock; bcrypt is deliberately slow
    let password_hash = bcrypt::hash(password, bcrypt_cost)?;

    store.transaction(|tables| {
        if tables.user_by_name(username).is_some() {
            return Err(Error::AlreadyExists(format!("Username '{}'", username)));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
        };
        let profile = UserProfile::from(&user);
        tables.users.insert(user.id, user);

        tracing::info!("Registered user '{}' ({})", profile.username, profile.id);
        Ok(profile)
    })
}

/// Replace a user's password
///
/// Succeeds whether or not the user exists, so callers cannot probe for
/// registered usernames.
pub fn reset_password<S: RecordStore>(
    store: &S,
    username: &str,
    new_password: &str,
    bcrypt_cost: u32,
) -> Result<()> {
    if new_password.is_empty() {
        return Err(Error::Validation("password must not be empty".into()));
    }
    let password_hash = bcrypt::hash(new_password, bcrypt_cost)?;

    store.transaction(|tables| {
        let user = tables.users.values_mut().find(|u| u.username == username);
        match user {
            Some(user) => {
                user.password_hash = password_hash;
                tracing::info!("Password reset for '{}'", username);
            }
            None => tracing::debug!("Password reset requested for unknown user"),
        }
        Ok(())
    })
}
