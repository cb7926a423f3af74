use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::UserRepo,
        repo_types::{NewUser, User},
    },
    error::AppError,
};

pub const MIN_USERNAME_CHARS: usize = 2;
pub const MIN_PASSWORD_CHARS: usize = 6;

lazy_static! {
    // Argon2 hash of a throwaway secret, with the same parameters as real hashes.
    static ref DECOY_HASH: Option<String> = hash_password("decoy-password-never-issued").ok();
}

/// Computes the decoy hash up front so the first rejected login does not
/// pay for hashing on top of verification.
pub fn prime_decoy_hash() {
    lazy_static::initialize(&DECOY_HASH);
}

/// Pays for one Argon2 verification when there is no stored hash to check,
/// so rejections for unknown or soft-deleted users cost as much as a wrong
/// password. Returns whether a verification ran.
fn verify_against_decoy(password: &str) -> bool {
    match DECOY_HASH.as_deref() {
        Some(hash) => {
            let _ = verify_password(password, hash);
            true
        }
        None => {
            error!("decoy hash unavailable; login rejection timing is not equalized");
            false
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Collects every problem with a registration payload instead of stopping at
/// the first one.
pub fn validate_registration(req: &RegisterRequest) -> Result<(), AppError> {
    let mut messages = Vec::new();
    if req.username.trim().chars().count() < MIN_USERNAME_CHARS {
        messages.push(format!(
            "Username must be at least {MIN_USERNAME_CHARS} characters."
        ));
    }
    if !is_valid_email(&normalize_email(&req.email)) {
        messages.push("Please enter a valid email address.".into());
    }
    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        messages.push(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters."
        ));
    }
    if messages.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(messages))
    }
}

pub async fn register_user(users: &dyn UserRepo, req: RegisterRequest) -> Result<User, AppError> {
    validate_registration(&req)?;
    let email = normalize_email(&req.email);

    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("Email already registered."));
    }

    let hash = hash_password(&req.password)?;
    let created = users
        .create(NewUser {
            email: &email,
            username: req.username.trim(),
            password_hash: &hash,
        })
        .await?;

    match created {
        Some(user) => {
            info!(user_id = %user.id, email = %user.email, "user registered");
            Ok(user)
        }
        None => {
            warn!(email = %email, "email registered concurrently");
            Err(AppError::Conflict("Email already registered."))
        }
    }
}

/// Resolves credentials to an active user. Unknown email, soft-deleted user
/// and wrong password all yield the same error; only the log tells them apart.
pub async fn authenticate(
    users: &dyn UserRepo,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let email = normalize_email(email);

    let user = match users.find_by_email(&email).await? {
        Some(u) if u.is_active() => u,
        Some(u) => {
            verify_against_decoy(password);
            warn!(user_id = %u.id, reason = "soft_deleted", "login rejected");
            return Err(AppError::InvalidCredentials);
        }
        None => {
            verify_against_decoy(password);
            warn!(email = %email, reason = "unknown_email", "login rejected");
            return Err(AppError::InvalidCredentials);
        }
    };

    let ok = match verify_password(password, &user.password_hash) {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, user_id = %user.id, "verify_password failed");
            return Err(AppError::Internal(e));
        }
    };

    if !ok {
        warn!(user_id = %user.id, reason = "wrong_password", "login rejected");
        return Err(AppError::InvalidCredentials);
    }

    Ok(user)
}

/// Authenticates and signs an access token for the user.
pub async fn login(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    req: &LoginRequest,
) -> Result<String, AppError> {
    let user = authenticate(users, &req.email, &req.password).await?;
    let token = keys.sign(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(token)
}
