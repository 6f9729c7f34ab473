//! Local account management. One device, one user catalog, one session blob.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::auth::password::{
    hash_password_blocking, validate_email, validate_new_password, verify_password_blocking,
};
use crate::errors::AppError;
use crate::models::user::{AuthState, StoredUser, User, UserPreferences};
use crate::storage::Repository;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub accept_terms: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Fields left out keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub preferences: Option<UserPreferences>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

fn same_email(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn require_name(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("Le champ '{field}' est requis")));
    }
    Ok(())
}

/// The signed-in user, or `Unauthorized`.
pub async fn current_user(repo: &Repository) -> Result<User, AppError> {
    match repo.load_session().await? {
        AuthState {
            is_authenticated: true,
            user: Some(user),
            ..
        } => Ok(user),
        _ => Err(AppError::Unauthorized),
    }
}

/// Creates the account and signs it in.
pub async fn register(repo: &Repository, req: RegisterRequest) -> Result<AuthState, AppError> {
    require_name(&req.first_name, "firstName")?;
    require_name(&req.last_name, "lastName")?;
    validate_email(&req.email)?;
    validate_new_password(&req.password, &req.confirm_password)?;
    if !req.accept_terms {
        return Err(AppError::Validation(
            "Vous devez accepter les conditions d'utilisation".to_string(),
        ));
    }

    let password_hash = hash_password_blocking(req.password).await?;
    let mut user = User::new(&req.first_name, &req.last_name, &req.email);
    user.last_login = Some(Utc::now());

    let stored = StoredUser {
        user: user.clone(),
        password_hash,
    };
    repo.update_users(move |users| {
        if users.iter().any(|u| same_email(&u.user.email, &stored.user.email)) {
            return Err(AppError::Conflict(
                "Un compte avec cet email existe déjà".to_string(),
            ));
        }
        users.push(stored);
        Ok(())
    })
    .await?;

    let session = AuthState {
        is_authenticated: true,
        user: Some(user),
        remember_me: false,
    };
    repo.save_session(&session).await?;
    info!("Registered a new local account");
    Ok(session)
}

/// Unknown email and wrong password fail the same way.
pub async fn login(repo: &Repository, req: LoginRequest) -> Result<AuthState, AppError> {
    let users = repo.load_users().await?;
    let stored = users
        .into_iter()
        .find(|u| same_email(&u.user.email, &req.email))
        .ok_or(AppError::InvalidCredentials)?;
    if !verify_password_blocking(req.password, stored.password_hash).await? {
        return Err(AppError::InvalidCredentials);
    }

    let id = stored.user.id;
    let now = Utc::now();
    let user = repo
        .update_users(move |users| {
            let entry = users
                .iter_mut()
                .find(|u| u.user.id == id)
                .ok_or(AppError::InvalidCredentials)?;
            entry.user.last_login = Some(now);
            Ok(entry.user.clone())
        })
        .await?;

    let session = AuthState {
        is_authenticated: true,
        user: Some(user),
        remember_me: req.remember_me,
    };
    repo.save_session(&session).await?;
    Ok(session)
}

pub async fn logout(repo: &Repository) -> Result<(), AppError> {
    repo.clear_session().await
}

/// Applies the update to the catalog entry and the session copy alike.
pub async fn update_profile(repo: &Repository, update: ProfileUpdate) -> Result<User, AppError> {
    let current = current_user(repo).await?;
    if let Some(first) = &update.first_name {
        require_name(first, "firstName")?;
    }
    if let Some(last) = &update.last_name {
        require_name(last, "lastName")?;
    }
    if let Some(email) = &update.email {
        validate_email(email)?;
    }

    let id = current.id;
    let user = repo
        .update_users(move |users| {
            if let Some(email) = &update.email {
                if users
                    .iter()
                    .any(|u| u.user.id != id && same_email(&u.user.email, email))
                {
                    return Err(AppError::Conflict(
                        "Un compte avec cet email existe déjà".to_string(),
                    ));
                }
            }
            let entry = users
                .iter_mut()
                .find(|u| u.user.id == id)
                .ok_or(AppError::Unauthorized)?;
            if let Some(first) = update.first_name {
                entry.user.first_name = first.trim().to_string();
            }
            if let Some(last) = update.last_name {
                entry.user.last_name = last.trim().to_string();
            }
            if let Some(email) = update.email {
                entry.user.email = email.trim().to_lowercase();
            }
            if let Some(prefs) = update.preferences {
                entry.user.preferences = prefs;
            }
            Ok(entry.user.clone())
        })
        .await?;

    let mut session = repo.load_session().await?;
    session.user = Some(user.clone());
    repo.save_session(&session).await?;
    Ok(user)
}

/// Requires the current password.
pub async fn change_password(repo: &Repository, req: PasswordChange) -> Result<(), AppError> {
    let current = current_user(repo).await?;
    validate_new_password(&req.new_password, &req.confirm_password)?;

    let stored_hash = repo
        .load_users()
        .await?
        .into_iter()
        .find(|u| u.user.id == current.id)
        .map(|u| u.password_hash)
        .ok_or(AppError::Unauthorized)?;
    if !verify_password_blocking(req.current_password, stored_hash).await? {
        return Err(AppError::InvalidCredentials);
    }

    let new_hash = hash_password_blocking(req.new_password).await?;
    let id = current.id;
    repo.update_users(move |users| {
        let entry = users
            .iter_mut()
            .find(|u| u.user.id == id)
            .ok_or(AppError::Unauthorized)?;
        entry.password_hash = new_hash;
        Ok(())
    })
    .await?;
    info!("Password changed for user {id}");
    Ok(())
}

/// Removes the user from the catalog and drops their CV, letters and session.
pub async fn delete_account(repo: &Repository) -> Result<(), AppError> {
    let current = current_user(repo).await?;
    repo.update_users(|users| {
        users.retain(|u| u.user.id != current.id);
        Ok(())
    })
    .await?;
    repo.purge_user_data().await?;
    info!("Deleted account {}", current.id);
    Ok(())
}

/// Checks that an account exists for `email`. No message is sent from a
/// local install; the caller only learns whether the address is known.
pub async fn reset_password(repo: &Repository, email: &str) -> Result<(), AppError> {
    let known = repo
        .load_users()
        .await?
        .iter()
        .any(|u| same_email(&u.user.email, email));
    if !known {
        return Err(AppError::NotFound(
            "Aucun compte trouvé avec cet email".to_string(),
        ));
    }
    info!("Password reset requested for a known account");
    Ok(())
}
