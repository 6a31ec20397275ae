use chrono::{NaiveDate, Utc};

use crate::{
    db::Storage,
    error::{AppError, AppResult},
    models::{NewUser, User, UserId},
};

/// Checks a user payload against the registration rules
pub fn validate_user(user: &NewUser, today: NaiveDate) -> AppResult<()> {
    if user.email.trim().is_empty() || !user.email.contains('@') {
        return Err(AppError::InvalidInput(
            "Email must be a valid address".to_string(),
        ));
    }
    if user.login.is_empty() || user.login.chars().any(char::is_whitespace) {
        return Err(AppError::InvalidInput(
            "Login must be non-empty and contain no whitespace".to_string(),
        ));
    }
    if user.birthday > today {
        return Err(AppError::InvalidInput(
            "Birthday cannot be in the future".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_user(storage: &dyn Storage, user: NewUser) -> AppResult<User> {
    validate_user(&user, Utc::now().date_naive())?;
    let user = storage.insert_user(user).await?;

    tracing::info!(user_id = %user.id, login = %user.login, "User created");

    Ok(user)
}

pub async fn update_user(storage: &dyn Storage, id: UserId, user: NewUser) -> AppResult<User> {
    validate_user(&user, Utc::now().date_naive())?;
    let user = storage.update_user(id, user).await?;

    tracing::info!(user_id = %user.id, "User updated");

    Ok(user)
}
