use actix_web::HttpRequest;
use diesel::sqlite::SqliteConnection;

use crate::{app::AppError, database::models::user::User};

/// Header carrying the pre-shared key of the caller
pub const API_KEY_HEADER: &str = "api-key";

/// Pulls the api key out of the request headers.
/// A missing or unreadable header is treated like a wrong key.
pub fn api_key(req: &HttpRequest) -> Result<String, AppError> {
    req.headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(AppError::UnauthorizedError)
}

/// Resolves an api key to its user, any key that was never issued gives `UnauthorizedError`.
///
/// # Example
/// ```
/// let key = auth::api_key(&req)?;
/// let user = unit_of_work(&app_state.pool, move |conn| authenticate(conn, &key)).await?;
/// ```
pub fn authenticate(conn: &mut SqliteConnection, key: &str) -> Result<User, AppError> {
    User::find_by_api_key(conn, key)?.ok_or(AppError::UnauthorizedError)
}
