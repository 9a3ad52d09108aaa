pub mod config;

use std::{fmt::Display, num::ParseIntError, sync::Arc};

use actix_web::{error::BlockingError, http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

use crate::database::db_utils::{connect_to_db, DbPool};
use config::Config;

/** Used for storing the database pool and settings when handling requests */
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            config: self.config.clone(),
        }
    }
}

impl AppState {
    /// Opens the database described by `config`, applies the schema and makes
    /// sure the upload folder exists.
    pub fn new(config: Config) -> Result<AppState, AppError> {
        let pool = connect_to_db(&config.database_url, config.pool_size)?;
        std::fs::create_dir_all(&config.upload_folder)?;

        Ok(AppState {
            pool,
            config: Arc::new(config),
        })
    }
}

/** Holds the errors we will used during request processing */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    UnauthorizedError,
    NotFound(&'static str),
    InvalidInput(&'static str),
    FollowError(&'static str),
    InternalServerError,
}

impl AppError {
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::UnauthorizedError => "Unauthorized",
            AppError::NotFound(_) => "NotFound",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::FollowError(_) => "FollowError",
            AppError::InternalServerError => "InternalServerError",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    result: bool,
    error_type: &'static str,
    error_message: String,
}

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::UnauthorizedError => f.write_str("Invalid api-key"),
            AppError::NotFound(msg) | AppError::InvalidInput(msg) | AppError::FollowError(msg) => {
                f.write_str(msg)
            }
            AppError::InternalServerError => f.write_str("Internal server error"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnauthorizedError => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) | AppError::InvalidInput(_) | AppError::FollowError(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            result: false,
            error_type: self.error_type(),
            error_message: self.to_string(),
        })
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => AppError::NotFound("Record not found."),
            other => {
                log::error!("Database error: {}", other);
                AppError::InternalServerError
            }
        }
    }
}
impl From<diesel::r2d2::PoolError> for AppError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        log::error!("Connection pool error: {}", err);
        AppError::InternalServerError
    }
}
impl From<BlockingError> for AppError {
    fn from(err: BlockingError) -> Self {
        log::error!("Blocking task failed: {}", err);
        AppError::InternalServerError
    }
}
impl From<ParseIntError> for AppError {
    fn from(_: ParseIntError) -> Self {
        AppError::InvalidInput("Invalid identifier")
    }
}
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            serde_json::error::Category::Io => {
                log::error!("Serialization error: {}", err);
                AppError::InternalServerError
            }
            _ => AppError::InvalidInput("Invalid request body"),
        }
    }
}
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound("File not found"),
            _ => {
                log::error!("IO error: {}", err);
                AppError::InternalServerError
            }
        }
    }
}

impl std::error::Error for AppError {}
