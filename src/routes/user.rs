use actix_web::{delete, get, patch, post, web::Data, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{
    app::{AppError, AppState},
    auth::{api_key, authenticate},
    database::{
        db_utils::{read_only, unit_of_work},
        models::user::User,
    },
    social,
};

#[derive(Deserialize)]
struct RenamePayload {
    pub name: String,
}

fn user_id(req: &HttpRequest) -> Result<i32, AppError> {
    Ok(req.match_info().query("user_id").parse::<i32>()?)
}

/// Pipe for following an user
/// - url: `{domain}/api/users/{user_id}/follow`
///
/// # HTTP request requirements
/// ## header
/// - `api-key` of the follower
///
/// # Response
/// ## Created
/// ```
/// { "result": true }
/// ```
/// ## Error
/// - Unauthorized
/// - FollowError: following yourself
/// - NotFound: no such user
#[post("/api/users/{user_id}/follow")]
pub async fn follow_user(req: HttpRequest, app_state: Data<AppState>) -> Result<HttpResponse, AppError> {
    let key = api_key(&req)?;
    let target = user_id(&req)?;
    let allow_self_follow = app_state.config.allow_self_follow;

    unit_of_work(&app_state.pool, move |conn| {
        let user = authenticate(conn, &key)?;
        social::follow(conn, &user, target, allow_self_follow)
    })
    .await?;

    Ok(HttpResponse::Created().json(json!({ "result": true })))
}

/// Pipe for unfollowing an user
/// - url: `{domain}/api/users/{user_id}/follow`
///
/// # Response
/// ## Created
/// ## Error
/// - Unauthorized
/// - NotFound: the caller does not follow that user
#[delete("/api/users/{user_id}/follow")]
pub async fn unfollow_user(req: HttpRequest, app_state: Data<AppState>) -> Result<HttpResponse, AppError> {
    let key = api_key(&req)?;
    let target = user_id(&req)?;

    unit_of_work(&app_state.pool, move |conn| {
        let user = authenticate(conn, &key)?;
        social::unfollow(conn, &user, target)
    })
    .await?;

    Ok(HttpResponse::Created().json(json!({ "result": true })))
}

/// Pipe for getting the profile of the caller
/// - url: `{domain}/api/users/me`
///
/// # Response
/// ## Ok
/// ```
/// { "result": true, "user": { "id": 1, "name": "Ivan", "followers": [...], "following": [...] } }
/// ```
/// ## Error
/// - Unauthorized
#[get("/api/users/me")]
pub async fn get_me(req: HttpRequest, app_state: Data<AppState>) -> Result<HttpResponse, AppError> {
    let key = api_key(&req)?;

    let profile = read_only(&app_state.pool, move |conn| {
        let user = authenticate(conn, &key)?;
        user.profile(conn)
    })
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "result": true, "user": profile })))
}

/// Pipe for changing the display name of the caller
/// - url: `{domain}/api/users/me`
///
/// # HTTP request requirements
/// ## body
/// - json with the new `name`, at most 50 characters
///
/// # Response
/// ## Created
/// - the updated profile, same shape as `GET /api/users/me`
/// ## Error
/// - Unauthorized
/// - InvalidInput
#[patch("/api/users/me")]
pub async fn rename_me(
    req: HttpRequest,
    req_body: String,
    app_state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let key = api_key(&req)?;
    let payload = serde_json::from_str::<RenamePayload>(&req_body).map_err(AppError::from);

    let profile = unit_of_work(&app_state.pool, move |conn| {
        let mut user = authenticate(conn, &key)?;
        let payload = payload?;
        user.rename(conn, &payload.name)?;
        log::info!("User {} renamed to {}", user.id, user.name);

        user.profile(conn)
    })
    .await?;

    Ok(HttpResponse::Created().json(json!({ "result": true, "user": profile })))
}

/** Pipe for getting the profile of any user, `{domain}/api/users/{user_id}` */
#[get("/api/users/{user_id}")]
pub async fn get_user(req: HttpRequest, app_state: Data<AppState>) -> Result<HttpResponse, AppError> {
    let key = api_key(&req)?;
    let id = user_id(&req)?;

    let profile = read_only(&app_state.pool, move |conn| {
        authenticate(conn, &key)?;
        User::find_by_id(conn, id)?
            .ok_or(AppError::NotFound("User not found."))?
            .profile(conn)
    })
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "result": true, "user": profile })))
}
