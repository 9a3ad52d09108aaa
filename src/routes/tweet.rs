use actix_web::{
    delete, get, post,
    web::Data,
    HttpRequest, HttpResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    app::{AppError, AppState},
    auth::{api_key, authenticate},
    database::{
        db_utils::{read_only, unit_of_work},
        models::tweet::Tweet,
    },
    media, social,
};

#[derive(Deserialize)]
struct TweetPayload {
    pub tweet_data: String,
    #[serde(default)]
    pub tweet_media_ids: Vec<i32>,
}

fn tweet_id(req: &HttpRequest) -> Result<i32, AppError> {
    Ok(req.match_info().query("tweet_id").parse::<i32>()?)
}

/// Pipe for posting a tweet
/// - url: `{domain}/api/tweets`
///
/// # HTTP request requirements
/// ## header
/// - `api-key` of the author
/// ## body
/// - json with `tweet_data` (the text) and optionally `tweet_media_ids`,
///   ids returned by `/api/medias` earlier
///
/// # Example
/// ```
/// let data = "{ \"tweet_data\": \"Hello!\", \"tweet_media_ids\": [1, 2] }";
/// let request = actix_web::test::TestRequest::post()
///     .uri("/api/tweets")
///     .insert_header(("api-key", "test-api-key"))
///     .set_payload(data)
///     .to_request();
/// ```
///
/// # Response
/// ## Created
/// ```
/// { "result": true, "tweet_id": 12 }
/// ```
/// ## Error
/// - Unauthorized
/// - InvalidInput
#[post("/api/tweets")]
pub async fn create_tweet(
    req: HttpRequest,
    req_body: String,
    app_state: Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let key = api_key(&req)?;
    let payload = serde_json::from_str::<TweetPayload>(&req_body).map_err(AppError::from);

    let tweet_id = unit_of_work(&app_state.pool, move |conn| {
        let user = authenticate(conn, &key)?;
        let payload = payload?;
        let tweet = Tweet::new(conn, &user, &payload.tweet_data, &payload.tweet_media_ids)?;
        log::info!("User {} posted tweet {}", user.id, tweet.id);

        Ok(tweet.id)
    })
    .await?;

    Ok(HttpResponse::Created().json(json!({ "result": true, "tweet_id": tweet_id })))
}

/// Pipe for getting the feed of the caller: tweets of followed users, most liked first
/// - url: `{domain}/api/tweets`
///
/// # Response
/// ## Ok
/// ```
/// { "result": true, "tweets": [ { "id": 1, "content": "Hello!", "like_count": 3, "author": {...}, "likes": [...], "medias": [...] } ] }
/// ```
/// ## Error
/// - Unauthorized
#[get("/api/tweets")]
pub async fn get_feed(req: HttpRequest, app_state: Data<AppState>) -> Result<HttpResponse, AppError> {
    let key = api_key(&req)?;

    let tweets = read_only(&app_state.pool, move |conn| {
        let user = authenticate(conn, &key)?;
        social::feed::feed(conn, &user)
    })
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "result": true, "tweets": tweets })))
}

/** Pipe for getting a single tweet, `{domain}/api/tweets/{tweet_id}` */
#[get("/api/tweets/{tweet_id}")]
pub async fn get_tweet(req: HttpRequest, app_state: Data<AppState>) -> Result<HttpResponse, AppError> {
    let key = api_key(&req)?;
    let id = tweet_id(&req)?;

    let record = read_only(&app_state.pool, move |conn| {
        authenticate(conn, &key)?;
        let tweet = Tweet::get_by_id(conn, id)?.ok_or(AppError::NotFound("Tweet not found."))?;
        Tweet::to_records(conn, vec![tweet])?
            .pop()
            .ok_or(AppError::NotFound("Tweet not found."))
    })
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "result": true, "tweet": record })))
}

/// Pipe for deleting a tweet, its likes and attached medias go with it
/// - url: `{domain}/api/tweets/{tweet_id}`
///
/// Only the author can delete a tweet, for anyone else it does not exist.
///
/// # Response
/// ## Created
/// ## Error
/// - Unauthorized
/// - NotFound
#[delete("/api/tweets/{tweet_id}")]
pub async fn delete_tweet(req: HttpRequest, app_state: Data<AppState>) -> Result<HttpResponse, AppError> {
    let key = api_key(&req)?;
    let id = tweet_id(&req)?;

    let removed = unit_of_work(&app_state.pool, move |conn| {
        let user = authenticate(conn, &key)?;
        let tweet = Tweet::get_owned(conn, id, user.id)?.ok_or(AppError::NotFound("Tweet not found."))?;
        let removed = tweet.delete(conn)?;
        log::info!("User {} deleted tweet {}", user.id, id);

        Ok(removed)
    })
    .await?;

    media::remove(removed.into_iter().map(|media| media.file_path).collect()).await;

    Ok(HttpResponse::Created().json(json!({ "result": true })))
}

/// Pipe for liking a tweet
/// - url: `{domain}/api/tweets/{tweet_id}/likes`
///
/// # Response
/// ## Created
/// ## Error
/// - Unauthorized
/// - NotFound
#[post("/api/tweets/{tweet_id}/likes")]
pub async fn like_tweet(req: HttpRequest, app_state: Data<AppState>) -> Result<HttpResponse, AppError> {
    let key = api_key(&req)?;
    let id = tweet_id(&req)?;

    unit_of_work(&app_state.pool, move |conn| {
        let user = authenticate(conn, &key)?;
        social::like(conn, &user, id)
    })
    .await?;

    Ok(HttpResponse::Created().json(json!({ "result": true })))
}

/// Pipe for removing a like
/// - url: `{domain}/api/tweets/{tweet_id}/likes`
///
/// # Response
/// ## Created
/// ## Error
/// - Unauthorized
/// - NotFound
#[delete("/api/tweets/{tweet_id}/likes")]
pub async fn unlike_tweet(req: HttpRequest, app_state: Data<AppState>) -> Result<HttpResponse, AppError> {
    let key = api_key(&req)?;
    let id = tweet_id(&req)?;

    unit_of_work(&app_state.pool, move |conn| {
        let user = authenticate(conn, &key)?;
        social::unlike(conn, &user, id)
    })
    .await?;

    Ok(HttpResponse::Created().json(json!({ "result": true })))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test::{self, call_service, read_body_json};
    use actix_web::App;
    use serde_json::Value;

    use super::*;
    use crate::database::models::{like::Like, media::Media};
    use crate::routes::configure;
    use crate::test_utils::setup;

    #[actix_rt::test]
    async fn test_create_tweet() {
        let ctx = setup();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(ctx.state.clone()))
                .configure(configure),
        )
        .await;

        let media_id = {
            let mut conn = ctx.state.pool.get().unwrap();
            Media::new(&mut conn, "a.png", "uploads/a.png").unwrap().id
        };

        let req = test::TestRequest::post()
            .uri("/api/tweets")
            .insert_header(("api-key", "k1"))
            .set_json(json!({ "tweet_data": "Hello, World!", "tweet_media_ids": [media_id] }))
            .to_request();
        let resp = call_service(&app, req).await;
        pretty_assertions::assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = read_body_json(resp).await;
        pretty_assertions::assert_eq!(body["result"], true);
        let tweet_id = body["tweet_id"].as_i64().unwrap() as i32;

        let mut conn = ctx.state.pool.get().unwrap();
        let tweet = Tweet::get_by_id(&mut conn, tweet_id).unwrap().unwrap();
        pretty_assertions::assert_eq!(tweet.user_id, ctx.alice.id);
        pretty_assertions::assert_eq!(tweet.content, "Hello, World!");
        pretty_assertions::assert_eq!(tweet.media_ids(), vec![media_id]);
    }

    #[actix_rt::test]
    async fn test_create_tweet_errors() {
        let ctx = setup();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(ctx.state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/tweets")
            .insert_header(("api-key", "wrong"))
            .set_json(json!({ "tweet_data": "Hello" }))
            .to_request();
        let resp = call_service(&app, req).await;
        pretty_assertions::assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = read_body_json(resp).await;
        pretty_assertions::assert_eq!(
            body,
            json!({ "result": false, "error_type": "Unauthorized", "error_message": "Invalid api-key" })
        );

        let req = test::TestRequest::post()
            .uri("/api/tweets")
            .insert_header(("api-key", "k1"))
            .set_payload("not json")
            .to_request();
        let resp = call_service(&app, req).await;
        pretty_assertions::assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = read_body_json(resp).await;
        pretty_assertions::assert_eq!(body["error_type"], "InvalidInput");
    }

    #[actix_rt::test]
    async fn test_feed() {
        let ctx = setup();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(ctx.state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/tweets")
            .insert_header(("api-key", "k1"))
            .to_request();
        let body: Value = read_body_json(call_service(&app, req).await).await;
        pretty_assertions::assert_eq!(body, json!({ "result": true, "tweets": [] }));

        {
            let mut conn = ctx.state.pool.get().unwrap();
            social::follow(&mut conn, &ctx.alice, ctx.bob.id, false).unwrap();
            Tweet::new(&mut conn, &ctx.bob, "quiet", &[]).unwrap();
            let loud = Tweet::new(&mut conn, &ctx.bob, "loud", &[]).unwrap();
            social::like(&mut conn, &ctx.carol, loud.id).unwrap();
        }

        let req = test::TestRequest::get()
            .uri("/api/tweets")
            .insert_header(("api-key", "k1"))
            .to_request();
        let resp = call_service(&app, req).await;
        pretty_assertions::assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = read_body_json(resp).await;
        let tweets = body["tweets"].as_array().unwrap();
        pretty_assertions::assert_eq!(tweets.len(), 2);
        pretty_assertions::assert_eq!(tweets[0]["content"], "loud");
        pretty_assertions::assert_eq!(tweets[0]["like_count"], 1);
        pretty_assertions::assert_eq!(tweets[0]["author"]["name"], "Bob");
        pretty_assertions::assert_eq!(tweets[0]["likes"][0]["user_id"], ctx.carol.id);
        pretty_assertions::assert_eq!(tweets[1]["content"], "quiet");

        let req = test::TestRequest::get().uri("/api/tweets").to_request();
        pretty_assertions::assert_eq!(call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_delete_tweet_of_someone_else() {
        let ctx = setup();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(ctx.state.clone()))
                .configure(configure),
        )
        .await;
        let tweet = {
            let mut conn = ctx.state.pool.get().unwrap();
            Tweet::new(&mut conn, &ctx.alice, "mine", &[]).unwrap()
        };

        let req = test::TestRequest::delete()
            .uri(format!("/api/tweets/{}", tweet.id).as_str())
            .insert_header(("api-key", "k2"))
            .to_request();
        let resp = call_service(&app, req).await;
        pretty_assertions::assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = read_body_json(resp).await;
        pretty_assertions::assert_eq!(
            body,
            json!({ "result": false, "error_type": "NotFound", "error_message": "Tweet not found." })
        );

        let mut conn = ctx.state.pool.get().unwrap();
        assert!(Tweet::get_by_id(&mut conn, tweet.id).unwrap().is_some());
    }

    #[actix_rt::test]
    async fn test_delete_tweet_removes_files() {
        let ctx = setup();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(ctx.state.clone()))
                .configure(configure),
        )
        .await;

        let path = ctx.state.config.upload_folder.join("pic.png");
        std::fs::write(&path, b"png").unwrap();
        let (tweet, media) = {
            let mut conn = ctx.state.pool.get().unwrap();
            let media = Media::new(&mut conn, "pic.png", &path.to_string_lossy()).unwrap();
            let tweet = Tweet::new(&mut conn, &ctx.alice, "with pic", &[media.id]).unwrap();
            social::like(&mut conn, &ctx.bob, tweet.id).unwrap();
            (tweet, media)
        };

        let req = test::TestRequest::delete()
            .uri(format!("/api/tweets/{}", tweet.id).as_str())
            .insert_header(("api-key", "k1"))
            .to_request();
        let resp = call_service(&app, req).await;
        pretty_assertions::assert_eq!(resp.status(), StatusCode::CREATED);

        assert!(!path.exists());
        let mut conn = ctx.state.pool.get().unwrap();
        assert!(Media::get_by_id(&mut conn, media.id).unwrap().is_none());
        assert!(Like::get_by_tweet_ids(&mut conn, &[tweet.id]).unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_delete_tweet_keeps_files_still_in_use() {
        let ctx = setup();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(ctx.state.clone()))
                .configure(configure),
        )
        .await;

        let path = ctx.state.config.upload_folder.join("same.png");
        std::fs::write(&path, b"png").unwrap();
        let path_str = path.to_string_lossy().into_owned();
        let (alice_tweet, bob_media) = {
            let mut conn = ctx.state.pool.get().unwrap();
            let alice_media = Media::new(&mut conn, "same.png", &path_str).unwrap();
            let bob_media = Media::new(&mut conn, "same.png", &path_str).unwrap();
            let alice_tweet = Tweet::new(&mut conn, &ctx.alice, "mine", &[alice_media.id]).unwrap();
            Tweet::new(&mut conn, &ctx.bob, "also mine", &[bob_media.id]).unwrap();
            (alice_tweet, bob_media)
        };

        let req = test::TestRequest::delete()
            .uri(format!("/api/tweets/{}", alice_tweet.id).as_str())
            .insert_header(("api-key", "k1"))
            .to_request();
        pretty_assertions::assert_eq!(call_service(&app, req).await.status(), StatusCode::CREATED);

        assert!(path.exists());
        let req = test::TestRequest::get()
            .uri(format!("/api/medias/{}", bob_media.id).as_str())
            .to_request();
        let resp = call_service(&app, req).await;
        pretty_assertions::assert_eq!(resp.status(), StatusCode::OK);
        pretty_assertions::assert_eq!(test::read_body(resp).await, "png".as_bytes());
    }

    #[actix_rt::test]
    async fn test_invalid_tweet_id() {
        let ctx = setup();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(ctx.state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/tweets/abc/likes")
            .insert_header(("api-key", "k1"))
            .to_request();
        let resp = call_service(&app, req).await;
        pretty_assertions::assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = read_body_json(resp).await;
        pretty_assertions::assert_eq!(body["error_message"], "Invalid identifier");
    }

    #[actix_rt::test]
    async fn test_like_unlike_delete_scenario() {
        let ctx = setup();
        let app = test::init_service(
            App::new()
                .app_data(Data::new(ctx.state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/tweets")
            .insert_header(("api-key", "k1"))
            .set_json(json!({ "tweet_data": "Hello" }))
            .to_request();
        let body: Value = read_body_json(call_service(&app, req).await).await;
        let id = body["tweet_id"].as_i64().unwrap();
        let tweet_uri = format!("/api/tweets/{}", id);
        let likes_uri = format!("/api/tweets/{}/likes", id);

        let like_count = |body: &Value| body["tweet"]["like_count"].as_i64().unwrap();

        let req = test::TestRequest::post()
            .uri(&likes_uri)
            .insert_header(("api-key", "k2"))
            .to_request();
        let resp = call_service(&app, req).await;
        pretty_assertions::assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = read_body_json(resp).await;
        pretty_assertions::assert_eq!(body, json!({ "result": true }));

        let req = test::TestRequest::get()
            .uri(&tweet_uri)
            .insert_header(("api-key", "k2"))
            .to_request();
        let body: Value = read_body_json(call_service(&app, req).await).await;
        pretty_assertions::assert_eq!(like_count(&body), 1);

        let req = test::TestRequest::delete()
            .uri(&likes_uri)
            .insert_header(("api-key", "k2"))
            .to_request();
        pretty_assertions::assert_eq!(call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri(&tweet_uri)
            .insert_header(("api-key", "k2"))
            .to_request();
        let body: Value = read_body_json(call_service(&app, req).await).await;
        pretty_assertions::assert_eq!(like_count(&body), 0);

        let req = test::TestRequest::delete()
            .uri(&likes_uri)
            .insert_header(("api-key", "k2"))
            .to_request();
        let resp = call_service(&app, req).await;
        pretty_assertions::assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = read_body_json(resp).await;
        pretty_assertions::assert_eq!(body["error_message"], "Like not found.");

        let req = test::TestRequest::delete()
            .uri(&tweet_uri)
            .insert_header(("api-key", "k1"))
            .to_request();
        let resp = call_service(&app, req).await;
        pretty_assertions::assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri(&tweet_uri)
            .insert_header(("api-key", "k1"))
            .to_request();
        let resp = call_service(&app, req).await;
        pretty_assertions::assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = read_body_json(resp).await;
        pretty_assertions::assert_eq!(body["error_type"], "NotFound");

        let req = test::TestRequest::post()
            .uri(&likes_uri)
            .insert_header(("api-key", "k2"))
            .to_request();
        let body: Value = read_body_json(call_service(&app, req).await).await;
        pretty_assertions::assert_eq!(body["error_message"], "Tweet not found.");
    }
}
