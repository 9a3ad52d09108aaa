use actix_multipart::Multipart;
use actix_web::{get, post, web::Data, HttpRequest, HttpResponse};
use futures::{stream::StreamExt as _, TryStreamExt};
use serde_json::json;

use crate::{
    app::{AppError, AppState},
    auth::{api_key, authenticate},
    database::{
        db_utils::{read_only, unit_of_work},
        models::media::Media,
    },
    media::{self, sanitize_filename},
};

struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

/// Reads the multipart body until a `file` field with a filename shows up.
/// Other fields are skipped. A broken body reads as "no file".
async fn parse_multipart(payload: &mut Multipart) -> Result<Option<Upload>, AppError> {
    while let Ok(Some(mut field)) = payload.try_next().await {
        let content_type = field.content_disposition();
        let is_file = content_type.get_name() == Some("file");
        let filename = content_type.get_filename().unwrap_or("").trim().to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|_| AppError::InvalidInput("File not found"))?;
            if is_file {
                bytes.extend_from_slice(&data);
            }
        }

        if is_file && !filename.is_empty() {
            return Ok(Some(Upload { filename, bytes }));
        }
    }

    Ok(None)
}

/// Pipe for uploading a media file, it is of type multipart
/// - url: `{domain}/api/medias`
///
/// The returned id is later passed in `tweet_media_ids` when posting a tweet.
///
/// # HTTP request requirements
/// ## header
/// - `api-key`
/// ## body
/// - file: the file we are uploading, stored under its sanitized name
///
/// # Response
/// ## Created
/// ```
/// { "result": true, "media_id": 3 }
/// ```
/// ## Error
/// - Unauthorized
/// - InvalidInput: "File not found"
#[post("/api/medias")]
pub async fn upload_media(
    req: HttpRequest,
    app_state: Data<AppState>,
    mut mp: Multipart,
) -> Result<HttpResponse, AppError> {
    let key = api_key(&req)?;
    read_only(&app_state.pool, move |conn| authenticate(conn, &key)).await?;

    let upload = parse_multipart(&mut mp)
        .await?
        .ok_or(AppError::InvalidInput("File not found"))?;

    let filename = sanitize_filename(&upload.filename);
    let path = media::store(&app_state.config.upload_folder, &filename, upload.bytes).await?;
    let file_path = path.to_string_lossy().into_owned();

    let stored_path = file_path.clone();
    let inserted = unit_of_work(&app_state.pool, move |conn| {
        Ok(Media::new(conn, &filename, &stored_path)?.id)
    })
    .await;

    let media_id = match inserted {
        Ok(media_id) => media_id,
        Err(err) => {
            // An older media with the same name may still own the file
            let checked_path = file_path.clone();
            let in_use = read_only(&app_state.pool, move |conn| Media::path_in_use(conn, &checked_path)).await;
            match in_use {
                Ok(false) => media::remove(vec![file_path]).await,
                Ok(true) => {}
                Err(_) => log::warn!("Leaving {} on disk, could not check if it is used", file_path),
            }
            return Err(err);
        }
    };

    Ok(HttpResponse::Created().json(json!({ "result": true, "media_id": media_id })))
}

/// Pipe for getting the bytes of an uploaded media
/// - url: `{domain}/api/medias/{media_id}`
///
/// # Response
/// ## Ok
/// - the stored file in the body
/// ## Error
/// - NotFound
#[get("/api/medias/{media_id}")]
pub async fn get_media(req: HttpRequest, app_state: Data<AppState>) -> Result<HttpResponse, AppError> {
    let media_id = req.match_info().query("media_id").parse::<i32>()?;

    let found = read_only(&app_state.pool, move |conn| {
        Media::get_by_id(conn, media_id)?.ok_or(AppError::NotFound("Media not found."))
    })
    .await?;

    let file = media::read(&found.file_path).await.map_err(|err| match err {
        AppError::NotFound(_) => AppError::NotFound("Media not found."),
        other => other,
    })?;

    Ok(HttpResponse::Ok().body(file))
}
