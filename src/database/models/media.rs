use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use crate::{app::AppError, schema::medias};

/// A stored upload. Created before the tweet it ends up attached to,
/// `tweet_id` stays empty until then.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Serialize)]
#[diesel(table_name = medias)]
pub struct Media {
    pub id: i32,
    pub filename: String,
    pub file_path: String,
    pub tweet_id: Option<i32>,
}

#[derive(Insertable)]
#[diesel(table_name = medias)]
struct MediaInsert {
    pub filename: String,
    pub file_path: String,
}

impl Media {
    pub fn new(conn: &mut SqliteConnection, name: &str, path: &str) -> Result<Media, AppError> {
        let record = MediaInsert {
            filename: name.to_string(),
            file_path: path.to_string(),
        };

        Ok(diesel::insert_into(medias::table)
            .values(&record)
            .get_result::<Media>(conn)?)
    }

    pub fn get_by_id(conn: &mut SqliteConnection, media_id: i32) -> Result<Option<Media>, AppError> {
        use crate::schema::medias::dsl::*;

        Ok(medias.find(media_id).first::<Media>(conn).optional()?)
    }

    /// Keeps the ids of `wanted` naming a media that is not attached to any tweet yet,
    /// in the order given and without duplicates.
    pub fn attachable_ids(conn: &mut SqliteConnection, wanted: &[i32]) -> Result<Vec<i32>, AppError> {
        use crate::schema::medias::dsl::*;

        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let free: Vec<i32> = medias
            .filter(id.eq_any(wanted))
            .filter(tweet_id.is_null())
            .select(id)
            .load(conn)?;

        let mut ordered = Vec::with_capacity(free.len());
        for wanted_id in wanted {
            if free.contains(wanted_id) && !ordered.contains(wanted_id) {
                ordered.push(*wanted_id);
            }
        }

        Ok(ordered)
    }

    /** Sets the back reference of the medias specified to the tweet */
    pub fn attach_to_tweet(
        conn: &mut SqliteConnection,
        media_ids: &[i32],
        tweet: i32,
    ) -> Result<usize, AppError> {
        use crate::schema::medias::dsl::*;

        if media_ids.is_empty() {
            return Ok(0);
        }

        Ok(diesel::update(medias.filter(id.eq_any(media_ids)))
            .set(tweet_id.eq(Some(tweet)))
            .execute(conn)?)
    }

    /** Returns the medias attached to the tweets specified, ordered by id */
    pub fn get_by_tweet_ids(conn: &mut SqliteConnection, tweets: &[i32]) -> Result<Vec<Media>, AppError> {
        use crate::schema::medias::dsl::*;

        if tweets.is_empty() {
            return Ok(Vec::new());
        }

        Ok(medias
            .filter(tweet_id.eq_any(tweets))
            .order(id.asc())
            .load::<Media>(conn)?)
    }

    pub fn path_in_use(conn: &mut SqliteConnection, path: &str) -> Result<bool, AppError> {
        use crate::schema::medias::dsl::*;

        let count: i64 = medias.filter(file_path.eq(path)).count().get_result(conn)?;

        Ok(count > 0)
    }

    /// Deletes the medias attached to a tweet. Returns the deleted medias whose
    /// file no other media points to anymore, so those files can be removed
    /// once the transaction went through.
    pub fn delete_by_tweet(conn: &mut SqliteConnection, tweet: i32) -> Result<Vec<Media>, AppError> {
        use crate::schema::medias::dsl::*;

        let attached = medias
            .filter(tweet_id.eq(tweet))
            .order(id.asc())
            .load::<Media>(conn)?;
        diesel::delete(medias.filter(tweet_id.eq(tweet))).execute(conn)?;

        let paths: Vec<&str> = attached.iter().map(|media| media.file_path.as_str()).collect();
        let shared: Vec<String> = medias
            .filter(file_path.eq_any(paths))
            .select(file_path)
            .distinct()
            .load(conn)?;

        let mut orphaned: Vec<Media> = Vec::with_capacity(attached.len());
        for media in attached {
            if shared.contains(&media.file_path) {
                log::debug!("Keeping {}, another media still uses it", media.file_path);
                continue;
            }
            if orphaned.iter().any(|kept| kept.file_path == media.file_path) {
                continue;
            }
            orphaned.push(media);
        }

        Ok(orphaned)
    }
}
