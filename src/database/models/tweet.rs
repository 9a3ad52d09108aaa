use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use super::{like::Like, media::Media, user::User};
use crate::{
    app::AppError,
    schema::{self, tweets},
};

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable)]
#[diesel(table_name = tweets)]
pub struct Tweet {
    pub id: i32,
    pub user_id: i32,
    pub content: String,
    /// JSON array of the attached media ids, in the order they were sent
    pub medias_ids: String,
    pub like_count: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = tweets)]
struct TweetInsert {
    pub user_id: i32,
    pub content: String,
    pub medias_ids: String,
    pub like_count: i32,
    pub created_at: NaiveDateTime,
}

/// A tweet as the api hands it out, with its author, likes and medias nested.
///
/// ```
/// {
///     "id": 1,
///     "user_id": 2,
///     "content": "Hello!",
///     "medias_ids": [4],
///     "like_count": 1,
///     "created_at": "2024-03-01T09:22:30.664361",
///     "author": { "id": 2, "name": "Ivan Petrov" },
///     "likes": [{ "id": 7, "user_id": 1, "tweet_id": 1 }],
///     "medias": [{ "id": 4, "filename": "cat.png", "file_path": "uploads/cat.png", "tweet_id": 1 }]
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct TweetRecord {
    pub id: i32,
    pub user_id: i32,
    pub content: String,
    pub medias_ids: Vec<i32>,
    pub like_count: i32,
    pub created_at: NaiveDateTime,
    pub author: Option<User>,
    pub likes: Vec<Like>,
    pub medias: Vec<Media>,
}

impl Tweet {
    /// Creates a tweet for `author` and links the medias given by id to it.
    /// Ids of unknown medias, or of medias that already belong to a tweet, are dropped.
    ///
    /// # Example
    /// ```
    /// let media = Media::new(conn, "cat.png", "uploads/cat.png")?;
    /// let tweet = Tweet::new(conn, &user, "Look at my cat", &[media.id])?;
    /// ```
    pub fn new(
        conn: &mut SqliteConnection,
        author: &User,
        content_in: &str,
        media_ids: &[i32],
    ) -> Result<Tweet, AppError> {
        if content_in.trim().is_empty() {
            return Err(AppError::InvalidInput("Tweet content is empty"));
        }

        let linked = Media::attachable_ids(conn, media_ids)?;
        let to_insert = TweetInsert {
            user_id: author.id,
            content: content_in.to_string(),
            medias_ids: serde_json::to_string(&linked)?,
            like_count: 0,
            created_at: Utc::now().naive_utc(),
        };

        let tweet: Tweet = diesel::insert_into(schema::tweets::table)
            .values(&to_insert)
            .get_result(conn)?;
        Media::attach_to_tweet(conn, &linked, tweet.id)?;

        Ok(tweet)
    }

    pub fn get_by_id(conn: &mut SqliteConnection, tweet_id: i32) -> Result<Option<Tweet>, AppError> {
        use crate::schema::tweets::dsl::*;

        Ok(tweets.find(tweet_id).first::<Tweet>(conn).optional()?)
    }

    /** Returns the tweet only if it was written by `owner` */
    pub fn get_owned(
        conn: &mut SqliteConnection,
        tweet_id: i32,
        owner: i32,
    ) -> Result<Option<Tweet>, AppError> {
        use crate::schema::tweets::dsl::*;

        Ok(tweets
            .filter(id.eq(tweet_id))
            .filter(user_id.eq(owner))
            .first::<Tweet>(conn)
            .optional()?)
    }

    /// Returns the tweets written by any of `authors`, most liked first.
    /// Equal counts keep creation order.
    pub fn get_by_authors(conn: &mut SqliteConnection, authors: &[i32]) -> Result<Vec<Tweet>, AppError> {
        use crate::schema::tweets::dsl::*;

        if authors.is_empty() {
            return Ok(Vec::new());
        }

        Ok(tweets
            .filter(user_id.eq_any(authors))
            .order((like_count.desc(), id.asc()))
            .load::<Tweet>(conn)?)
    }

    /// Bumps the counter in sql, so concurrent likes don't overwrite each other.
    pub fn increment_likes(conn: &mut SqliteConnection, tweet_id: i32) -> Result<(), AppError> {
        use crate::schema::tweets::dsl::*;

        diesel::update(tweets.filter(id.eq(tweet_id)))
            .set(like_count.eq(like_count + 1))
            .execute(conn)?;

        Ok(())
    }

    /// Lowers the counter unless it is already 0. Returns false when it was left untouched.
    pub fn decrement_likes(conn: &mut SqliteConnection, tweet_id: i32) -> Result<bool, AppError> {
        use crate::schema::tweets::dsl::*;

        let updated = diesel::update(tweets.filter(id.eq(tweet_id)).filter(like_count.gt(0)))
            .set(like_count.eq(like_count - 1))
            .execute(conn)?;

        Ok(updated > 0)
    }

    /// Deletes the tweet together with its likes and medias.
    /// The deleted medias whose file is no longer used are returned, so those files can be removed afterwards.
    pub fn delete(self, conn: &mut SqliteConnection) -> Result<Vec<Media>, AppError> {
        use crate::schema::tweets::dsl::*;

        Like::delete_by_tweet(conn, self.id)?;
        let removed = Media::delete_by_tweet(conn, self.id)?;
        diesel::delete(tweets.filter(id.eq(self.id))).execute(conn)?;

        Ok(removed)
    }

    pub fn media_ids(&self) -> Vec<i32> {
        serde_json::from_str(&self.medias_ids).unwrap_or_default()
    }

    /// Serializes the tweets given, keeping their order. Authors, likes and
    /// medias are loaded with one query each.
    pub fn to_records(
        conn: &mut SqliteConnection,
        list: Vec<Tweet>,
    ) -> Result<Vec<TweetRecord>, AppError> {
        let tweet_ids: Vec<i32> = list.iter().map(|tweet| tweet.id).collect();
        let mut author_ids: Vec<i32> = list.iter().map(|tweet| tweet.user_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors: HashMap<i32, User> = User::find_by_ids(conn, &author_ids)?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        let mut likes_by_tweet: HashMap<i32, Vec<Like>> = HashMap::new();
        for like in Like::get_by_tweet_ids(conn, &tweet_ids)? {
            likes_by_tweet.entry(like.tweet_id).or_default().push(like);
        }

        let mut medias_by_tweet: HashMap<i32, Vec<Media>> = HashMap::new();
        for media in Media::get_by_tweet_ids(conn, &tweet_ids)? {
            if let Some(owner) = media.tweet_id {
                medias_by_tweet.entry(owner).or_default().push(media);
            }
        }

        Ok(list
            .into_iter()
            .map(|tweet| TweetRecord {
                medias_ids: tweet.media_ids(),
                author: authors.get(&tweet.user_id).cloned(),
                likes: likes_by_tweet.remove(&tweet.id).unwrap_or_default(),
                medias: medias_by_tweet.remove(&tweet.id).unwrap_or_default(),
                id: tweet.id,
                user_id: tweet.user_id,
                content: tweet.content,
                like_count: tweet.like_count,
                created_at: tweet.created_at,
            })
            .collect())
    }
}
