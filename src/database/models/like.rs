use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use crate::{app::AppError, schema::likes};

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Serialize)]
#[diesel(table_name = likes)]
pub struct Like {
    pub id: i32,
    pub user_id: i32,
    pub tweet_id: i32,
}

#[derive(Insertable)]
#[diesel(table_name = likes)]
struct LikeInsert {
    pub user_id: i32,
    pub tweet_id: i32,
}

impl Like {
    /// Inserts the like row only, keeping `tweets.like_count` in sync is up to the caller.
    pub fn new(conn: &mut SqliteConnection, user: i32, tweet: i32) -> Result<Like, AppError> {
        let like = LikeInsert {
            user_id: user,
            tweet_id: tweet,
        };

        Ok(diesel::insert_into(likes::table)
            .values(&like)
            .get_result::<Like>(conn)?)
    }

    pub fn find(conn: &mut SqliteConnection, user: i32, tweet: i32) -> Result<Option<Like>, AppError> {
        use crate::schema::likes::dsl::*;

        Ok(likes
            .filter(user_id.eq(user))
            .filter(tweet_id.eq(tweet))
            .first::<Like>(conn)
            .optional()?)
    }

    /** Returns every like of the tweets specified, ordered by id */
    pub fn get_by_tweet_ids(conn: &mut SqliteConnection, tweets: &[i32]) -> Result<Vec<Like>, AppError> {
        use crate::schema::likes::dsl::*;

        if tweets.is_empty() {
            return Ok(Vec::new());
        }

        Ok(likes
            .filter(tweet_id.eq_any(tweets))
            .order(id.asc())
            .load::<Like>(conn)?)
    }

    pub fn delete(&self, conn: &mut SqliteConnection) -> Result<(), AppError> {
        use crate::schema::likes::dsl::*;

        diesel::delete(likes.filter(id.eq(self.id))).execute(conn)?;

        Ok(())
    }

    /** Deletes all likes of a tweet, returns how many were removed */
    pub fn delete_by_tweet(conn: &mut SqliteConnection, tweet: i32) -> Result<usize, AppError> {
        use crate::schema::likes::dsl::*;

        Ok(diesel::delete(likes.filter(tweet_id.eq(tweet))).execute(conn)?)
    }
}
