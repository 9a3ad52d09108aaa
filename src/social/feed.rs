use diesel::sqlite::SqliteConnection;

use crate::{
    app::AppError,
    database::models::{
        follow::Follow,
        tweet::{Tweet, TweetRecord},
        user::User,
    },
};

/// Tweets of everyone `user` follows, most liked first.
/// Following nobody gives an empty feed.
pub fn feed(conn: &mut SqliteConnection, user: &User) -> Result<Vec<TweetRecord>, AppError> {
    let followed = Follow::followed_ids(conn, user.id)?;
    if followed.is_empty() {
        return Ok(Vec::new());
    }

    let tweets = Tweet::get_by_authors(conn, &followed)?;
    Tweet::to_records(conn, tweets)
}
