//! Follow edges and likes. Every function here expects to run inside one
//! unit of work, so the row and the counter change together or not at all.

pub mod feed;

use diesel::sqlite::SqliteConnection;

use crate::{
    app::AppError,
    database::models::{follow::Follow, like::Like, tweet::Tweet, user::User},
};

/// Makes `follower` follow the user `target_id`. Following someone twice
/// changes nothing. Following yourself is refused unless `allow_self_follow` is set.
pub fn follow(
    conn: &mut SqliteConnection,
    follower: &User,
    target_id: i32,
    allow_self_follow: bool,
) -> Result<(), AppError> {
    if follower.id == target_id && !allow_self_follow {
        return Err(AppError::FollowError("You can't follow yourself."));
    }
    User::find_by_id(conn, target_id)?.ok_or(AppError::NotFound("User not found."))?;

    Follow::new(conn, follower.id, target_id)?;
    log::info!("User {} follows {}", follower.id, target_id);

    Ok(())
}

pub fn unfollow(conn: &mut SqliteConnection, follower: &User, target_id: i32) -> Result<(), AppError> {
    if !Follow::delete(conn, follower.id, target_id)? {
        return Err(AppError::NotFound("Follow not found."));
    }
    log::info!("User {} unfollowed {}", follower.id, target_id);

    Ok(())
}

/// Records that `user` likes the tweet and bumps its counter.
/// Liking the same tweet again is accepted and changes nothing.
pub fn like(conn: &mut SqliteConnection, user: &User, tweet_id: i32) -> Result<(), AppError> {
    Tweet::get_by_id(conn, tweet_id)?.ok_or(AppError::NotFound("Tweet not found."))?;

    if Like::find(conn, user.id, tweet_id)?.is_some() {
        log::debug!("User {} already likes tweet {}", user.id, tweet_id);
        return Ok(());
    }

    Like::new(conn, user.id, tweet_id)?;
    Tweet::increment_likes(conn, tweet_id)?;

    Ok(())
}

/// Removes the like of `user` from the tweet. The counter is floored at 0:
/// if it is already 0 the like row still goes away and the call succeeds.
pub fn unlike(conn: &mut SqliteConnection, user: &User, tweet_id: i32) -> Result<(), AppError> {
    let like = Like::find(conn, user.id, tweet_id)?.ok_or(AppError::NotFound("Like not found."))?;

    like.delete(conn)?;
    if !Tweet::decrement_likes(conn, tweet_id)? {
        log::warn!("Like counter of tweet {} was already 0", tweet_id);
    }

    Ok(())
}
