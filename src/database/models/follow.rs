use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use crate::{app::AppError, schema::follows};

#[derive(Debug, Clone, PartialEq, Eq, Insertable, Queryable, Serialize)]
#[diesel(table_name = follows)]
pub struct Follow {
    pub follower_id: i32,
    pub followed_id: i32,
}

impl Follow {
    /// Stores the edge `follower -> followed`. Following twice is a no-op,
    /// the pair is the primary key of the table.
    pub fn new(conn: &mut SqliteConnection, follower: i32, followed: i32) -> Result<Follow, AppError> {
        let follow = Follow {
            follower_id: follower,
            followed_id: followed,
        };
        let inserted = diesel::insert_into(follows::table)
            .values(&follow)
            .on_conflict_do_nothing()
            .execute(conn)?;
        if inserted == 0 {
            log::debug!("User {} already follows {}", follower, followed);
        }

        Ok(follow)
    }

    /// Removes the edge, returns false if there was nothing to remove.
    pub fn delete(conn: &mut SqliteConnection, follower: i32, followed: i32) -> Result<bool, AppError> {
        use crate::schema::follows::dsl::*;

        let deleted = diesel::delete(
            follows
                .filter(follower_id.eq(follower))
                .filter(followed_id.eq(followed)),
        )
        .execute(conn)?;

        Ok(deleted > 0)
    }

    /** Ids of the users `follower` follows */
    pub fn followed_ids(conn: &mut SqliteConnection, follower: i32) -> Result<Vec<i32>, AppError> {
        use crate::schema::follows::dsl::*;

        Ok(follows
            .filter(follower_id.eq(follower))
            .select(followed_id)
            .load::<i32>(conn)?)
    }

    /** Ids of the users following `followed` */
    pub fn follower_ids(conn: &mut SqliteConnection, followed: i32) -> Result<Vec<i32>, AppError> {
        use crate::schema::follows::dsl::*;

        Ok(follows
            .filter(followed_id.eq(followed))
            .select(follower_id)
            .load::<i32>(conn)?)
    }
}
