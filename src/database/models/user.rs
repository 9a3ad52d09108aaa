use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use super::follow::Follow;
use crate::{
    app::AppError,
    schema::{self, users},
};

pub const MAX_NAME_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Serialize)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub name: String,
    ///SHA256 of the api key
    #[serde(skip_serializing)]
    pub api_key_hash: String,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
struct UserInsert {
    pub name: String,
    pub api_key_hash: String,
}

/** What the profile routes answer with */
#[derive(Debug, Serialize)]
pub struct Profile {
    pub id: i32,
    pub name: String,
    pub followers: Vec<User>,
    pub following: Vec<User>,
}

/// Api keys are only ever stored and compared as their SHA256 digest
pub fn hash_api_key(api_key: &str) -> String {
    sha256::digest(api_key)
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::InvalidInput("Invalid user name"));
    }

    Ok(name.to_string())
}

impl User {
    /// Pushes a new user in the database, the api key is hashed before storing.
    ///
    /// # Example
    /// ```
    /// let user = User::new(conn, "Ivan Petrov", "test-api-key")?;
    /// ```
    pub fn new(conn: &mut SqliteConnection, name: &str, api_key: &str) -> Result<User, AppError> {
        if api_key.is_empty() {
            return Err(AppError::InvalidInput("Empty api key"));
        }

        let to_insert = UserInsert {
            name: validate_name(name)?,
            api_key_hash: hash_api_key(api_key),
        };

        let user = diesel::insert_into(schema::users::table)
            .values(&to_insert)
            .get_result(conn)?;

        Ok(user)
    }

    /** Returns the user with the id specified */
    pub fn find_by_id(conn: &mut SqliteConnection, user_id: i32) -> Result<Option<User>, AppError> {
        use crate::schema::users::dsl::*;

        Ok(users.find(user_id).first::<User>(conn).optional()?)
    }

    /// Returns the user owning `api_key`, or `None` if the key was never issued.
    pub fn find_by_api_key(
        conn: &mut SqliteConnection,
        api_key: &str,
    ) -> Result<Option<User>, AppError> {
        use crate::schema::users::dsl::*;

        Ok(users
            .filter(api_key_hash.eq(hash_api_key(api_key)))
            .first::<User>(conn)
            .optional()?)
    }

    /** Returns all users with the ids specified, ordered by id */
    pub fn find_by_ids(conn: &mut SqliteConnection, ids: &[i32]) -> Result<Vec<User>, AppError> {
        use crate::schema::users::dsl::*;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(users
            .filter(id.eq_any(ids))
            .order(id.asc())
            .load::<User>(conn)?)
    }

    /** Changes the display name, the only mutable field of an user */
    pub fn rename(&mut self, conn: &mut SqliteConnection, new_name: &str) -> Result<(), AppError> {
        use crate::schema::users::dsl::*;

        let new_name = validate_name(new_name)?;
        diesel::update(users.filter(id.eq(self.id)))
            .set(name.eq(&new_name))
            .execute(conn)?;
        self.name = new_name;

        Ok(())
    }

    /// Collects the followers and followed accounts of this user.
    pub fn profile(&self, conn: &mut SqliteConnection) -> Result<Profile, AppError> {
        let follower_ids = Follow::follower_ids(conn, self.id)?;
        let following_ids = Follow::followed_ids(conn, self.id)?;

        Ok(Profile {
            id: self.id,
            name: self.name.clone(),
            followers: User::find_by_ids(conn, &follower_ids)?,
            following: User::find_by_ids(conn, &following_ids)?,
        })
    }
}
