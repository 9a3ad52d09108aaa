use diesel::sqlite::SqliteConnection;
use rand::{
    distributions::{Alphanumeric, DistString},
    seq::SliceRandom,
    Rng,
};

use crate::{app::AppError, database::models::user::User};

const API_KEY_LEN: usize = 20;

const FIRST_NAMES: &[&str] = &[
    "Anna", "Boris", "Clara", "Dmitry", "Elena", "Felix", "Greta", "Hugo", "Irina", "Jonas",
    "Kira", "Leon", "Maria", "Nikolai", "Olga", "Pavel",
];
const LAST_NAMES: &[&str] = &[
    "Ivanova", "Petrov", "Smith", "Novak", "Keller", "Larsen", "Moreau", "Rossi", "Sokolova",
    "Tanaka", "Weber", "Young",
];

pub fn random_api_key() -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), API_KEY_LEN)
}

fn random_name<R: Rng>(rng: &mut R) -> String {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Anna");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Smith");

    format!("{} {}", first, last)
}

/// Creates `count` users with random names and api keys.
/// The keys are only known here, they are returned next to each user.
pub fn seed_users(conn: &mut SqliteConnection, count: usize) -> Result<Vec<(User, String)>, AppError> {
    let mut rng = rand::thread_rng();
    let mut created = Vec::with_capacity(count);

    for _ in 0..count {
        let key = random_api_key();
        let user = User::new(conn, &random_name(&mut rng), &key)?;
        created.push((user, key));
    }

    Ok(created)
}
