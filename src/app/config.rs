use std::{env, path::PathBuf, str::FromStr};

/** Runtime settings, read from the enviroment (and `.env` when present) */
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub upload_folder: PathBuf,
    pub host: String,
    pub port: u16,
    pub pool_size: u32,
    /// When false, following yourself is answered with `FollowError`
    pub allow_self_follow: bool,
    /// Number of random users generated at startup
    pub seed_users: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::from("microblog.db"),
            upload_folder: PathBuf::from("uploads"),
            host: String::from("127.0.0.1"),
            port: 8080,
            pool_size: 8,
            allow_self_follow: false,
            seed_users: 0,
        }
    }
}

impl Config {
    /// Builds the config from enviroment variables, any variable that is
    /// missing or can't be parsed keeps its default value.
    ///
    /// # Example
    /// ```
    /// std::env::set_var("PORT", "5000");
    /// let config = Config::from_env();
    /// assert_eq!(config.port, 5000);
    /// ```
    pub fn from_env() -> Config {
        dotenv::dotenv().ok();
        let defaults = Config::default();

        Config {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            upload_folder: env::var("UPLOAD_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_folder),
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parse_var("PORT", defaults.port),
            pool_size: parse_var("POOL_SIZE", defaults.pool_size),
            allow_self_follow: parse_var("ALLOW_SELF_FOLLOW", defaults.allow_self_follow),
            seed_users: parse_var("SEED_USERS", defaults.seed_users),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("Ignoring invalid value {:?} for {}", raw, name);
                default
            }
        },
        Err(_) => default,
    }
}
