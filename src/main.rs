#[macro_use]
extern crate diesel;
extern crate dotenv;

pub mod app;
pub mod database;
pub mod schema;

mod auth;
mod media;
mod routes;
mod seed;
mod social;

#[cfg(test)]
mod test_utils;

use actix_web::{middleware, web::Data, App, HttpServer};

use crate::{
    app::{config::Config, AppState},
    database::db_utils::unit_of_work,
};

fn to_io_error(err: app::AppError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    log::info!("Starting with {:?}", config);

    let bind = (config.host.clone(), config.port);
    let seed_count = config.seed_users;
    let app_state = AppState::new(config).map_err(to_io_error)?;

    if seed_count > 0 {
        let seeded = unit_of_work(&app_state.pool, move |conn| seed::seed_users(conn, seed_count))
            .await
            .map_err(to_io_error)?;
        for (user, key) in seeded {
            log::info!("Seeded user {} ({}) with api-key {}", user.id, user.name, key);
        }
    }

    log::info!("Server running on {}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(Data::new(app_state.clone()))
            .configure(routes::configure)
    })
    .bind(bind)?
    .run()
    .await
}
