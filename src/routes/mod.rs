pub mod media;
pub mod tweet;
pub mod user;

use actix_web::web::ServiceConfig;

/// Registers every api route on the app.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg
        //Tweet routes
        .service(tweet::create_tweet)
        .service(tweet::get_feed)
        .service(tweet::get_tweet)
        .service(tweet::delete_tweet)
        .service(tweet::like_tweet)
        .service(tweet::unlike_tweet)
        //Media routes
        .service(media::upload_media)
        .service(media::get_media)
        //User routes, `me` has to be registered before `{user_id}`
        .service(user::get_me)
        .service(user::rename_me)
        .service(user::get_user)
        .service(user::follow_user)
        .service(user::unfollow_user);
}
