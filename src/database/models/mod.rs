pub mod follow;
pub mod like;
pub mod media;
pub mod tweet;
pub mod user;
