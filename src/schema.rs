table! {
    users (id) {
        id -> Integer,
        name -> Text,
        api_key_hash -> Text,
    }
}

table! {
    tweets (id) {
        id -> Integer,
        user_id -> Integer,
        content -> Text,
        medias_ids -> Text,
        like_count -> Integer,
        created_at -> Timestamp,
    }
}

table! {
    medias (id) {
        id -> Integer,
        filename -> Text,
        file_path -> Text,
        tweet_id -> Nullable<Integer>,
    }
}

table! {
    likes (id) {
        id -> Integer,
        user_id -> Integer,
        tweet_id -> Integer,
    }
}

table! {
    follows (follower_id, followed_id) {
        follower_id -> Integer,
        followed_id -> Integer,
    }
}

joinable!(tweets -> users (user_id));
joinable!(medias -> tweets (tweet_id));
joinable!(likes -> tweets (tweet_id));

allow_tables_to_appear_in_same_query!(
    follows,
    likes,
    medias,
    tweets,
    users,
);
