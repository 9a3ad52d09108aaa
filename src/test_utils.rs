use tempfile::TempDir;

use crate::{
    app::{config::Config, AppState},
    database::models::user::User,
};

/// A fresh database and upload folder, removed again when dropped.
/// Alice, Bob and Carol use the api keys `k1`, `k2` and `k3`.
pub struct TestContext {
    pub state: AppState,
    pub alice: User,
    pub bob: User,
    pub carol: User,
    _dir: TempDir,
}

pub fn setup() -> TestContext {
    setup_with(|_| {})
}

pub fn setup_with(tweak: impl FnOnce(&mut Config)) -> TestContext {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config {
        database_url: dir.path().join("test.db").to_string_lossy().into_owned(),
        upload_folder: dir.path().join("uploads"),
        pool_size: 4,
        ..Config::default()
    };
    tweak(&mut config);

    let state = AppState::new(config).unwrap();
    let mut conn = state.pool.get().unwrap();
    let alice = User::new(&mut conn, "Alice", "k1").unwrap();
    let bob = User::new(&mut conn, "Bob", "k2").unwrap();
    let carol = User::new(&mut conn, "Carol", "k3").unwrap();
    drop(conn);

    TestContext {
        state,
        alice,
        bob,
        carol,
        _dir: dir,
    }
}
