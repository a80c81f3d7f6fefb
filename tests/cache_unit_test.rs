//! Unit tests for cache module.
//!
//! Run with: cargo test --test cache_unit_test

use weather_db::routes::cache;

#[test]
fn cache_key_builds_correctly() {
    assert_eq!(cache::cache_key("averages:day", &[]), "averages:day");
    assert_eq!(
        cache::cache_key("averages:day", &["114", "2024-03-11"]),
        "averages:day:114:2024-03-11"
    );

    // Empty components preserved (ensures query uniqueness)
    assert_ne!(
        cache::cache_key("averages:range", &["114", "", "2024-01-03"]),
        cache::cache_key("averages:range", &["114", "2024-01-03"])
    );
}

#[test]
fn day_and_range_keys_never_collide() {
    assert_ne!(
        cache::cache_key("averages:day", &["1", "2024-01-01"]),
        cache::cache_key("averages:range", &["1", "2024-01-01"])
    );
}
