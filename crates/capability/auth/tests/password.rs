use meterd_auth::{hash_password, verify_password};

#[test]
fn hash_and_verify_round_trip() {
    let hash = hash_password("admin1234").expect("hash");
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password(&hash, "admin1234").expect("verify"));
    assert!(!verify_password(&hash, "wrong").expect("verify"));
}

#[test]
fn hashes_are_salted() {
    let first = hash_password("admin1234").expect("hash");
    let second = hash_password("admin1234").expect("hash");
    assert_ne!(first, second);
}
