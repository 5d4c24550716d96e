use std::collections::HashSet;

use bramble_auth::{
    CLIENT_ID_LEN, CLIENT_SECRET_LEN, generate, hash_password, verify_password,
};

#[test]
fn test_generate_exact_lengths() {
    for len in [1, 8, CLIENT_ID_LEN, CLIENT_SECRET_LEN, 255] {
        let value = generate(len).unwrap();
        assert_eq!(value.len(), len);
        // base64url alphabet only.
        assert!(
            value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }
}

#[test]
fn test_generated_values_do_not_repeat() {
    let mut seen = HashSet::new();
    for _ in 0..100 {
        assert!(seen.insert(generate(40).unwrap()));
    }
}

#[test]
fn test_password_hash_round_trip() {
    let stored = hash_password("secret").unwrap();
    assert_ne!(stored, "secret");
    assert!(verify_password("secret", &stored));
    assert!(!verify_password("wrong", &stored));

    // Two hashes of the same password differ by salt.
    assert_ne!(stored, hash_password("secret").unwrap());
}

#[test]
fn test_malformed_stored_hash_never_verifies() {
    assert!(!verify_password("secret", "not-a-hash"));
    assert!(!verify_password("secret", "bad$base64!!"));
    assert!(!verify_password("secret", "$"));
}
