use azdo_serviceendpoints::secret::{self, is_updating, memo_key, refresh, suppress_diff};

#[test]
fn memo_key_appends_hash_suffix() {
    assert_eq!(memo_key("docker_password"), "docker_password_hash");
}

#[test]
fn hash_is_salted_and_verifies() {
    let a = secret::hash("s3cret").unwrap();
    let b = secret::hash("s3cret").unwrap();

    assert_ne!(a, b);
    assert!(a.starts_with("$argon2id$"));
    assert!(secret::verify("s3cret", &a).unwrap());
    assert!(secret::verify("s3cret", &b).unwrap());
    assert!(!secret::verify("other", &a).unwrap());
}

#[test]
fn verify_rejects_malformed_memo() {
    assert!(secret::verify("s3cret", "not-a-memo").is_err());
}

#[test]
fn is_updating_tracks_changes() {
    // First time a secret is seen.
    let (changed, memo) = is_updating("token", "").unwrap();
    assert!(changed);
    assert!(secret::verify("token", &memo).unwrap());

    // Unchanged secret keeps the same memo.
    let (changed, same) = is_updating("token", &memo).unwrap();
    assert!(!changed);
    assert_eq!(same, memo);

    let (changed, next) = is_updating("rotated", &memo).unwrap();
    assert!(changed);
    assert_ne!(next, memo);

    // Clearing the secret clears the memo.
    let (changed, cleared) = is_updating("", &memo).unwrap();
    assert!(changed);
    assert!(cleared.is_empty());

    let (changed, cleared) = is_updating("", "").unwrap();
    assert!(!changed);
    assert!(cleared.is_empty());
}

#[test]
fn suppress_diff_only_for_matching_secret() {
    let memo = secret::hash("token").unwrap();

    assert!(suppress_diff("token", &memo));
    assert!(!suppress_diff("rotated", &memo));
    assert!(!suppress_diff("token", ""));
    assert!(!suppress_diff("token", "garbage"));
    assert!(suppress_diff("", ""));
}

#[test]
fn refresh_updates_memo_in_place() {
    let mut memo = String::new();
    refresh("token", &mut memo).unwrap();
    let first = memo.clone();
    assert!(!first.is_empty());

    refresh("token", &mut memo).unwrap();
    assert_eq!(memo, first);

    refresh("", &mut memo).unwrap();
    assert!(memo.is_empty());
}

#[test]
fn suppress_diff_agrees_with_is_updating() {
    let memo = secret::hash("token").unwrap();

    for (secret_value, prior) in [
        ("token", memo.as_str()),
        ("rotated", memo.as_str()),
        ("", memo.as_str()),
        ("token", ""),
        ("", ""),
    ] {
        let (changed, _) = is_updating(secret_value, prior).unwrap();
        assert_eq!(
            suppress_diff(secret_value, prior),
            !changed,
            "{secret_value:?} against {prior:?}"
        );
    }

    // A memo that does not parse is replaced, never kept.
    let (changed, next) = is_updating("token", "garbage").unwrap();
    assert!(changed);
    assert!(secret::verify("token", &next).unwrap());
}
