use opserver_engine::normalizer::{CURRENT_AVATAR_BASE, extract_hash, normalize};

const HASH: &str = "abc0123456789abcdef0123456789abcdef0123f";

fn samples() -> Vec<String> {
    vec![
        format!("https://avatars.steamstatic.com/{}_medium.jpg", HASH),
        format!("http://avatars.steamstatic.com/{}_full.jpg", HASH),
        format!("https://avatars.steamstatic.com/{}.jpg", HASH),
        format!("https://avatars.steamstatic.com/{}", HASH),
        format!("{}/ab/{}_medium.jpg", CURRENT_AVATAR_BASE, HASH),
        "https://avatars.steamstatic.com/not-a-hash_medium.jpg".to_string(),
        "https://example.com/avatar.png".to_string(),
        "/api/steam-avatar/x.jpg".to_string(),
        "not a url at all".to_string(),
        String::new(),
    ]
}

#[test]
fn test_legacy_url_is_sharded() {
    let input = format!("https://avatars.steamstatic.com/{}_medium.jpg", HASH);
    let out = normalize(&input);

    assert_eq!(
        out,
        format!(
            "https://cdn.akamai.steamstatic.com/steamcommunity/public/images/avatars/ab/{}_medium.jpg",
            HASH
        )
    );
    assert!(out.contains(&format!("/{}/", &HASH[..2])));
    assert!(out.ends_with(&format!("{}_medium.jpg", HASH)));
}

#[test]
fn test_normalize_is_idempotent() {
    for input in samples() {
        let once = normalize(&input);
        assert_eq!(normalize(&once), once, "input: {:?}", input);
    }
}

#[test]
fn test_non_legacy_urls_unchanged() {
    for input in samples().into_iter().skip(4) {
        assert_eq!(normalize(&input), input);
    }
}

#[test]
fn test_uppercase_hash_keeps_case() {
    let upper = HASH.to_uppercase();
    let out = normalize(&format!("https://avatars.steamstatic.com/{}_small.jpg", upper));
    assert!(out.ends_with(&format!("/AB/{}_small.jpg", upper)));
    assert_eq!(extract_hash(&out), Some(upper.as_str()));
}
