#[cfg(test)]
mod test {

    use std::sync::Arc;
    use std::time::Duration;

    use secrecy::SecretString;
    use tokio::time::Instant;

    use crate::cache::token::Token;
    use crate::cache::token_cache::TokenCache;
    use crate::manager::token_manager::TokenManager;
    use crate::tests::common::{test_credential, MockTokenClient};

    const MARGIN: Duration = Duration::from_secs(30);

    fn token(value: &str, now: Instant, lifetime_seconds: u64) -> Token {
        Token::issued_at(SecretString::from(value.to_owned()), now, lifetime_seconds)
    }

    #[test]
    fn empty_cache_is_invalid() {
        let cache = TokenCache::new(MARGIN);
        assert!(!cache.is_valid(Instant::now()));
        assert!(cache.read().is_none());
    }

    #[test]
    fn safety_margin_boundaries() {
        let cache = TokenCache::new(MARGIN);
        let now = Instant::now();

        cache.replace(token("short", now, 29));
        assert!(!cache.is_valid(now), "29s left is inside the 30s margin");

        cache.replace(token("exact", now, 30));
        assert!(!cache.is_valid(now), "expiring exactly at the margin is not usable");

        cache.replace(token("long", now, 31));
        assert!(cache.is_valid(now), "31s left is outside the 30s margin");
    }

    #[test]
    fn replace_swaps_whole_token() {
        let cache = TokenCache::new(MARGIN);
        let now = Instant::now();

        let first = cache.replace(token("first", now, 3600));
        let second = cache.replace(token("second", now, 60));

        let current = cache.read().unwrap();
        assert!(Arc::ptr_eq(&current, &second));
        assert!(!Arc::ptr_eq(&current, &first));
        assert_eq!(current.value(), "second");
        assert_eq!(current.expires_at, now + Duration::from_secs(60));
    }

    #[test]
    fn read_valid_filters_stale_token() {
        let cache = TokenCache::new(MARGIN);
        let now = Instant::now();
        cache.replace(token("stale", now, 10));

        assert!(cache.read_valid(now).is_none());
        assert_eq!(cache.read().unwrap().value(), "stale");
    }

    #[tokio::test]
    async fn subscribers_see_replacements() {
        let cache = TokenCache::new(MARGIN);
        let mut rx = cache.subscribe();

        cache.replace(token("fresh", Instant::now(), 3600));
        rx.changed().await.unwrap();
        let seen = rx.borrow().clone().unwrap();
        assert_eq!(seen.value(), "fresh");
    }

    #[test]
    fn huge_lifetime_does_not_overflow() {
        let now = Instant::now();
        let token = token("forever", now, u64::MAX);
        assert!(token.is_usable_at(now, MARGIN));
    }

    #[tokio::test(start_paused = true)]
    async fn lifetime_override_drives_refresh_schedule() {
        let client = Arc::new(MockTokenClient::new(3600));
        let manager = TokenManager::new(test_credential("http://unused"), client.clone())
            .with_lifetime_override(Some(60));

        let t1 = manager.get_token().await.unwrap();
        assert_eq!(client.calls(), 1);

        let again = manager.get_token().await.unwrap();
        assert_eq!(again, t1);
        assert_eq!(client.calls(), 1, "valid token must be served from cache");

        tokio::time::advance(Duration::from_secs(35)).await;

        let t2 = manager.get_token().await.unwrap();
        assert_ne!(t2, t1);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn server_lifetime_used_without_override() {
        let client = Arc::new(MockTokenClient::new(120));
        let manager = TokenManager::new(test_credential("http://unused"), client.clone());

        let t1 = manager.get_token().await.unwrap();

        // 120s lifetime, 30s margin: still usable at +89s, not at +90s
        tokio::time::advance(Duration::from_secs(89)).await;
        assert_eq!(manager.get_token().await.unwrap(), t1);
        assert_eq!(client.calls(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_ne!(manager.get_token().await.unwrap(), t1);
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_safety_margin_is_honored() {
        let client = Arc::new(MockTokenClient::new(60));
        let manager = TokenManager::new(test_credential("http://unused"), client.clone())
            .with_safety_margin(Duration::from_secs(5));

        manager.get_token().await.unwrap();
        tokio::time::advance(Duration::from_secs(50)).await;
        manager.get_token().await.unwrap();
        assert_eq!(client.calls(), 1);

        tokio::time::advance(Duration::from_secs(5)).await;
        manager.get_token().await.unwrap();
        assert_eq!(client.calls(), 2);
    }
}
