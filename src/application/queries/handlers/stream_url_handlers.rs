//! Stream URL Query Handlers
//!
//! 外部流地址短期缓存：命中且未过期直接返回，否则调用外部解析并 upsert

use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{StreamResolverPort, UrlCacheRecord, UrlCacheRepositoryPort};
use crate::application::queries::{ResolveStreamUrlQuery, ResolvedStreamUrl};

/// 外部流地址默认有效期：5 小时
pub const DEFAULT_URL_TTL_SECS: i64 = 5 * 60 * 60;

/// ResolveStreamUrl Handler - External URL Cache
pub struct ResolveStreamUrlHandler {
    url_cache: Arc<dyn UrlCacheRepositoryPort>,
    resolver: Arc<dyn StreamResolverPort>,
    ttl: Duration,
}

impl ResolveStreamUrlHandler {
    pub fn new(
        url_cache: Arc<dyn UrlCacheRepositoryPort>,
        resolver: Arc<dyn StreamResolverPort>,
        ttl: Duration,
    ) -> Self {
        Self {
            url_cache,
            resolver,
            ttl,
        }
    }

    pub async fn handle(
        &self,
        query: ResolveStreamUrlQuery,
    ) -> Result<ResolvedStreamUrl, ApplicationError> {
        let video_id = query.video_id;

        // 缓存读取失败不影响播放，按未命中处理
        match self.url_cache.find(&video_id).await {
            Ok(Some(record)) if record.is_live(Utc::now()) => {
                tracing::debug!(video_id = %video_id, "Stream URL cache hit");
                return Ok(ResolvedStreamUrl {
                    url: record.audio_url,
                    cached: true,
                });
            }
            Ok(Some(_)) => {
                tracing::debug!(video_id = %video_id, "Stream URL cache entry expired");
            }
            Ok(None) => {
                tracing::debug!(video_id = %video_id, "Stream URL cache miss");
            }
            Err(e) => {
                tracing::warn!(video_id = %video_id, error = %e, "Stream URL cache lookup failed");
            }
        }

        let started = std::time::Instant::now();
        let url = self.resolver.resolve(&video_id).await?;

        let record = UrlCacheRecord {
            video_id: video_id.clone(),
            audio_url: url.clone(),
            expires_at: Utc::now() + self.ttl,
        };
        if let Err(e) = self.url_cache.upsert(&record).await {
            tracing::warn!(video_id = %video_id, error = %e, "Failed to store stream URL");
        }

        tracing::info!(
            video_id = %video_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Stream URL resolved"
        );

        Ok(ResolvedStreamUrl { url, cached: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{
        video_id, FakeResolver, InMemoryUrlCache, ResolveBehavior, TEST_VIDEO_ID,
    };

    fn handler(
        cache: Arc<InMemoryUrlCache>,
        resolver: Arc<FakeResolver>,
    ) -> ResolveStreamUrlHandler {
        ResolveStreamUrlHandler::new(cache, resolver, Duration::seconds(DEFAULT_URL_TTL_SECS))
    }

    fn query() -> ResolveStreamUrlQuery {
        ResolveStreamUrlQuery {
            video_id: video_id(TEST_VIDEO_ID),
        }
    }

    #[tokio::test]
    async fn test_miss_resolves_and_stores_with_ttl() {
        let cache = Arc::new(InMemoryUrlCache::default());
        let resolver = Arc::new(FakeResolver::returning("https://cdn.example/a"));
        let handler = handler(cache.clone(), resolver.clone());

        let before = Utc::now();
        let resolved = handler.handle(query()).await.unwrap();
        assert_eq!(resolved.url, "https://cdn.example/a");
        assert!(!resolved.cached);
        assert_eq!(resolver.calls(), 1);

        let record = cache.get(&video_id(TEST_VIDEO_ID)).unwrap();
        let ttl = record.expires_at - before;
        assert!(ttl <= Duration::hours(5) + Duration::seconds(5));
        assert!(ttl >= Duration::hours(5) - Duration::seconds(5));
    }

    #[tokio::test]
    async fn test_live_entry_is_served_without_resolving() {
        let cache = Arc::new(InMemoryUrlCache::default());
        let resolver = Arc::new(FakeResolver::returning("https://cdn.example/fresh"));
        let handler = handler(cache.clone(), resolver.clone());

        handler.handle(query()).await.unwrap();
        let second = handler.handle(query()).await.unwrap();

        assert!(second.cached);
        assert_eq!(second.url, "https://cdn.example/fresh");
        assert_eq!(resolver.calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_never_returned() {
        let cache = Arc::new(InMemoryUrlCache::default());
        cache.insert(UrlCacheRecord {
            video_id: video_id(TEST_VIDEO_ID),
            audio_url: "https://cdn.example/stale".to_string(),
            expires_at: Utc::now() - Duration::seconds(1),
        });
        let resolver = Arc::new(FakeResolver::returning("https://cdn.example/new"));
        let handler = handler(cache.clone(), resolver.clone());

        let resolved = handler.handle(query()).await.unwrap();
        assert_eq!(resolved.url, "https://cdn.example/new");
        assert!(!resolved.cached);
        assert_eq!(resolver.calls(), 1);

        // upsert 覆盖，不追加
        assert_eq!(cache.len(), 1);
        let record = cache.get(&video_id(TEST_VIDEO_ID)).unwrap();
        assert_eq!(record.audio_url, "https://cdn.example/new");
        assert!(record.is_live(Utc::now()));
    }

    #[tokio::test]
    async fn test_failure_is_typed_and_not_cached() {
        let cache = Arc::new(InMemoryUrlCache::default());
        let resolver = Arc::new(FakeResolver::new(ResolveBehavior::Timeout));
        let handler = handler(cache.clone(), resolver.clone());

        let err = handler.handle(query()).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ExternalServiceTimeout(_)));

        resolver.set_behavior(ResolveBehavior::Unavailable);
        let err = handler.handle(query()).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ExternalServiceUnavailable(_)));

        resolver.set_behavior(ResolveBehavior::Empty);
        let err = handler.handle(query()).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ExternalServiceError(_)));

        assert_eq!(cache.len(), 0);
    }
}
