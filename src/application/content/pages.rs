use super::{ContentService, clean_slug};
use crate::application::queries::pages;
use crate::application::scope::RenderScope;
use crate::application::store::QueryParams;
use crate::domain::entities::{BackgroundRecord, PageRecord, SiteConfigRecord};

impl ContentService {
    pub async fn page_by_slug(&self, scope: &RenderScope, slug: &str) -> Option<PageRecord> {
        let slug = clean_slug(slug)?;
        self.single(scope, &pages::BY_SLUG, QueryParams::new().with("slug", slug))
            .await
    }

    /// Background for a placement such as `home-hero` or `about-hero`.
    pub async fn background(&self, scope: &RenderScope, key: &str) -> Option<BackgroundRecord> {
        let key = clean_slug(key)?;
        self.single(scope, &pages::BACKGROUND, QueryParams::new().with("key", key))
            .await
    }

    pub async fn site_config(&self, scope: &RenderScope) -> Option<SiteConfigRecord> {
        self.single(scope, &pages::SITE_CONFIG, QueryParams::new())
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::application::content::ContentService;
    use crate::application::content::test_support::StubStore;
    use crate::application::queries::pages;
    use crate::application::scope::RenderScope;

    #[tokio::test]
    async fn malformed_site_config_falls_back_to_none() {
        let store = Arc::new(
            StubStore::default().with(&pages::SITE_CONFIG, json!({ "_id": "site", "title": 42 })),
        );
        let service = ContentService::new(store.clone());
        let scope = RenderScope::new();

        assert!(service.site_config(&scope).await.is_none());
        assert!(service.site_config(&scope).await.is_none());
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn background_binds_key_parameter() {
        let store = Arc::new(StubStore::default().with(
            &pages::BACKGROUND,
            json!({ "_id": "bg", "_type": "background", "key": "home-hero", "videoUrl": "https://cdn.example/hero.mp4" }),
        ));
        let service = ContentService::new(store.clone());
        let scope = RenderScope::new();

        let background = service
            .background(&scope, "home-hero")
            .await
            .expect("background");
        assert_eq!(background.video_url.as_deref(), Some("https://cdn.example/hero.mp4"));
        let params = store.params_for(&pages::BACKGROUND).expect("issued");
        assert_eq!(params.get("key"), Some(&json!("home-hero")));
    }
}
