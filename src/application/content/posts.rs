use serde_json::json;

use super::{ContentService, DEFAULT_RECENT_POSTS_LIMIT, DEFAULT_RELATED_POSTS_LIMIT, clean_slug};
use crate::application::queries::{categories, posts};
use crate::application::scope::RenderScope;
use crate::application::store::QueryParams;
use crate::domain::entities::{CategoryRecord, PostRecord};

impl ContentService {
    pub async fn all_posts(&self, scope: &RenderScope) -> Vec<PostRecord> {
        self.list(scope, &posts::ALL, QueryParams::new()).await
    }

    /// Newest posts first, `limit` defaults to 3.
    pub async fn recent_posts(&self, scope: &RenderScope, limit: Option<usize>) -> Vec<PostRecord> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_POSTS_LIMIT);
        if limit == 0 {
            return Vec::new();
        }

        let mut posts: Vec<PostRecord> = self
            .list(scope, &posts::RECENT, QueryParams::new().with("limit", limit))
            .await;
        posts.truncate(limit);
        posts
    }

    pub async fn post_by_slug(&self, scope: &RenderScope, slug: &str) -> Option<PostRecord> {
        let slug = clean_slug(slug)?;
        self.single(scope, &posts::BY_SLUG, QueryParams::new().with("slug", slug))
            .await
    }

    pub async fn post_slugs(&self, scope: &RenderScope) -> Vec<String> {
        self.list(scope, &posts::SLUGS, QueryParams::new()).await
    }

    pub async fn posts_by_category(
        &self,
        scope: &RenderScope,
        category_slug: &str,
    ) -> Vec<PostRecord> {
        let Some(category) = clean_slug(category_slug) else {
            return Vec::new();
        };
        self.list(
            scope,
            &posts::BY_CATEGORY,
            QueryParams::new().with("category", category),
        )
        .await
    }

    /// Posts sharing at least one category with the post at `slug`, excluding it.
    pub async fn related_posts(
        &self,
        scope: &RenderScope,
        slug: &str,
        category_ids: &[String],
        limit: Option<usize>,
    ) -> Vec<PostRecord> {
        let limit = limit.unwrap_or(DEFAULT_RELATED_POSTS_LIMIT);
        let Some(slug) = clean_slug(slug) else {
            return Vec::new();
        };
        if category_ids.is_empty() || limit == 0 {
            return Vec::new();
        }

        let params = QueryParams::new()
            .with("slug", slug)
            .with("categoryIds", json!(category_ids))
            .with("limit", limit);
        let mut related: Vec<PostRecord> = self.list(scope, &posts::RELATED, params).await;
        related.retain(|post| post.slug != slug);
        related.truncate(limit);
        related
    }

    pub async fn categories(&self, scope: &RenderScope) -> Vec<CategoryRecord> {
        self.list(scope, &categories::ALL, QueryParams::new()).await
    }
}
