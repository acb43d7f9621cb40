use std::cmp::Reverse;

use super::{ContentService, DEFAULT_FEATURED_PROJECTS_LIMIT, clean_slug};
use crate::application::queries::projects;
use crate::application::scope::RenderScope;
use crate::application::store::QueryParams;
use crate::domain::entities::ProjectRecord;
use crate::domain::stats::ProjectStats;

impl ContentService {
    pub async fn all_projects(&self, scope: &RenderScope) -> Vec<ProjectRecord> {
        self.list(scope, &projects::ALL, QueryParams::new()).await
    }

    /// Up to `limit` (default 3) featured projects, most recently completed first.
    pub async fn featured_projects(
        &self,
        scope: &RenderScope,
        limit: Option<usize>,
    ) -> Vec<ProjectRecord> {
        let limit = limit.unwrap_or(DEFAULT_FEATURED_PROJECTS_LIMIT);
        if limit == 0 {
            return Vec::new();
        }

        let mut featured: Vec<ProjectRecord> = self
            .list(
                scope,
                &projects::FEATURED,
                QueryParams::new().with("limit", limit),
            )
            .await;
        featured.retain(|project| project.featured);
        // Undated projects sort last.
        featured.sort_by_key(|project| Reverse(project.completion_date));
        featured.truncate(limit);
        featured
    }

    pub async fn project_by_slug(&self, scope: &RenderScope, slug: &str) -> Option<ProjectRecord> {
        let slug = clean_slug(slug)?;
        self.single(scope, &projects::BY_SLUG, QueryParams::new().with("slug", slug))
            .await
    }

    pub async fn project_slugs(&self, scope: &RenderScope) -> Vec<String> {
        self.list(scope, &projects::SLUGS, QueryParams::new()).await
    }

    /// Derived from [`ContentService::all_projects`]; issues no query of its own.
    pub async fn project_stats(&self, scope: &RenderScope) -> ProjectStats {
        ProjectStats::from_records(&self.all_projects(scope).await)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::application::content::ContentService;
    use crate::application::content::test_support::StubStore;
    use crate::application::queries::projects;
    use crate::application::scope::RenderScope;

    #[tokio::test]
    async fn featured_projects_requests_exactly_limit() {
        let store = Arc::new(StubStore::default().with(&projects::FEATURED, json!([])));
        let service = ContentService::new(store.clone());
        let scope = RenderScope::new();

        service.featured_projects(&scope, Some(4)).await;

        let params = store
            .params_for(&projects::FEATURED)
            .expect("featured query issued");
        assert_eq!(params.get("limit"), Some(&json!(4)));
    }

    #[tokio::test]
    async fn project_stats_reuse_all_projects() {
        let store = Arc::new(StubStore::default().with(
            &projects::ALL,
            json!([
                { "_id": "p1", "_type": "project", "title": "A", "slug": "a", "client": "Acme", "featured": true },
                { "_id": "p2", "_type": "project", "title": "B", "slug": "b", "client": "Acme" },
                { "_id": "p3", "_type": "project", "title": "C", "slug": "c", "client": "Globex" }
            ]),
        ));
        let service = ContentService::new(store.clone());
        let scope = RenderScope::new();

        let all = service.all_projects(&scope).await;
        let stats = service.project_stats(&scope).await;

        assert_eq!(all.len(), 3);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.featured, 1);
        assert_eq!(stats.clients, 2);
        assert_eq!(store.calls(), 1);
    }
}
