use super::{ContentService, clean_slug};
use crate::application::queries::services;
use crate::application::scope::RenderScope;
use crate::application::store::QueryParams;
use crate::domain::entities::ServiceRecord;

impl ContentService {
    pub async fn all_services(&self, scope: &RenderScope) -> Vec<ServiceRecord> {
        self.list(scope, &services::ALL, QueryParams::new()).await
    }

    pub async fn service_by_slug(&self, scope: &RenderScope, slug: &str) -> Option<ServiceRecord> {
        let slug = clean_slug(slug)?;
        self.single(scope, &services::BY_SLUG, QueryParams::new().with("slug", slug))
            .await
    }
}
