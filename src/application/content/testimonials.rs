use super::{
    ContentService, DEFAULT_FEATURED_TESTIMONIALS_LIMIT, DEFAULT_MIN_TESTIMONIAL_RATING,
};
use crate::application::queries::testimonials;
use crate::application::scope::RenderScope;
use crate::application::store::QueryParams;
use crate::domain::entities::TestimonialRecord;
use crate::domain::stats::TestimonialStats;

/// Filter for [`ContentService::featured_testimonials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeaturedTestimonials {
    pub limit: usize,
    pub min_rating: u8,
}

impl Default for FeaturedTestimonials {
    fn default() -> Self {
        Self {
            limit: DEFAULT_FEATURED_TESTIMONIALS_LIMIT,
            min_rating: DEFAULT_MIN_TESTIMONIAL_RATING,
        }
    }
}

impl ContentService {
    pub async fn all_testimonials(&self, scope: &RenderScope) -> Vec<TestimonialRecord> {
        self.list(scope, &testimonials::ALL, QueryParams::new())
            .await
    }

    pub async fn featured_testimonials(
        &self,
        scope: &RenderScope,
        filter: FeaturedTestimonials,
    ) -> Vec<TestimonialRecord> {
        if filter.limit == 0 {
            return Vec::new();
        }

        let params = QueryParams::new()
            .with("limit", filter.limit)
            .with("minRating", filter.min_rating);
        let mut featured: Vec<TestimonialRecord> =
            self.list(scope, &testimonials::FEATURED, params).await;
        featured.retain(|testimonial| testimonial.featured && testimonial.rating >= filter.min_rating);
        featured.truncate(filter.limit);
        featured
    }

    /// Derived from [`ContentService::all_testimonials`]; issues no query of its own.
    pub async fn testimonial_stats(&self, scope: &RenderScope) -> TestimonialStats {
        TestimonialStats::from_records(&self.all_testimonials(scope).await)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::FeaturedTestimonials;
    use crate::application::content::ContentService;
    use crate::application::content::test_support::StubStore;
    use crate::application::queries::testimonials;
    use crate::application::scope::RenderScope;

    fn testimonial(id: &str, rating: u8, featured: bool) -> serde_json::Value {
        json!({
            "_id": id,
            "_type": "testimonial",
            "authorName": "Client",
            "quote": "Solid",
            "rating": rating,
            "featured": featured
        })
    }

    #[tokio::test]
    async fn featured_testimonials_use_documented_defaults() {
        let store = Arc::new(StubStore::default().with(
            &testimonials::FEATURED,
            json!([
                testimonial("t1", 5, true),
                testimonial("t2", 3, true),
                testimonial("t3", 4, false),
                testimonial("t4", 4, true)
            ]),
        ));
        let service = ContentService::new(store.clone());
        let scope = RenderScope::new();

        let featured = service
            .featured_testimonials(&scope, FeaturedTestimonials::default())
            .await;

        let ids: Vec<_> = featured.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t4"]);
        let params = store
            .params_for(&testimonials::FEATURED)
            .expect("featured query issued");
        assert_eq!(params.get("limit"), Some(&json!(3)));
        assert_eq!(params.get("minRating"), Some(&json!(4)));
    }

    #[tokio::test]
    async fn fractional_rating_drops_only_that_testimonial() {
        let mut half_star = testimonial("t2", 4, false);
        half_star["rating"] = json!(4.5);
        let store = Arc::new(StubStore::default().with(
            &testimonials::ALL,
            json!([testimonial("t1", 5, true), half_star, testimonial("t3", 3, false)]),
        ));
        let service = ContentService::new(store.clone());
        let scope = RenderScope::new();

        let all = service.all_testimonials(&scope).await;

        let ids: Vec<_> = all.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t3"]);
    }

    #[tokio::test]
    async fn stats_compose_over_memoized_list() {
        let store = Arc::new(StubStore::default().with(
            &testimonials::ALL,
            json!([testimonial("t1", 5, true), testimonial("t2", 4, false)]),
        ));
        let service = ContentService::new(store.clone());
        let scope = RenderScope::new();

        let (all, stats) = tokio::join!(
            service.all_testimonials(&scope),
            service.testimonial_stats(&scope)
        );

        assert_eq!(all.len(), 2);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.average_rating, 4.5);
        assert_eq!(store.calls(), 1);
    }
}
