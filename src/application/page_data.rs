//! Page-level data assembled from the accessors.
//!
//! Every builder runs inside one [`RenderScope`] and awaits its accessors
//! concurrently. Missing data shows up as empty sections, never as an error.

use serde::Serialize;

use super::content::{ContentService, FeaturedTestimonials};
use super::scope::RenderScope;
use crate::domain::entities::{
    BackgroundRecord, CategoryRecord, PageRecord, PostRecord, ProjectRecord, SearchHit,
    ServiceRecord, SiteConfigRecord, TeamMemberRecord, TestimonialRecord,
};
use crate::domain::stats::{ProjectStats, TeamStats, TestimonialStats};

const HOME_HERO: &str = "home-hero";
const ABOUT_HERO: &str = "about-hero";
const ABOUT_SLUG: &str = "about";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePageData {
    pub site: Option<SiteConfigRecord>,
    pub hero: Option<BackgroundRecord>,
    pub services: Vec<ServiceRecord>,
    pub featured_projects: Vec<ProjectRecord>,
    pub project_stats: ProjectStats,
    pub testimonials: Vec<TestimonialRecord>,
    pub testimonial_stats: TestimonialStats,
    pub recent_posts: Vec<PostRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutPageData {
    pub site: Option<SiteConfigRecord>,
    pub page: Option<PageRecord>,
    pub hero: Option<BackgroundRecord>,
    pub team: Vec<TeamMemberRecord>,
    pub team_stats: TeamStats,
    pub testimonial_stats: TestimonialStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogIndexData {
    pub site: Option<SiteConfigRecord>,
    pub posts: Vec<PostRecord>,
    pub categories: Vec<CategoryRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPageData {
    pub site: Option<SiteConfigRecord>,
    pub post: PostRecord,
    pub related: Vec<PostRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPageData {
    pub site: Option<SiteConfigRecord>,
    pub project: ProjectRecord,
    pub more_projects: Vec<ProjectRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePageData {
    pub site: Option<SiteConfigRecord>,
    pub service: ServiceRecord,
    pub testimonials: Vec<TestimonialRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub term: String,
    pub hits: Vec<SearchHit>,
}

#[derive(Clone)]
pub struct PageDataService {
    content: ContentService,
}

impl PageDataService {
    pub fn new(content: ContentService) -> Self {
        Self { content }
    }

    pub fn content(&self) -> &ContentService {
        &self.content
    }

    pub async fn home(&self, scope: &RenderScope) -> HomePageData {
        let content = &self.content;
        let (
            site,
            hero,
            services,
            featured_projects,
            project_stats,
            testimonials,
            testimonial_stats,
            recent_posts,
        ) = futures::join!(
            content.site_config(scope),
            content.background(scope, HOME_HERO),
            content.all_services(scope),
            content.featured_projects(scope, None),
            content.project_stats(scope),
            content.featured_testimonials(scope, FeaturedTestimonials::default()),
            content.testimonial_stats(scope),
            content.recent_posts(scope, None),
        );

        HomePageData {
            site,
            hero,
            services,
            featured_projects,
            project_stats,
            testimonials,
            testimonial_stats,
            recent_posts,
        }
    }

    pub async fn about(&self, scope: &RenderScope) -> AboutPageData {
        let content = &self.content;
        let (site, page, hero, team, team_stats, testimonial_stats) = futures::join!(
            content.site_config(scope),
            content.page_by_slug(scope, ABOUT_SLUG),
            content.background(scope, ABOUT_HERO),
            content.team_members(scope),
            content.team_stats(scope),
            content.testimonial_stats(scope),
        );

        AboutPageData {
            site,
            page,
            hero,
            team,
            team_stats,
            testimonial_stats,
        }
    }

    pub async fn blog_index(&self, scope: &RenderScope, category: Option<&str>) -> BlogIndexData {
        let content = &self.content;
        let posts = async {
            match category {
                Some(category) => content.posts_by_category(scope, category).await,
                None => content.all_posts(scope).await,
            }
        };
        let (site, posts, categories) =
            futures::join!(content.site_config(scope), posts, content.categories(scope));

        BlogIndexData {
            site,
            posts,
            categories,
        }
    }

    /// `None` when the post does not exist or could not be loaded.
    pub async fn post(&self, scope: &RenderScope, slug: &str) -> Option<PostPageData> {
        let content = &self.content;
        let (site, post) = futures::join!(content.site_config(scope), content.post_by_slug(scope, slug));
        let post = post?;

        let category_ids: Vec<String> = post
            .categories
            .iter()
            .map(|category| category.id.clone())
            .collect();
        let related = content
            .related_posts(scope, &post.slug, &category_ids, None)
            .await;

        Some(PostPageData {
            site,
            post,
            related,
        })
    }

    pub async fn project(&self, scope: &RenderScope, slug: &str) -> Option<ProjectPageData> {
        let content = &self.content;
        let (site, project, featured) = futures::join!(
            content.site_config(scope),
            content.project_by_slug(scope, slug),
            content.featured_projects(scope, None),
        );
        let project = project?;
        let more_projects = featured
            .into_iter()
            .filter(|candidate| candidate.id != project.id)
            .collect();

        Some(ProjectPageData {
            site,
            project,
            more_projects,
        })
    }

    pub async fn service(&self, scope: &RenderScope, slug: &str) -> Option<ServicePageData> {
        let content = &self.content;
        let (site, service, testimonials) = futures::join!(
            content.site_config(scope),
            content.service_by_slug(scope, slug),
            content.featured_testimonials(scope, FeaturedTestimonials::default()),
        );

        Some(ServicePageData {
            site,
            service: service?,
            testimonials,
        })
    }

    pub async fn search(&self, scope: &RenderScope, term: &str) -> SearchResults {
        SearchResults {
            term: term.trim().to_string(),
            hits: self.content.search(scope, term, None).await,
        }
    }
}
