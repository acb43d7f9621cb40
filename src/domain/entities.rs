//! Documents returned by the content store.
//!
//! Field names follow the projections in `application::queries`: every document
//! carries `_id` and `_type`, slugs are flattened to plain strings and image
//! references are resolved to URLs by the query.

use serde::{Deserialize, Deserializer, Serialize};
use time::{Date, OffsetDateTime};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// GROQ projects missing arrays and flags as `null`; treat those as the default.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Resolved image asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageRef {
    pub url: Option<String>,
    pub alt: Option<String>,
    pub lqip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRef {
    pub name: String,
    #[serde(default)]
    pub image: Option<ImageRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub main_image: Option<ImageRef>,
    #[serde(default)]
    pub author: Option<AuthorRef>,
    #[serde(default, deserialize_with = "nullable")]
    pub categories: Vec<CategoryRecord>,
    /// Portable-text body, only projected by the detail query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub featured: bool,
    #[serde(default, with = "iso_date::option")]
    pub completion_date: Option<Date>,
    #[serde(default)]
    pub cover_image: Option<ImageRef>,
    #[serde(default, deserialize_with = "nullable")]
    pub services: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub live_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub features: Vec<String>,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    pub author_name: String,
    #[serde(default)]
    pub author_role: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    pub quote: String,
    #[serde(default, deserialize_with = "nullable")]
    pub rating: u8,
    #[serde(default, deserialize_with = "nullable")]
    pub featured: bool,
    #[serde(default)]
    pub avatar: Option<ImageRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub photo: Option<ImageRef>,
    #[serde(default)]
    pub order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Page builder sections, passed through untouched.
    #[serde(default, deserialize_with = "nullable")]
    pub sections: Vec<serde_json::Value>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// Hero/section background keyed by placement (e.g. `home-hero`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    pub key: String,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub overlay_opacity: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfigRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    pub title: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub socials: Vec<SocialLink>,
}

/// A search match across posts, projects and services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::date;

    use super::*;

    #[test]
    fn project_parses_store_projection() {
        let raw = json!({
            "_id": "project-1",
            "_type": "project",
            "title": "Harbor",
            "slug": "harbor",
            "featured": true,
            "completionDate": "2024-05-17",
            "coverImage": { "url": "https://cdn.sanity.io/images/a.png", "alt": "Harbor" },
            "technologies": ["Rust", "Next.js"]
        });

        let project: ProjectRecord = serde_json::from_value(raw).expect("project parses");
        assert_eq!(project.completion_date, Some(date!(2024 - 05 - 17)));
        assert!(project.featured);
        assert!(project.services.is_empty());
        assert_eq!(
            project.cover_image.and_then(|image| image.url).as_deref(),
            Some("https://cdn.sanity.io/images/a.png")
        );
    }

    #[test]
    fn post_accepts_null_optional_fields() {
        let raw = json!({
            "_id": "post-1",
            "_type": "post",
            "title": "Launch",
            "slug": "launch",
            "excerpt": null,
            "publishedAt": "2024-02-01T09:30:00Z",
            "mainImage": null,
            "categories": null
        });

        let post: PostRecord = serde_json::from_value(raw).expect("post parses");
        assert!(post.excerpt.is_none());
        assert!(post.published_at.is_some());
        assert!(post.categories.is_empty());
    }
}
