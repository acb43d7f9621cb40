//! Registry of read-only GROQ queries, grouped by the entity they target.
//!
//! Every query is a static template; values are bound through `$name`
//! placeholders and shipped separately as query parameters.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Entity {
    Post,
    Category,
    Project,
    Service,
    Testimonial,
    TeamMember,
    Page,
    Background,
    SiteConfig,
    Search,
}

/// A named, parameterized, read-only query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Query {
    pub name: &'static str,
    pub entity: Entity,
    pub text: &'static str,
}

impl Query {
    const fn new(name: &'static str, entity: Entity, text: &'static str) -> Self {
        Self { name, entity, text }
    }

    /// Placeholder names referenced by the query text, without the `$` sigil.
    pub fn placeholders(&self) -> Vec<&'static str> {
        let text = self.text;
        let bytes = text.as_bytes();
        let mut names: Vec<&'static str> = Vec::new();
        let mut index = 0;
        while index < bytes.len() {
            if bytes[index] == b'$' {
                let start = index + 1;
                let mut end = start;
                while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                if end > start && !names.contains(&&text[start..end]) {
                    names.push(&text[start..end]);
                }
                index = end;
            } else {
                index += 1;
            }
        }
        names
    }
}

macro_rules! image {
    ($field:literal) => {
        concat!(
            "\"",
            $field,
            "\": ",
            $field,
            "{ \"url\": asset->url, alt, \"lqip\": asset->metadata.lqip }"
        )
    };
}

macro_rules! post_card {
    () => {
        concat!(
            "{ _id, _type, title, \"slug\": slug.current, excerpt, publishedAt, ",
            image!("mainImage"),
            ", \"author\": author->{ name, ",
            image!("image"),
            " }, \"categories\": categories[]->{ _id, title, \"slug\": slug.current, description } }"
        )
    };
}

macro_rules! post_detail {
    () => {
        concat!(
            "{ _id, _type, title, \"slug\": slug.current, excerpt, publishedAt, body, ",
            image!("mainImage"),
            ", \"author\": author->{ name, ",
            image!("image"),
            " }, \"categories\": categories[]->{ _id, title, \"slug\": slug.current, description } }"
        )
    };
}

macro_rules! project_card {
    () => {
        concat!(
            "{ _id, _type, title, \"slug\": slug.current, client, summary, featured, completionDate, ",
            image!("coverImage"),
            ", \"services\": services[]->title, technologies, liveUrl }"
        )
    };
}

macro_rules! service_card {
    () => {
        "{ _id, _type, title, \"slug\": slug.current, summary, icon, features, order }"
    };
}

macro_rules! testimonial_card {
    () => {
        concat!(
            "{ _id, _type, authorName, authorRole, company, quote, rating, featured, ",
            image!("avatar"),
            " }"
        )
    };
}

pub mod posts {
    use super::{Entity, Query};

    pub const ALL: Query = Query::new(
        "posts.all",
        Entity::Post,
        concat!(
            "*[_type == \"post\" && defined(slug.current)] | order(publishedAt desc) ",
            post_card!()
        ),
    );

    pub const RECENT: Query = Query::new(
        "posts.recent",
        Entity::Post,
        concat!(
            "*[_type == \"post\" && defined(slug.current)] | order(publishedAt desc) [0...$limit] ",
            post_card!()
        ),
    );

    pub const BY_SLUG: Query = Query::new(
        "posts.by_slug",
        Entity::Post,
        concat!(
            "*[_type == \"post\" && slug.current == $slug][0] ",
            post_detail!()
        ),
    );

    pub const SLUGS: Query = Query::new(
        "posts.slugs",
        Entity::Post,
        "*[_type == \"post\" && defined(slug.current)][].slug.current",
    );

    pub const BY_CATEGORY: Query = Query::new(
        "posts.by_category",
        Entity::Post,
        concat!(
            "*[_type == \"post\" && $category in categories[]->slug.current] | order(publishedAt desc) ",
            post_card!()
        ),
    );

    pub const RELATED: Query = Query::new(
        "posts.related",
        Entity::Post,
        concat!(
            "*[_type == \"post\" && slug.current != $slug && count(categories[@._ref in $categoryIds]) > 0] ",
            "| order(publishedAt desc) [0...$limit] ",
            post_card!()
        ),
    );
}

pub mod categories {
    use super::{Entity, Query};

    pub const ALL: Query = Query::new(
        "categories.all",
        Entity::Category,
        "*[_type == \"category\"] | order(title asc) { _id, title, \"slug\": slug.current, description }",
    );
}

pub mod projects {
    use super::{Entity, Query};

    pub const ALL: Query = Query::new(
        "projects.all",
        Entity::Project,
        concat!(
            "*[_type == \"project\" && defined(slug.current)] | order(completionDate desc) ",
            project_card!()
        ),
    );

    pub const FEATURED: Query = Query::new(
        "projects.featured",
        Entity::Project,
        concat!(
            "*[_type == \"project\" && featured == true] | order(completionDate desc) [0...$limit] ",
            project_card!()
        ),
    );

    pub const BY_SLUG: Query = Query::new(
        "projects.by_slug",
        Entity::Project,
        concat!(
            "*[_type == \"project\" && slug.current == $slug][0] ",
            "{ _id, _type, title, \"slug\": slug.current, client, summary, featured, completionDate, body, ",
            image!("coverImage"),
            ", \"services\": services[]->title, technologies, liveUrl }"
        ),
    );

    pub const SLUGS: Query = Query::new(
        "projects.slugs",
        Entity::Project,
        "*[_type == \"project\" && defined(slug.current)][].slug.current",
    );
}

pub mod services {
    use super::{Entity, Query};

    pub const ALL: Query = Query::new(
        "services.all",
        Entity::Service,
        concat!(
            "*[_type == \"service\"] | order(order asc) ",
            service_card!()
        ),
    );

    pub const BY_SLUG: Query = Query::new(
        "services.by_slug",
        Entity::Service,
        "*[_type == \"service\" && slug.current == $slug][0] { _id, _type, title, \"slug\": slug.current, summary, icon, features, order, body }",
    );
}

pub mod testimonials {
    use super::{Entity, Query};

    pub const ALL: Query = Query::new(
        "testimonials.all",
        Entity::Testimonial,
        concat!(
            "*[_type == \"testimonial\"] | order(_createdAt desc) ",
            testimonial_card!()
        ),
    );

    pub const FEATURED: Query = Query::new(
        "testimonials.featured",
        Entity::Testimonial,
        concat!(
            "*[_type == \"testimonial\" && featured == true && rating >= $minRating] ",
            "| order(rating desc, _createdAt desc) [0...$limit] ",
            testimonial_card!()
        ),
    );
}

pub mod team {
    use super::{Entity, Query};

    pub const ALL: Query = Query::new(
        "team.all",
        Entity::TeamMember,
        concat!(
            "*[_type == \"teamMember\"] | order(order asc) { _id, _type, name, role, department, bio, ",
            image!("photo"),
            ", order }"
        ),
    );
}

pub mod pages {
    use super::{Entity, Query};

    pub const BY_SLUG: Query = Query::new(
        "pages.by_slug",
        Entity::Page,
        "*[_type == \"page\" && slug.current == $slug][0] { _id, _type, title, \"slug\": slug.current, description, sections, \"updatedAt\": _updatedAt }",
    );

    pub const BACKGROUND: Query = Query::new(
        "pages.background",
        Entity::Background,
        concat!(
            "*[_type == \"background\" && key == $key][0] { _id, _type, key, ",
            image!("image"),
            ", videoUrl, overlayOpacity }"
        ),
    );

    pub const SITE_CONFIG: Query = Query::new(
        "pages.site_config",
        Entity::SiteConfig,
        "*[_type == \"siteConfig\"][0] { _id, _type, title, tagline, contactEmail, phone, address, socials[]{ platform, url } }",
    );
}

pub mod search {
    use super::{Entity, Query};

    pub const CONTENT: Query = Query::new(
        "search.content",
        Entity::Search,
        concat!(
            "*[_type in [\"post\", \"project\", \"service\"] && defined(slug.current) ",
            "&& (title match $term || pt::text(body) match $term)] ",
            "| order(_updatedAt desc) [0...$limit] ",
            "{ _id, _type, title, \"slug\": slug.current, \"excerpt\": coalesce(excerpt, summary) }"
        ),
    );
}

/// Every registered query, in declaration order.
pub const ALL_QUERIES: &[Query] = &[
    posts::ALL,
    posts::RECENT,
    posts::BY_SLUG,
    posts::SLUGS,
    posts::BY_CATEGORY,
    posts::RELATED,
    categories::ALL,
    projects::ALL,
    projects::FEATURED,
    projects::BY_SLUG,
    projects::SLUGS,
    services::ALL,
    services::BY_SLUG,
    testimonials::ALL,
    testimonials::FEATURED,
    team::ALL,
    pages::BY_SLUG,
    pages::BACKGROUND,
    pages::SITE_CONFIG,
    search::CONTENT,
];

/// Look up a registered query by name.
pub fn by_name(name: &str) -> Option<Query> {
    ALL_QUERIES.iter().copied().find(|query| query.name == name)
}
