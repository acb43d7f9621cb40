use super::{ContentService, DEFAULT_SEARCH_LIMIT};
use crate::application::queries::search;
use crate::application::scope::RenderScope;
use crate::application::store::QueryParams;
use crate::domain::entities::SearchHit;

const MAX_TERM_CHARS: usize = 100;

impl ContentService {
    /// Prefix search over post, project and service titles and bodies.
    pub async fn search(
        &self,
        scope: &RenderScope,
        term: &str,
        limit: Option<usize>,
    ) -> Vec<SearchHit> {
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let Some(pattern) = search_pattern(term) else {
            return Vec::new();
        };
        if limit == 0 {
            return Vec::new();
        }

        let params = QueryParams::new()
            .with("term", pattern)
            .with("limit", limit);
        let mut hits: Vec<SearchHit> = self.list(scope, &search::CONTENT, params).await;
        hits.truncate(limit);
        hits
    }
}

/// Build a GROQ `match` pattern from user input, or `None` for a blank term.
fn search_pattern(term: &str) -> Option<String> {
    let cleaned: String = term
        .chars()
        .filter(|ch| !matches!(ch, '*' | '"' | '\\'))
        .take(MAX_TERM_CHARS)
        .collect();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    (!cleaned.is_empty()).then(|| format!("{cleaned}*"))
}
