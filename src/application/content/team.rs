use super::ContentService;
use crate::application::queries::team;
use crate::application::scope::RenderScope;
use crate::application::store::QueryParams;
use crate::domain::entities::TeamMemberRecord;
use crate::domain::stats::TeamStats;

impl ContentService {
    pub async fn team_members(&self, scope: &RenderScope) -> Vec<TeamMemberRecord> {
        self.list(scope, &team::ALL, QueryParams::new()).await
    }

    /// Derived from [`ContentService::team_members`].
    pub async fn team_stats(&self, scope: &RenderScope) -> TeamStats {
        TeamStats::from_records(&self.team_members(scope).await)
    }
}
