use super::{
    filters::{
        self, FieldFilter, FilterBackend, FilterRequest, PermissionScopeFilter, SearchFilter,
        SortFilter,
    },
    permissions::{self, Action, IsAuthenticatedOrReadOnly, IsOwnerOrReadOnly, Permission},
    repository::{GeoStory, GeoStoryQuery},
};
use crate::{
    modules::auth::middleware::Principal,
    utils::{database, pagination::PaginationPolicy},
};

/// The GeoStory resource as a configuration of collaborators: which
/// permissions guard it, how list queries are narrowed, and how they are
/// paged.
pub struct GeoStoryEndpoint {
    permissions: Vec<Box<dyn Permission>>,
    filters: Vec<Box<dyn FilterBackend>>,
    pub pagination: PaginationPolicy,
}

impl GeoStoryEndpoint {
    pub fn new(pagination: PaginationPolicy) -> Self {
        Self {
            permissions: vec![
                Box::new(IsAuthenticatedOrReadOnly),
                Box::new(IsOwnerOrReadOnly),
            ],
            filters: vec![
                Box::new(FieldFilter),
                Box::new(SortFilter),
                Box::new(SearchFilter),
                Box::new(PermissionScopeFilter),
            ],
            pagination,
        }
    }

    pub fn with_filters(mut self, filters: Vec<Box<dyn FilterBackend>>) -> Self {
        self.filters = filters;
        self
    }

    /// Every permission must pass; the first refusal is returned.
    pub async fn check_permissions(
        &self,
        principal: &Principal,
        action: Action,
    ) -> Result<(), permissions::Error> {
        for permission in &self.permissions {
            permission.has_permission(principal, action).await?;
        }

        Ok(())
    }

    pub async fn check_object_permissions(
        &self,
        db: &dyn database::Database,
        principal: &Principal,
        action: Action,
        story: &GeoStory,
    ) -> Result<(), permissions::Error> {
        for permission in &self.permissions {
            permission
                .has_object_permission(db, principal, action, story)
                .await?;
        }

        Ok(())
    }

    pub fn filter_query(
        &self,
        principal: &Principal,
        params: &[(String, String)],
    ) -> Result<GeoStoryQuery, filters::Error> {
        let request = FilterRequest { principal, params };

        self.filters
            .iter()
            .try_fold(GeoStoryQuery::default(), |query, backend| {
                backend.filter_query(&request, query)
            })
    }

    /// Detail lookup. Stories outside the caller's scope are reported as
    /// missing rather than forbidden.
    pub async fn get_object(
        &self,
        db: &dyn database::Database,
        principal: &Principal,
        id: &str,
    ) -> Result<Option<GeoStory>, database::Error> {
        db.find_geostory(id, &filters::scope_for(principal)).await
    }
}
