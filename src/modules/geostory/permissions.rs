use async_trait::async_trait;
use axum::response::{IntoResponse, Response};

use super::repository::{Access, GeoStory};
use crate::{
    modules::auth::middleware::Principal,
    utils::{database::Database, response},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Destroy,
    ViewGrants,
    ChangeGrants,
}

impl Action {
    /// Read-only actions. Grants are never public, so viewing them is not one.
    pub fn is_safe(&self) -> bool {
        matches!(self, Action::List | Action::Retrieve)
    }
}

#[derive(Debug, PartialEq)]
pub enum Error {
    NotAuthenticated,
    PermissionDenied,
    UnexpectedError,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated => response::not_authenticated(),
            Self::PermissionDenied => response::permission_denied(),
            Self::UnexpectedError => response::unexpected("Failed to check permissions"),
        }
    }
}

#[async_trait]
pub trait Permission: Send + Sync {
    /// Checked before any record is loaded.
    async fn has_permission(&self, _principal: &Principal, _action: Action) -> Result<(), Error> {
        Ok(())
    }

    /// Checked against a record the caller can already see.
    async fn has_object_permission(
        &self,
        _db: &dyn Database,
        _principal: &Principal,
        _action: Action,
        _story: &GeoStory,
    ) -> Result<(), Error> {
        Ok(())
    }
}

/// Anyone may read; writing needs an authenticated caller.
pub struct IsAuthenticatedOrReadOnly;

#[async_trait]
impl Permission for IsAuthenticatedOrReadOnly {
    async fn has_permission(&self, principal: &Principal, action: Action) -> Result<(), Error> {
        if action.is_safe() || principal.is_authenticated() {
            Ok(())
        } else {
            Err(Error::NotAuthenticated)
        }
    }
}

/// Writes on a record are reserved for its owner, administrators, and users
/// holding a grant for that kind of write. Grants themselves are managed by
/// owner and administrators only.
pub struct IsOwnerOrReadOnly;

fn required_access(action: Action) -> Option<Access> {
    match action {
        Action::Update | Action::PartialUpdate => Some(Access::Change),
        Action::Destroy => Some(Access::Delete),
        _ => None,
    }
}

#[async_trait]
impl Permission for IsOwnerOrReadOnly {
    async fn has_object_permission(
        &self,
        db: &dyn Database,
        principal: &Principal,
        action: Action,
        story: &GeoStory,
    ) -> Result<(), Error> {
        if action.is_safe() {
            return Ok(());
        }

        let Some(user) = principal.user() else {
            return Err(Error::NotAuthenticated);
        };

        if principal.is_admin() || user.id == story.owner_id {
            return Ok(());
        }

        let Some(access) = required_access(action) else {
            return Err(Error::PermissionDenied);
        };

        let grants = db
            .find_geostory_grants(&story.id)
            .await
            .map_err(|_| Error::UnexpectedError)?;

        if grants
            .iter()
            .any(|grant| grant.user_id == user.id && grant.access == access)
        {
            Ok(())
        } else {
            Err(Error::PermissionDenied)
        }
    }
}
