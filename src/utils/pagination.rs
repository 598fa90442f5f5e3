use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    RequestPartsExt,
};
use serde::{Deserialize, Serialize};

use super::response;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: PaginatedMeta,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PaginatedMeta {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: &Pagination) -> Paginated<T> {
        let page_size = u64::from(pagination.page_size);

        Self {
            items,
            meta: PaginatedMeta {
                total,
                page: pagination.page,
                page_size: pagination.page_size,
                pages: total.div_ceil(page_size),
            },
        }
    }
}

/// Page selection as sent by the client, before the policy is applied.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct PageRequest {
    pub page: Option<u32>,
    #[serde(alias = "per_page")]
    pub page_size: Option<u32>,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for PageRequest {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extract::<Query<PageRequest>>().await {
            Ok(Query(request)) => Ok(request),
            Err(err) => {
                tracing::debug!("Rejected pagination options: {err}");
                Err(response::error(
                    StatusCode::BAD_REQUEST,
                    response::VALIDATION_ERROR,
                    "Invalid pagination options",
                )
                .into_response())
            }
        }
    }
}

/// A resolved page: `page` is 1-based and `page_size` is within policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PaginationPolicy {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Error {
    InvalidPage,
    InvalidPageSize,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let message = match self {
            Self::InvalidPage => "page must be at least 1",
            Self::InvalidPageSize => "page_size must be at least 1",
        };

        response::error(StatusCode::BAD_REQUEST, response::VALIDATION_ERROR, message)
            .into_response()
    }
}

impl PaginationPolicy {
    /// Oversized pages are clamped rather than rejected.
    pub fn resolve(&self, request: &PageRequest) -> Result<Pagination, Error> {
        let page = match request.page {
            Some(0) => return Err(Error::InvalidPage),
            Some(page) => page,
            None => 1,
        };

        let page_size = match request.page_size {
            Some(0) => return Err(Error::InvalidPageSize),
            Some(page_size) => page_size.min(self.max_page_size),
            None => self.default_page_size,
        };

        Ok(Pagination { page, page_size })
    }
}
