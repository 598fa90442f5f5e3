use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::{
    database::Error,
    pagination::{Paginated, Pagination},
};

type Result<T> = std::result::Result<T, Error>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct GeoStory {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub data: serde_json::Value,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub struct CreateGeoStoryPayload {
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub data: serde_json::Value,
    pub is_public: bool,
}

/// `None` leaves a column untouched; `Some(None)` clears a nullable one.
#[derive(Default)]
pub struct UpdateGeoStoryPayload {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub thumbnail_url: Option<Option<String>>,
    pub data: Option<serde_json::Value>,
    pub is_public: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    View,
    Change,
    Delete,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::View => "view",
            Access::Change => "change",
            Access::Delete => "delete",
        }
    }
}

impl FromStr for Access {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "view" => Ok(Access::View),
            "change" => Ok(Access::Change),
            "delete" => Ok(Access::Delete),
            access => {
                tracing::error!("Unknown access level stored for a grant: {access}");
                Err(Error::UnexpectedError)
            }
        }
    }
}

/// A user other than the owner holding rights on a story.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Grant {
    pub user_id: String,
    pub access: Access,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Id,
    Title,
    Description,
    Owner,
    IsPublic,
    CreatedAt,
    UpdatedAt,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Bool,
    Timestamp,
}

impl Field {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Field::Id),
            "title" => Some(Field::Title),
            "description" => Some(Field::Description),
            "owner" | "owner_id" => Some(Field::Owner),
            "is_public" => Some(Field::IsPublic),
            "created_at" => Some(Field::CreatedAt),
            "updated_at" => Some(Field::UpdatedAt),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Title => "title",
            Field::Description => "description",
            Field::Owner => "owner_id",
            Field::IsPublic => "is_public",
            Field::CreatedAt => "created_at",
            Field::UpdatedAt => "updated_at",
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Id | Field::Title | Field::Description | Field::Owner => FieldKind::Text,
            Field::IsPublic => FieldKind::Bool,
            Field::CreatedAt | Field::UpdatedAt => FieldKind::Timestamp,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
    Exact,
    IContains,
    IStartsWith,
    In,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Lookup {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "exact" | "eq" => Some(Lookup::Exact),
            "icontains" => Some(Lookup::IContains),
            "istartswith" => Some(Lookup::IStartsWith),
            "in" => Some(Lookup::In),
            "gt" => Some(Lookup::Gt),
            "gte" => Some(Lookup::Gte),
            "lt" => Some(Lookup::Lt),
            "lte" => Some(Lookup::Lte),
            _ => None,
        }
    }

    pub fn applies_to(&self, kind: FieldKind) -> bool {
        match kind {
            FieldKind::Text => matches!(
                self,
                Lookup::Exact | Lookup::IContains | Lookup::IStartsWith | Lookup::In
            ),
            FieldKind::Bool => matches!(self, Lookup::Exact),
            FieldKind::Timestamp => matches!(
                self,
                Lookup::Exact | Lookup::Gt | Lookup::Gte | Lookup::Lt | Lookup::Lte
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Text(String),
    List(Vec<String>),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub field: Field,
    pub lookup: Lookup,
    pub value: Value,
    pub negated: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sort {
    pub field: Field,
    pub descending: bool,
}

/// The universe of stories a caller may see, before any other narrowing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    All,
    Public,
    VisibleTo(String),
}

/// Declarative description of a list query. Backends see the same value,
/// so the in-memory and SQL stores answer it identically.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoStoryQuery {
    pub scope: Scope,
    pub conditions: Vec<Condition>,
    pub search: Option<String>,
    pub ordering: Vec<Sort>,
}

impl Default for GeoStoryQuery {
    fn default() -> Self {
        Self {
            scope: Scope::Public,
            conditions: vec![],
            search: None,
            ordering: vec![],
        }
    }
}

impl GeoStoryQuery {
    /// Requested ordering (or newest first), always ending on `id` so that
    /// page boundaries are stable.
    pub fn effective_ordering(&self) -> Vec<Sort> {
        let mut ordering = if self.ordering.is_empty() {
            vec![Sort {
                field: Field::CreatedAt,
                descending: true,
            }]
        } else {
            self.ordering.clone()
        };

        if !ordering.iter().any(|sort| sort.field == Field::Id) {
            ordering.push(Sort {
                field: Field::Id,
                descending: false,
            });
        }

        ordering
    }
}

pub enum FieldValue<'a> {
    Text(Option<&'a str>),
    Bool(bool),
    Timestamp(Option<DateTime<Utc>>),
}

impl GeoStory {
    pub fn field(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::Id => FieldValue::Text(Some(&self.id)),
            Field::Title => FieldValue::Text(Some(&self.title)),
            Field::Description => FieldValue::Text(self.description.as_deref()),
            Field::Owner => FieldValue::Text(Some(&self.owner_id)),
            Field::IsPublic => FieldValue::Bool(self.is_public),
            Field::CreatedAt => FieldValue::Timestamp(Some(self.created_at)),
            Field::UpdatedAt => FieldValue::Timestamp(self.updated_at),
        }
    }
}

#[async_trait]
pub trait GeoStoryRepository: Send + Sync {
    async fn create_geostory(&self, payload: CreateGeoStoryPayload) -> Result<GeoStory>;

    /// Looks a story up by id, but only inside `scope`.
    async fn find_geostory(&self, id: &str, scope: &Scope) -> Result<Option<GeoStory>>;

    async fn find_geostories(
        &self,
        query: &GeoStoryQuery,
        pagination: &Pagination,
    ) -> Result<Paginated<GeoStory>>;

    async fn update_geostory(
        &self,
        id: &str,
        payload: UpdateGeoStoryPayload,
    ) -> Result<Option<GeoStory>>;

    /// Returns whether a story was removed.
    async fn delete_geostory(&self, id: &str) -> Result<bool>;

    async fn find_geostory_grants(&self, id: &str) -> Result<Vec<Grant>>;

    async fn replace_geostory_grants(&self, id: &str, grants: Vec<Grant>) -> Result<Vec<Grant>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ordering_defaults_to_newest_first_with_id_tiebreak() {
        let ordering = GeoStoryQuery::default().effective_ordering();

        assert_eq!(
            ordering,
            vec![
                Sort {
                    field: Field::CreatedAt,
                    descending: true
                },
                Sort {
                    field: Field::Id,
                    descending: false
                },
            ]
        );
    }

    #[test]
    fn explicit_id_sort_is_not_duplicated() {
        let query = GeoStoryQuery {
            ordering: vec![Sort {
                field: Field::Id,
                descending: true,
            }],
            ..Default::default()
        };

        assert_eq!(query.effective_ordering().len(), 1);
    }

    #[test]
    fn lookups_are_restricted_by_field_kind() {
        assert!(Lookup::IContains.applies_to(FieldKind::Text));
        assert!(!Lookup::Gt.applies_to(FieldKind::Text));
        assert!(!Lookup::IContains.applies_to(FieldKind::Bool));
        assert!(Lookup::Lte.applies_to(FieldKind::Timestamp));
    }

    #[test]
    fn serialized_story_reads_back_equal() {
        let story = GeoStory {
            id: "01J0000000000000000000000".to_string(),
            owner_id: "01J0000000000000000000001".to_string(),
            title: "Rivers of Europe".to_string(),
            description: None,
            thumbnail_url: Some("https://example.org/thumb.png".to_string()),
            data: json!({ "sections": [{ "type": "title", "contents": [] }] }),
            is_public: true,
            created_at: Utc::now(),
            updated_at: None,
        };

        let encoded = serde_json::to_string(&story).unwrap();
        let decoded: GeoStory = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, story);
    }

    #[test]
    fn unknown_access_level_is_an_error() {
        assert!("admin".parse::<Access>().is_err());
        assert_eq!("change".parse::<Access>().unwrap(), Access::Change);
    }
}
