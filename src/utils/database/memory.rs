use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use ulid::Ulid;

use super::Error;
use crate::{
    modules::{
        auth::repository::{AccessToken, Session, SessionRepository},
        geostory::repository::{
            Condition, CreateGeoStoryPayload, FieldValue, GeoStory, GeoStoryQuery,
            GeoStoryRepository, Grant, Lookup, Scope, Sort, UpdateGeoStoryPayload, Value,
        },
        user::repository::{CreateUserPayload, User, UserRepository},
    },
    utils::pagination::{Paginated, Pagination},
};

type Result<T> = std::result::Result<T, Error>;

#[derive(Default)]
struct State {
    users: HashMap<String, User>,
    sessions: HashMap<String, Session>,
    access_tokens: HashMap<String, AccessToken>,
    geostories: HashMap<String, GeoStory>,
    grants: HashMap<String, BTreeSet<Grant>>,
}

impl State {
    fn in_scope(&self, story: &GeoStory, scope: &Scope) -> bool {
        match scope {
            Scope::All => true,
            Scope::Public => story.is_public,
            Scope::VisibleTo(user_id) => {
                story.is_public
                    || &story.owner_id == user_id
                    || self
                        .grants
                        .get(&story.id)
                        .is_some_and(|grants| grants.iter().any(|g| &g.user_id == user_id))
            }
        }
    }
}

/// Process-local store answering the same queries as the PostgreSQL one.
#[derive(Default)]
pub struct MemoryDatabase {
    state: RwLock<State>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a fully formed user, e.g. one seeded with a known id.
    pub async fn insert_user(&self, user: User) {
        self.state.write().await.users.insert(user.id.clone(), user);
    }

    /// Access tokens are minted by the OAuth2 provider; this stands in for it.
    pub async fn insert_access_token(&self, token: AccessToken) {
        self.state
            .write()
            .await
            .access_tokens
            .insert(token.token_digest.clone(), token);
    }
}

fn condition_holds(condition: &Condition, story: &GeoStory) -> bool {
    let hit = match (story.field(condition.field), &condition.value) {
        (FieldValue::Text(Some(text)), Value::Text(value)) => match condition.lookup {
            Lookup::Exact => text == value,
            Lookup::IContains => text.to_lowercase().contains(&value.to_lowercase()),
            Lookup::IStartsWith => text.to_lowercase().starts_with(&value.to_lowercase()),
            _ => false,
        },
        (FieldValue::Text(Some(text)), Value::List(values)) => {
            condition.lookup == Lookup::In && values.iter().any(|value| value == text)
        }
        (FieldValue::Bool(flag), Value::Bool(value)) => {
            condition.lookup == Lookup::Exact && flag == *value
        }
        (FieldValue::Timestamp(Some(at)), Value::Timestamp(value)) => match condition.lookup {
            Lookup::Exact => at == *value,
            Lookup::Gt => at > *value,
            Lookup::Gte => at >= *value,
            Lookup::Lt => at < *value,
            Lookup::Lte => at <= *value,
            _ => false,
        },
        _ => false,
    };

    hit != condition.negated
}

fn search_holds(term: &str, story: &GeoStory) -> bool {
    let term = term.to_lowercase();

    story.title.to_lowercase().contains(&term)
        || story
            .description
            .as_deref()
            .is_some_and(|description| description.to_lowercase().contains(&term))
}

/// Case-insensitive text order with a byte-order tiebreak, close to what a
/// linguistic database collation yields for mixed-case titles.
fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn nulls_last<T: Ord>(a: Option<T>, b: Option<T>, descending: bool) -> Ordering {
    nulls_last_by(a, b, descending, T::cmp)
}

fn nulls_last_by<T>(
    a: Option<T>,
    b: Option<T>,
    descending: bool,
    cmp: impl Fn(&T, &T) -> Ordering,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) if descending => cmp(&b, &a),
        (Some(a), Some(b)) => cmp(&a, &b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
    }
}

fn compare(ordering: &[Sort], a: &GeoStory, b: &GeoStory) -> Ordering {
    for sort in ordering {
        let result = match (a.field(sort.field), b.field(sort.field)) {
            (FieldValue::Text(x), FieldValue::Text(y)) => {
                nulls_last_by(x, y, sort.descending, |a, b| collate(a, b))
            }
            (FieldValue::Bool(x), FieldValue::Bool(y)) => {
                nulls_last(Some(x), Some(y), sort.descending)
            }
            (FieldValue::Timestamp(x), FieldValue::Timestamp(y)) => {
                nulls_last(x, y, sort.descending)
            }
            _ => Ordering::Equal,
        };

        if result != Ordering::Equal {
            return result;
        }
    }

    Ordering::Equal
}

#[async_trait]
impl UserRepository for MemoryDatabase {
    async fn create_user(&self, payload: CreateUserPayload) -> Result<User> {
        let mut state = self.state.write().await;

        if state
            .users
            .values()
            .any(|user| user.username == payload.username)
        {
            tracing::error!("Username {} is already taken", payload.username);
            return Err(Error::UnexpectedError);
        }

        let user = User {
            id: Ulid::new().to_string(),
            username: payload.username,
            password_hash: payload.password_hash,
            is_admin: payload.is_admin,
            is_active: true,
            created_at: Utc::now(),
        };
        state.users.insert(user.id.clone(), user.clone());

        Ok(user)
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }
}

#[async_trait]
impl SessionRepository for MemoryDatabase {
    async fn create_session(&self, session: Session) -> Result<Session> {
        self.state
            .write()
            .await
            .sessions
            .insert(session.key_digest.clone(), session.clone());

        Ok(session)
    }

    async fn find_session(&self, key_digest: &str, now: DateTime<Utc>) -> Result<Option<Session>> {
        Ok(self
            .state
            .read()
            .await
            .sessions
            .get(key_digest)
            .filter(|session| session.expires_at > now)
            .cloned())
    }

    async fn delete_session(&self, key_digest: &str) -> Result<()> {
        self.state.write().await.sessions.remove(key_digest);
        Ok(())
    }

    async fn find_access_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AccessToken>> {
        Ok(self
            .state
            .read()
            .await
            .access_tokens
            .get(token_digest)
            .filter(|token| token.expires_at > now)
            .cloned())
    }

    async fn purge_expired_credentials(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.sessions.len() + state.access_tokens.len();

        state.sessions.retain(|_, session| session.expires_at > now);
        state.access_tokens.retain(|_, token| token.expires_at > now);

        let after = state.sessions.len() + state.access_tokens.len();
        Ok((before - after) as u64)
    }
}

#[async_trait]
impl GeoStoryRepository for MemoryDatabase {
    async fn create_geostory(&self, payload: CreateGeoStoryPayload) -> Result<GeoStory> {
        let story = GeoStory {
            id: Ulid::new().to_string(),
            owner_id: payload.owner_id,
            title: payload.title,
            description: payload.description,
            thumbnail_url: payload.thumbnail_url,
            data: payload.data,
            is_public: payload.is_public,
            created_at: Utc::now(),
            updated_at: None,
        };

        self.state
            .write()
            .await
            .geostories
            .insert(story.id.clone(), story.clone());

        Ok(story)
    }

    async fn find_geostory(&self, id: &str, scope: &Scope) -> Result<Option<GeoStory>> {
        let state = self.state.read().await;

        Ok(state
            .geostories
            .get(id)
            .filter(|story| state.in_scope(story, scope))
            .cloned())
    }

    async fn find_geostories(
        &self,
        query: &GeoStoryQuery,
        pagination: &Pagination,
    ) -> Result<Paginated<GeoStory>> {
        let state = self.state.read().await;

        let mut matching: Vec<&GeoStory> = state
            .geostories
            .values()
            .filter(|story| state.in_scope(story, &query.scope))
            .filter(|story| {
                query
                    .conditions
                    .iter()
                    .all(|condition| condition_holds(condition, story))
            })
            .filter(|story| {
                query
                    .search
                    .as_deref()
                    .map_or(true, |term| search_holds(term, story))
            })
            .collect();

        let ordering = query.effective_ordering();
        matching.sort_by(|a, b| compare(&ordering, a, b));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .cloned()
            .collect();

        Ok(Paginated::new(items, total, pagination))
    }

    async fn update_geostory(
        &self,
        id: &str,
        payload: UpdateGeoStoryPayload,
    ) -> Result<Option<GeoStory>> {
        let mut state = self.state.write().await;

        let Some(story) = state.geostories.get_mut(id) else {
            return Ok(None);
        };

        if let Some(title) = payload.title {
            story.title = title;
        }
        if let Some(description) = payload.description {
            story.description = description;
        }
        if let Some(thumbnail_url) = payload.thumbnail_url {
            story.thumbnail_url = thumbnail_url;
        }
        if let Some(data) = payload.data {
            story.data = data;
        }
        if let Some(is_public) = payload.is_public {
            story.is_public = is_public;
        }
        story.updated_at = Some(Utc::now());

        Ok(Some(story.clone()))
    }

    async fn delete_geostory(&self, id: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        state.grants.remove(id);

        Ok(state.geostories.remove(id).is_some())
    }

    async fn find_geostory_grants(&self, id: &str) -> Result<Vec<Grant>> {
        Ok(self
            .state
            .read()
            .await
            .grants
            .get(id)
            .map(|grants| grants.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn replace_geostory_grants(&self, id: &str, grants: Vec<Grant>) -> Result<Vec<Grant>> {
        let grants: BTreeSet<Grant> = grants.into_iter().collect();
        let result = grants.iter().cloned().collect();

        self.state
            .write()
            .await
            .grants
            .insert(id.to_string(), grants);

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::geostory::repository::{Access, Field};
    use serde_json::json;

    fn payload(owner_id: &str, title: &str, is_public: bool) -> CreateGeoStoryPayload {
        CreateGeoStoryPayload {
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            description: None,
            thumbnail_url: None,
            data: json!({}),
            is_public,
        }
    }

    fn first_page(page_size: u32) -> Pagination {
        Pagination { page: 1, page_size }
    }

    #[tokio::test]
    async fn scope_restricts_to_public_owned_and_granted() {
        let db = MemoryDatabase::new();
        let public = db.create_geostory(payload("alice", "public", true)).await.unwrap();
        let owned = db.create_geostory(payload("bob", "owned", false)).await.unwrap();
        let shared = db.create_geostory(payload("alice", "shared", false)).await.unwrap();
        db.create_geostory(payload("alice", "hidden", false)).await.unwrap();
        db.replace_geostory_grants(
            &shared.id,
            vec![Grant {
                user_id: "bob".to_string(),
                access: Access::View,
            }],
        )
        .await
        .unwrap();

        let query = GeoStoryQuery {
            scope: Scope::VisibleTo("bob".to_string()),
            ..Default::default()
        };
        let page = db.find_geostories(&query, &first_page(10)).await.unwrap();

        let mut ids: Vec<String> = page.items.into_iter().map(|story| story.id).collect();
        ids.sort();
        let mut expected = vec![public.id, owned.id, shared.id];
        expected.sort();
        assert_eq!(ids, expected);
        assert_eq!(page.meta.total, 3);
    }

    #[tokio::test]
    async fn negated_condition_keeps_missing_values() {
        let db = MemoryDatabase::new();
        let mut described = payload("alice", "described", true);
        described.description = Some("A draft about glaciers".to_string());
        db.create_geostory(described).await.unwrap();
        let bare = db.create_geostory(payload("alice", "bare", true)).await.unwrap();

        let query = GeoStoryQuery {
            conditions: vec![Condition {
                field: Field::Description,
                lookup: Lookup::IContains,
                value: Value::Text("DRAFT".to_string()),
                negated: true,
            }],
            ..Default::default()
        };
        let page = db.find_geostories(&query, &first_page(10)).await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, bare.id);
    }

    #[tokio::test]
    async fn sorts_with_missing_values_last() {
        let db = MemoryDatabase::new();
        let untouched = db.create_geostory(payload("alice", "a", true)).await.unwrap();
        let edited = db.create_geostory(payload("alice", "b", true)).await.unwrap();
        db.update_geostory(
            &edited.id,
            UpdateGeoStoryPayload {
                title: Some("b2".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        for descending in [false, true] {
            let query = GeoStoryQuery {
                ordering: vec![Sort {
                    field: Field::UpdatedAt,
                    descending,
                }],
                ..Default::default()
            };
            let page = db.find_geostories(&query, &first_page(10)).await.unwrap();

            assert_eq!(page.items[0].id, edited.id);
            assert_eq!(page.items[1].id, untouched.id);
        }
    }

    #[tokio::test]
    async fn text_sorts_ignore_case() {
        let db = MemoryDatabase::new();
        for title in ["charlie", "Bravo", "alpha", "Alpha"] {
            db.create_geostory(payload("alice", title, true)).await.unwrap();
        }

        let query = GeoStoryQuery {
            ordering: vec![Sort {
                field: Field::Title,
                descending: false,
            }],
            ..Default::default()
        };
        let page = db.find_geostories(&query, &first_page(10)).await.unwrap();
        let titles: Vec<&str> = page.items.iter().map(|story| story.title.as_str()).collect();

        assert_eq!(titles, vec!["Alpha", "alpha", "Bravo", "charlie"]);
    }

    #[tokio::test]
    async fn update_clears_nullable_fields_only_when_asked() {
        let db = MemoryDatabase::new();
        let mut with_thumbnail = payload("alice", "story", true);
        with_thumbnail.thumbnail_url = Some("https://example.org/t.png".to_string());
        with_thumbnail.description = Some("keep me".to_string());
        let story = db.create_geostory(with_thumbnail).await.unwrap();

        let updated = db
            .update_geostory(
                &story.id,
                UpdateGeoStoryPayload {
                    thumbnail_url: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.thumbnail_url, None);
        assert_eq!(updated.description.as_deref(), Some("keep me"));
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn purge_drops_only_expired_credentials() {
        let db = MemoryDatabase::new();
        let now = Utc::now();
        for (key, offset) in [("old", -10), ("fresh", 10)] {
            db.create_session(Session {
                key_digest: key.to_string(),
                user_id: "alice".to_string(),
                csrf_token: "csrf".to_string(),
                expires_at: now + chrono::Duration::seconds(offset),
                created_at: now,
            })
            .await
            .unwrap();
        }

        assert_eq!(db.purge_expired_credentials(now).await.unwrap(), 1);
        assert!(db.find_session("fresh", now).await.unwrap().is_some());
        assert!(db.find_session("old", now).await.unwrap().is_none());
    }
}
