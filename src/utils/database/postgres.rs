use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder, Row};
use ulid::Ulid;

use super::Error;
use crate::{
    modules::{
        auth::repository::{AccessToken, Session, SessionRepository},
        geostory::repository::{
            Condition, CreateGeoStoryPayload, GeoStory, GeoStoryQuery, GeoStoryRepository, Grant,
            Lookup, Scope, UpdateGeoStoryPayload, Value,
        },
        user::repository::{CreateUserPayload, User, UserRepository},
    },
    utils::pagination::{Paginated, Pagination},
};

type Result<T> = std::result::Result<T, Error>;

#[derive(Clone)]
pub struct PostgresDatabase {
    pub pool: PgPool,
}

fn unexpected(context: &str) -> impl FnOnce(sqlx::Error) -> Error + '_ {
    move |err| {
        tracing::error!("Error occurred while trying to {context}: {err}");
        Error::UnexpectedError
    }
}

/// `%` and `_` in user input must match literally under ILIKE.
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn push_scope(builder: &mut QueryBuilder<'_, Postgres>, scope: &Scope) {
    match scope {
        Scope::All => {}
        Scope::Public => {
            builder.push(" AND is_public = TRUE");
        }
        Scope::VisibleTo(user_id) => {
            builder.push(" AND (is_public = TRUE OR owner_id = ");
            builder.push_bind(user_id.clone());
            builder.push(
                " OR EXISTS (SELECT 1 FROM geostory_grants g \
                 WHERE g.geostory_id = geostories.id AND g.user_id = ",
            );
            builder.push_bind(user_id.clone());
            builder.push("))");
        }
    }
}

fn push_condition(builder: &mut QueryBuilder<'_, Postgres>, condition: &Condition) {
    let column = condition.field.column();

    // NULL satisfies no condition, so a negated one keeps NULL rows
    if condition.negated {
        builder.push(" AND NOT COALESCE((");
    } else {
        builder.push(" AND COALESCE((");
    }

    match (&condition.lookup, &condition.value) {
        (Lookup::IContains, Value::Text(text)) => {
            builder.push(column).push(" ILIKE ");
            builder.push_bind(format!("%{}%", escape_like(text)));
        }
        (Lookup::IStartsWith, Value::Text(text)) => {
            builder.push(column).push(" ILIKE ");
            builder.push_bind(format!("{}%", escape_like(text)));
        }
        (Lookup::In, Value::List(values)) => {
            builder.push(column).push(" = ANY(");
            builder.push_bind(values.clone());
            builder.push(")");
        }
        (lookup, value) => {
            let operator = match lookup {
                Lookup::Gt => " > ",
                Lookup::Gte => " >= ",
                Lookup::Lt => " < ",
                Lookup::Lte => " <= ",
                _ => " = ",
            };
            builder.push(column).push(operator);
            match value {
                Value::Text(text) => builder.push_bind(text.clone()),
                Value::Bool(flag) => builder.push_bind(*flag),
                Value::Timestamp(at) => builder.push_bind(*at),
                Value::List(values) => builder.push_bind(values.clone()),
            };
        }
    }

    builder.push("), FALSE)");
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &GeoStoryQuery) {
    push_scope(builder, &query.scope);

    for condition in &query.conditions {
        push_condition(builder, condition);
    }

    if let Some(term) = &query.search {
        let pattern = format!("%{}%", escape_like(term));
        builder.push(" AND (title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR COALESCE(description, '') ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

impl PostgresDatabase {
    pub async fn connect(database_url: &str) -> Result<Self> {
        PgPoolOptions::new()
            .max_connections(4)
            .connect(database_url)
            .await
            .map(|pool| Self { pool })
            .map_err(|err| {
                tracing::error!("Error connecting to database: {err}");
                Error::ConnectionFailed
            })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!().run(&self.pool).await.map_err(|err| {
            tracing::error!("{}", err);
            Error::MigrationFailed
        })
    }
}

#[async_trait]
impl UserRepository for PostgresDatabase {
    async fn create_user(&self, payload: CreateUserPayload) -> Result<User> {
        sqlx::query_as::<_, User>(
            "
            INSERT INTO users (id, username, password_hash, is_admin, is_active)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING *
            ",
        )
        .bind(Ulid::new().to_string())
        .bind(payload.username)
        .bind(payload.password_hash)
        .bind(payload.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected("create a user"))
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected("fetch a user by id"))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected("fetch a user by username"))
    }
}

#[async_trait]
impl SessionRepository for PostgresDatabase {
    async fn create_session(&self, session: Session) -> Result<Session> {
        sqlx::query_as::<_, Session>(
            "
            INSERT INTO sessions (key_digest, user_id, csrf_token, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(session.key_digest)
        .bind(session.user_id)
        .bind(session.csrf_token)
        .bind(session.expires_at)
        .bind(session.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected("create a session"))
    }

    async fn find_session(&self, key_digest: &str, now: DateTime<Utc>) -> Result<Option<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE key_digest = $1 AND expires_at > $2",
        )
        .bind(key_digest)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected("fetch a session"))
    }

    async fn delete_session(&self, key_digest: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE key_digest = $1")
            .bind(key_digest)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(unexpected("delete a session"))
    }

    async fn find_access_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AccessToken>> {
        sqlx::query_as::<_, AccessToken>(
            "SELECT * FROM oauth_access_tokens WHERE token_digest = $1 AND expires_at > $2",
        )
        .bind(token_digest)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected("fetch an access token"))
    }

    async fn purge_expired_credentials(&self, now: DateTime<Utc>) -> Result<u64> {
        let sessions = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(unexpected("purge expired sessions"))?;

        let tokens = sqlx::query("DELETE FROM oauth_access_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(unexpected("purge expired access tokens"))?;

        Ok(sessions.rows_affected() + tokens.rows_affected())
    }
}

#[async_trait]
impl GeoStoryRepository for PostgresDatabase {
    async fn create_geostory(&self, payload: CreateGeoStoryPayload) -> Result<GeoStory> {
        sqlx::query_as::<_, GeoStory>(
            "
            INSERT INTO geostories
            (id, owner_id, title, description, thumbnail_url, data, is_public)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            ",
        )
        .bind(Ulid::new().to_string())
        .bind(payload.owner_id)
        .bind(payload.title)
        .bind(payload.description)
        .bind(payload.thumbnail_url)
        .bind(payload.data)
        .bind(payload.is_public)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected("create a geostory"))
    }

    async fn find_geostory(&self, id: &str, scope: &Scope) -> Result<Option<GeoStory>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM geostories WHERE id = ");
        builder.push_bind(id.to_string());
        push_scope(&mut builder, scope);

        builder
            .build_query_as::<GeoStory>()
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected("fetch a geostory by id"))
    }

    async fn find_geostories(
        &self,
        query: &GeoStoryQuery,
        pagination: &Pagination,
    ) -> Result<Paginated<GeoStory>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM geostories WHERE TRUE");
        push_filters(&mut count, query);

        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected("count geostories"))?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM geostories WHERE TRUE");
        push_filters(&mut select, query);

        select.push(" ORDER BY ");
        let mut separated = select.separated(", ");
        for sort in query.effective_ordering() {
            separated.push(format!(
                "{} {} NULLS LAST",
                sort.field.column(),
                if sort.descending { "DESC" } else { "ASC" }
            ));
        }

        select.push(" LIMIT ");
        select.push_bind(pagination.limit() as i64);
        select.push(" OFFSET ");
        select.push_bind(pagination.offset() as i64);

        let items = select
            .build_query_as::<GeoStory>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected("fetch many geostories"))?;

        Ok(Paginated::new(items, total.max(0) as u64, pagination))
    }

    async fn update_geostory(
        &self,
        id: &str,
        payload: UpdateGeoStoryPayload,
    ) -> Result<Option<GeoStory>> {
        sqlx::query_as::<_, GeoStory>(
            "
            UPDATE geostories SET
                title = COALESCE($1, title),
                description = CASE WHEN $2 THEN $3 ELSE description END,
                thumbnail_url = CASE WHEN $4 THEN $5 ELSE thumbnail_url END,
                data = COALESCE($6, data),
                is_public = COALESCE($7, is_public),
                updated_at = NOW()
            WHERE
                id = $8
            RETURNING *
            ",
        )
        .bind(payload.title)
        .bind(payload.description.is_some())
        .bind(payload.description.flatten())
        .bind(payload.thumbnail_url.is_some())
        .bind(payload.thumbnail_url.flatten())
        .bind(payload.data)
        .bind(payload.is_public)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected("update a geostory"))
    }

    async fn delete_geostory(&self, id: &str) -> Result<bool> {
        sqlx::query("DELETE FROM geostories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map(|result| result.rows_affected() > 0)
            .map_err(unexpected("delete a geostory"))
    }

    async fn find_geostory_grants(&self, id: &str) -> Result<Vec<Grant>> {
        let rows = sqlx::query(
            "
            SELECT user_id, access FROM geostory_grants
            WHERE geostory_id = $1
            ORDER BY user_id, access
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected("fetch geostory grants"))?;

        rows.iter()
            .map(|row| {
                let access: String = row.get("access");
                Ok(Grant {
                    user_id: row.get("user_id"),
                    access: access.parse()?,
                })
            })
            .collect()
    }

    async fn replace_geostory_grants(&self, id: &str, grants: Vec<Grant>) -> Result<Vec<Grant>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(unexpected("start a grants transaction"))?;

        sqlx::query("DELETE FROM geostory_grants WHERE geostory_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected("clear geostory grants"))?;

        for grant in &grants {
            sqlx::query(
                "
                INSERT INTO geostory_grants (geostory_id, user_id, access)
                VALUES ($1, $2, $3)
                ON CONFLICT DO NOTHING
                ",
            )
            .bind(id)
            .bind(&grant.user_id)
            .bind(grant.access.as_str())
            .execute(&mut *tx)
            .await
            .map_err(unexpected("insert a geostory grant"))?;
        }

        tx.commit()
            .await
            .map_err(unexpected("commit geostory grants"))?;

        self.find_geostory_grants(id).await
    }
}
