#![allow(dead_code)]

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Algorithm, Argon2, Params, Version,
};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use geostory_backend_rs::{
    app,
    modules::{
        auth::repository::AccessToken,
        geostory::repository::{CreateGeoStoryPayload, GeoStory, GeoStoryRepository},
        user::repository::User,
    },
    types::{Config, Context},
    utils::{database::MemoryDatabase, token},
};
use headers::{Authorization, HeaderMapExt};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use ulid::Ulid;

pub const PASSWORD: &str = "correct horse battery staple";

pub struct TestApp {
    pub db: Arc<MemoryDatabase>,
    pub router: Router,
}

pub fn config() -> Config {
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("memory://".to_string()),
        _ => None,
    })
    .unwrap()
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_context(|ctx| ctx)
    }

    /// Builds the app around a context the caller may adjust first.
    pub fn with_context(adjust: impl FnOnce(Context) -> Context) -> Self {
        let db = Arc::new(MemoryDatabase::new());
        let ctx = adjust(Context::new(&config(), db.clone()));

        Self {
            db,
            router: app::router(Arc::new(ctx)),
        }
    }

    pub async fn user(&self, username: &str) -> User {
        self.seed_user(username, false, true).await
    }

    pub async fn admin(&self, username: &str) -> User {
        self.seed_user(username, true, true).await
    }

    pub async fn seed_user(&self, username: &str, is_admin: bool, is_active: bool) -> User {
        // Cheap parameters keep the suite fast; verification reads them from the hash.
        let params = Params::new(1024, 1, 1, None).unwrap();
        let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);

        let user = User {
            id: Ulid::new().to_string(),
            username: username.to_string(),
            password_hash: hasher
                .hash_password(PASSWORD.as_bytes(), &salt)
                .unwrap()
                .to_string(),
            is_admin,
            is_active,
            created_at: Utc::now(),
        };
        self.db.insert_user(user.clone()).await;

        user
    }

    /// Stores a bearer token for `user` and returns its clear-text value.
    pub async fn access_token(&self, user: &User, ttl: Duration) -> String {
        let value = token::generate();
        let now = Utc::now();

        self.db
            .insert_access_token(AccessToken {
                token_digest: token::digest(&value),
                user_id: user.id.clone(),
                scope: "read write".to_string(),
                expires_at: now + ttl,
                created_at: now,
            })
            .await;

        value
    }

    pub async fn story(&self, owner: &User, title: &str, is_public: bool) -> GeoStory {
        self.db
            .create_geostory(CreateGeoStoryPayload {
                owner_id: owner.id.clone(),
                title: title.to_string(),
                description: None,
                thumbnail_url: None,
                data: json!({ "sections": [] }),
                is_public,
            })
            .await
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .find_map(|pair| {
                pair.strip_prefix(name)
                    .and_then(|rest| rest.strip_prefix('='))
                    .map(str::to_string)
            })
    }
}

pub enum As<'a> {
    Anonymous,
    Basic(&'a User),
    Password(&'a str, &'a str),
    Bearer(&'a str),
    Session { key: &'a str, csrf: Option<&'a str> },
}

pub fn request(method: Method, uri: &str, caller: As<'_>, body: Option<Value>) -> Request<Body> {
    let mut request = Request::builder().method(method).uri(uri);

    if body.is_some() {
        request = request.header(header::CONTENT_TYPE, "application/json");
    }

    let mut request = request
        .body(body.map_or_else(Body::empty, |body| Body::from(body.to_string())))
        .unwrap();

    match caller {
        As::Anonymous => {}
        As::Basic(user) => request
            .headers_mut()
            .typed_insert(Authorization::basic(&user.username, PASSWORD)),
        As::Password(username, password) => request
            .headers_mut()
            .typed_insert(Authorization::basic(username, password)),
        As::Bearer(token) => request
            .headers_mut()
            .typed_insert(Authorization::bearer(token).unwrap()),
        As::Session { key, csrf } => {
            let headers = request.headers_mut();
            headers.insert(
                header::COOKIE,
                format!("sessionid={key}").parse().unwrap(),
            );
            if let Some(csrf) = csrf {
                headers.insert("x-csrftoken", csrf.parse().unwrap());
            }
        }
    }

    request
}

pub fn get(uri: &str, caller: As<'_>) -> Request<Body> {
    request(Method::GET, uri, caller, None)
}
