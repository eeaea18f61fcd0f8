//! Shared fixtures for the users HTTP tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use core_config::{Environment, server::ServerConfig};
use domain_users::{
    ApiDoc, SortOrder, User, UserChanges, UserError, UserQuery, UserRepository, UserResult,
    UserService, handlers,
};
use http_body_util::BodyExt;
use mongodb::bson::{DateTime, oid::ObjectId};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// In-memory UserRepository with a unique email constraint.
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<Mutex<Vec<User>>>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryUserRepository {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn with_user<T>(&self, id: ObjectId, f: impl FnOnce(&mut User) -> Option<T>) -> Option<T> {
        let mut users = self.users.lock().unwrap();
        users.iter_mut().find(|u| u.id == id).and_then(f)
    }
}

fn contains(haystack: &str, needle: &Option<String>) -> bool {
    needle
        .as_ref()
        .is_none_or(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: User) -> UserResult<User> {
        self.touch();
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(UserError::DuplicateEmail);
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: ObjectId) -> UserResult<Option<User>> {
        self.touch();
        Ok(self.with_user(id, |u| Some(u.clone())))
    }

    async fn find(&self, query: UserQuery) -> UserResult<Vec<User>> {
        self.touch();
        let mut users: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| query.include_deleted || !u.is_deleted())
            .filter(|u| contains(&u.first_name, &query.first_name))
            .filter(|u| contains(&u.last_name, &query.last_name))
            .filter(|u| contains(&u.email, &query.email))
            .cloned()
            .collect();

        if let Some((field, order)) = query.sort {
            users.sort_by(|a, b| {
                let key = |u: &User| match field {
                    domain_users::SortField::FirstName => u.first_name.clone(),
                    domain_users::SortField::LastName => u.last_name.clone(),
                    domain_users::SortField::Email => u.email.clone(),
                };
                match order {
                    SortOrder::Asc => key(a).cmp(&key(b)),
                    SortOrder::Desc => key(b).cmp(&key(a)),
                }
            });
        }

        let skip = query.offset.unwrap_or(0) as usize;
        let take = query.limit.map_or(usize::MAX, |l| l as usize);
        Ok(users.into_iter().skip(skip).take(take).collect())
    }

    async fn update(
        &self,
        id: ObjectId,
        changes: UserChanges,
        modified_at: DateTime,
    ) -> UserResult<Option<User>> {
        self.touch();
        Ok(self.with_user(id, |u| {
            if let Some(first_name) = changes.first_name {
                u.first_name = first_name;
            }
            if let Some(last_name) = changes.last_name {
                u.last_name = last_name;
            }
            u.last_modified_at = modified_at;
            Some(u.clone())
        }))
    }

    async fn mark_deleted(&self, id: ObjectId, deleted_at: DateTime) -> UserResult<Option<User>> {
        self.touch();
        Ok(self.with_user(id, |u| {
            if u.is_deleted() {
                return None;
            }
            u.deleted_at = Some(deleted_at);
            u.last_modified_at = deleted_at;
            Some(u.clone())
        }))
    }

    async fn restore(&self, id: ObjectId, modified_at: DateTime) -> UserResult<Option<User>> {
        self.touch();
        Ok(self.with_user(id, |u| {
            u.deleted_at?;
            u.deleted_at = None;
            u.last_modified_at = modified_at;
            Some(u.clone())
        }))
    }
}

/// Repository whose every call fails like an unreachable server.
#[derive(Clone, Default)]
pub struct BrokenUserRepository;

#[async_trait]
impl UserRepository for BrokenUserRepository {
    async fn insert(&self, _user: User) -> UserResult<User> {
        Err(UserError::Database("server selection timeout".into()))
    }

    async fn find_by_id(&self, _id: ObjectId) -> UserResult<Option<User>> {
        Err(UserError::Database("server selection timeout".into()))
    }

    async fn find(&self, _query: UserQuery) -> UserResult<Vec<User>> {
        Err(UserError::Database("server selection timeout".into()))
    }

    async fn update(
        &self,
        _id: ObjectId,
        _changes: UserChanges,
        _modified_at: DateTime,
    ) -> UserResult<Option<User>> {
        Err(UserError::Database("server selection timeout".into()))
    }

    async fn mark_deleted(&self, _id: ObjectId, _deleted_at: DateTime) -> UserResult<Option<User>> {
        Err(UserError::Database("server selection timeout".into()))
    }

    async fn restore(&self, _id: ObjectId, _modified_at: DateTime) -> UserResult<Option<User>> {
        Err(UserError::Database("server selection timeout".into()))
    }
}

/// Full application router around `repository`, as the service binary builds it.
pub fn app<R: UserRepository + 'static>(repository: R, environment: Environment) -> Router {
    let apis = Router::new().nest("/users", handlers::router(UserService::new(repository)));
    axum_helpers::create_router::<ApiDoc>(apis, Router::new(), &ServerConfig::default(), environment)
        .unwrap()
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    match body {
        Some(body) => send_raw(app, method, uri, body.to_string()).await,
        None => {
            let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
            into_json(app.clone().oneshot(request).await.unwrap()).await
        }
    }
}

/// Send `body` verbatim as `application/json`.
pub async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    body: impl Into<Body>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap();
    into_json(app.clone().oneshot(request).await.unwrap()).await
}

async fn into_json(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
