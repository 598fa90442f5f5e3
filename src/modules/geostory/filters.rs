use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use super::repository::{
    Condition, Field, FieldKind, GeoStoryQuery, Lookup, Scope, Sort, Value,
};
use crate::{modules::auth::middleware::Principal, utils::response};

pub struct FilterRequest<'a> {
    pub principal: &'a Principal,
    pub params: &'a [(String, String)],
}

#[derive(Debug, PartialEq)]
pub enum Error {
    InvalidFilter(String),
    InvalidSort(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidFilter(reason) => write!(f, "Invalid filter: {reason}"),
            Error::InvalidSort(reason) => write!(f, "Invalid sort: {reason}"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::debug!("Rejected list query: {self}");
        response::error(
            StatusCode::BAD_REQUEST,
            response::VALIDATION_ERROR,
            &self.to_string(),
        )
        .into_response()
    }
}

/// One stage of list narrowing. Backends only ever add to the query they are
/// handed; none of them can drop what an earlier one added.
pub trait FilterBackend: Send + Sync {
    fn filter_query(
        &self,
        request: &FilterRequest<'_>,
        query: GeoStoryQuery,
    ) -> Result<GeoStoryQuery, Error>;
}

fn filter_key() -> &'static Regex {
    static FILTER_KEY: OnceLock<Regex> = OnceLock::new();
    FILTER_KEY.get_or_init(|| {
        Regex::new(r"^filter\{(-?)([a-z_]+)(?:\.([a-z]+))?\}$").expect("Invalid filter key regex")
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}

fn split_list(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
}

fn parse_value(field: Field, lookup: Lookup, raw: &str) -> Result<Value, Error> {
    match (field.kind(), lookup) {
        (FieldKind::Text, Lookup::In) => Ok(Value::List(split_list(raw).collect())),
        (FieldKind::Text, _) => Ok(Value::Text(raw.to_string())),
        (FieldKind::Bool, _) => parse_bool(raw)
            .map(Value::Bool)
            .ok_or_else(|| Error::InvalidFilter(format!("{field} expects a boolean, got {raw:?}"))),
        (FieldKind::Timestamp, _) => parse_timestamp(raw)
            .map(Value::Timestamp)
            .ok_or_else(|| Error::InvalidFilter(format!("{field} expects a date, got {raw:?}"))),
    }
}

/// `filter{field}`, `filter{field.lookup}` and their `filter{-...}` negations.
pub struct FieldFilter;

impl FieldFilter {
    fn parse_condition(key: &str, raw: &str) -> Result<Condition, Error> {
        let captures = filter_key()
            .captures(key)
            .ok_or_else(|| Error::InvalidFilter(format!("malformed key {key:?}")))?;

        let negated = !captures[1].is_empty();
        let field = Field::from_name(&captures[2])
            .ok_or_else(|| Error::InvalidFilter(format!("unknown field {:?}", &captures[2])))?;
        let lookup = match captures.get(3) {
            Some(name) => Lookup::from_name(name.as_str()).ok_or_else(|| {
                Error::InvalidFilter(format!("unknown lookup {:?}", name.as_str()))
            })?,
            None => Lookup::Exact,
        };

        if !lookup.applies_to(field.kind()) {
            return Err(Error::InvalidFilter(format!(
                "lookup {:?} is not supported on {field}",
                captures.get(3).map_or("exact", |name| name.as_str())
            )));
        }

        Ok(Condition {
            field,
            lookup,
            value: parse_value(field, lookup, raw)?,
            negated,
        })
    }
}

impl FilterBackend for FieldFilter {
    fn filter_query(
        &self,
        request: &FilterRequest<'_>,
        mut query: GeoStoryQuery,
    ) -> Result<GeoStoryQuery, Error> {
        let mut conditions: Vec<Condition> = vec![];

        for (key, raw) in request.params {
            if !key.starts_with("filter") {
                continue;
            }

            let condition = Self::parse_condition(key, raw)?;

            // Repeated `in` keys widen a single membership test.
            if let Value::List(items) = &condition.value {
                let existing = conditions
                    .iter_mut()
                    .find(|existing| {
                        existing.lookup == Lookup::In
                            && existing.field == condition.field
                            && existing.negated == condition.negated
                    })
                    .map(|existing| &mut existing.value);

                if let Some(Value::List(current)) = existing {
                    current.extend(items.iter().cloned());
                    continue;
                }
            }

            conditions.push(condition);
        }

        query.conditions.extend(conditions);
        Ok(query)
    }
}

/// `sort[]=field` or `sort=-field`, repeatable and comma separated.
pub struct SortFilter;

impl FilterBackend for SortFilter {
    fn filter_query(
        &self,
        request: &FilterRequest<'_>,
        mut query: GeoStoryQuery,
    ) -> Result<GeoStoryQuery, Error> {
        let names = request
            .params
            .iter()
            .filter(|(key, _)| key == "sort[]" || key == "sort")
            .flat_map(|(_, raw)| split_list(raw));

        for name in names {
            let (descending, name) = match name.strip_prefix('-') {
                Some(name) => (true, name),
                None => (false, name.as_str()),
            };

            let field = Field::from_name(name)
                .ok_or_else(|| Error::InvalidSort(format!("unknown field {name:?}")))?;

            if !query.ordering.iter().any(|sort| sort.field == field) {
                query.ordering.push(Sort { field, descending });
            }
        }

        Ok(query)
    }
}

/// `search=term`, matched against title and description. The last
/// non-empty term wins.
pub struct SearchFilter;

impl FilterBackend for SearchFilter {
    fn filter_query(
        &self,
        request: &FilterRequest<'_>,
        mut query: GeoStoryQuery,
    ) -> Result<GeoStoryQuery, Error> {
        let term = request
            .params
            .iter()
            .filter(|(key, _)| key == "search")
            .map(|(_, raw)| raw.trim())
            .filter(|term| !term.is_empty())
            .last();

        if let Some(term) = term {
            query.search = Some(term.to_string());
        }

        Ok(query)
    }
}

/// What a principal may see at all: administrators everything, users public
/// stories plus their own and those granted to them, anonymous callers only
/// public stories.
pub fn scope_for(principal: &Principal) -> Scope {
    match principal.user() {
        Some(_) if principal.is_admin() => Scope::All,
        Some(user) => Scope::VisibleTo(user.id.clone()),
        None => Scope::Public,
    }
}

pub struct PermissionScopeFilter;

impl FilterBackend for PermissionScopeFilter {
    fn filter_query(
        &self,
        request: &FilterRequest<'_>,
        mut query: GeoStoryQuery,
    ) -> Result<GeoStoryQuery, Error> {
        query.scope = scope_for(request.principal);
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::{auth::authentication::Scheme, user::repository::User};

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn user(id: &str, is_admin: bool) -> Principal {
        Principal::User {
            user: User {
                id: id.to_string(),
                username: id.to_string(),
                password_hash: String::new(),
                is_admin,
                is_active: true,
                created_at: Utc::now(),
            },
            scheme: Scheme::Session,
        }
    }

    fn run(
        backends: &[&dyn FilterBackend],
        principal: &Principal,
        pairs: &[(&str, &str)],
    ) -> Result<GeoStoryQuery, Error> {
        let params = params(pairs);
        let request = FilterRequest {
            principal,
            params: &params,
        };

        backends
            .iter()
            .try_fold(GeoStoryQuery::default(), |query, backend| {
                backend.filter_query(&request, query)
            })
    }

    #[test]
    fn parses_lookups_and_negation() {
        let query = run(
            &[&FieldFilter],
            &Principal::Anonymous,
            &[
                ("filter{title.icontains}", "river"),
                ("filter{-is_public}", "false"),
                ("page", "2"),
            ],
        )
        .unwrap();

        assert_eq!(
            query.conditions,
            vec![
                Condition {
                    field: Field::Title,
                    lookup: Lookup::IContains,
                    value: Value::Text("river".to_string()),
                    negated: false,
                },
                Condition {
                    field: Field::IsPublic,
                    lookup: Lookup::Exact,
                    value: Value::Bool(false),
                    negated: true,
                },
            ]
        );
    }

    #[test]
    fn repeated_in_keys_are_merged() {
        let query = run(
            &[&FieldFilter],
            &Principal::Anonymous,
            &[("filter{owner.in}", "a,b"), ("filter{owner.in}", "c")],
        )
        .unwrap();

        assert_eq!(query.conditions.len(), 1);
        assert_eq!(
            query.conditions[0].value,
            Value::List(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn accepts_plain_dates_for_timestamps() {
        let query = run(
            &[&FieldFilter],
            &Principal::Anonymous,
            &[("filter{created_at.gte}", "2024-03-01")],
        )
        .unwrap();

        assert_eq!(
            query.conditions[0].value,
            Value::Timestamp(parse_timestamp("2024-03-01T00:00:00Z").unwrap())
        );
    }

    #[test]
    fn rejects_unknown_fields_and_mismatched_lookups() {
        for pairs in [
            [("filter{owner_email}", "x")],
            [("filter{title.gt}", "x")],
            [("filter{is_public}", "maybe")],
            [("filter{created_at.lt}", "yesterday")],
            [("filter[title]", "x")],
        ] {
            assert!(
                matches!(
                    run(&[&FieldFilter], &Principal::Anonymous, &pairs),
                    Err(Error::InvalidFilter(_))
                ),
                "{pairs:?} should be rejected"
            );
        }
    }

    #[test]
    fn sort_accepts_both_keys_and_ignores_duplicates() {
        let query = run(
            &[&SortFilter],
            &Principal::Anonymous,
            &[("sort[]", "-title,created_at"), ("sort", "title")],
        )
        .unwrap();

        assert_eq!(
            query.ordering,
            vec![
                Sort {
                    field: Field::Title,
                    descending: true
                },
                Sort {
                    field: Field::CreatedAt,
                    descending: false
                },
            ]
        );
        assert!(matches!(
            run(&[&SortFilter], &Principal::Anonymous, &[("sort[]", "data")]),
            Err(Error::InvalidSort(_))
        ));
    }

    #[test]
    fn blank_search_is_ignored() {
        let query = run(
            &[&SearchFilter],
            &Principal::Anonymous,
            &[("search", " coast "), ("search", "  ")],
        )
        .unwrap();

        assert_eq!(query.search.as_deref(), Some("coast"));
    }

    #[test]
    fn scope_follows_the_principal() {
        assert_eq!(scope_for(&Principal::Anonymous), Scope::Public);
        assert_eq!(
            scope_for(&user("bob", false)),
            Scope::VisibleTo("bob".to_string())
        );
        assert_eq!(scope_for(&user("root", true)), Scope::All);
    }

    #[test]
    fn declaration_order_does_not_change_the_query() {
        let principal = user("bob", false);
        let pairs = [
            ("filter{title.istartswith}", "Ri"),
            ("sort[]", "-created_at"),
            ("search", "delta"),
        ];

        let scope_last = run(
            &[&FieldFilter, &SortFilter, &SearchFilter, &PermissionScopeFilter],
            &principal,
            &pairs,
        )
        .unwrap();
        let scope_first = run(
            &[&PermissionScopeFilter, &SearchFilter, &SortFilter, &FieldFilter],
            &principal,
            &pairs,
        )
        .unwrap();

        assert_eq!(scope_last, scope_first);
        assert_eq!(scope_last.scope, Scope::VisibleTo("bob".to_string()));
    }
}
