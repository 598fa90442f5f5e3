//! Request bodies shared by the write routes.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::modules::geostory::repository::UpdateGeoStoryPayload;

fn validate_data(data: &Value) -> Result<(), ValidationError> {
    match data {
        Value::Object(_) => Ok(()),
        _ => Err(ValidationError::new("INVALID_STORY_DATA")
            .with_message(Cow::from("Story data must be a JSON object"))),
    }
}

/// Keeps an explicit `null` apart from a missing key.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A complete story, as sent on create and full update. `title` and `data`
/// are required; the other fields keep their stored value when left out and
/// `description` and `thumbnail_url` are cleared by an explicit `null`.
#[derive(Deserialize)]
pub struct Document {
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub thumbnail_url: Option<Option<String>>,
    pub data: Value,
    #[serde(default, deserialize_with = "nullable")]
    pub is_public: Option<Option<bool>>,
}

impl Validate for Document {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let present = Present {
            title: Some(self.title.clone()),
            description: self.description.clone().flatten(),
            thumbnail_url: self.thumbnail_url.clone().flatten(),
            data: Some(self.data.clone()),
        };

        let mut errors = present.errors();
        not_null(&mut errors, "is_public", &self.is_public);

        finish(errors)
    }
}

impl From<Document> for UpdateGeoStoryPayload {
    fn from(document: Document) -> Self {
        Self {
            title: Some(document.title),
            description: document.description,
            thumbnail_url: document.thumbnail_url,
            data: Some(document.data),
            is_public: document.is_public.flatten(),
        }
    }
}

/// The subset of fields a partial update touches.
#[derive(Deserialize)]
pub struct Changes {
    #[serde(default, deserialize_with = "nullable")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub thumbnail_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub data: Option<Option<Value>>,
    #[serde(default, deserialize_with = "nullable")]
    pub is_public: Option<Option<bool>>,
}

/// The values a write would store, checked field by field.
#[derive(Validate)]
struct Present {
    #[validate(length(min = 1, max = 255))]
    title: Option<String>,
    #[validate(length(max = 2000))]
    description: Option<String>,
    #[validate(url)]
    thumbnail_url: Option<String>,
    #[validate(custom(function = "validate_data"))]
    data: Option<Value>,
}

impl Present {
    fn errors(&self) -> ValidationErrors {
        match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        }
    }
}

fn not_null(errors: &mut ValidationErrors, field: &'static str, value: &Option<Option<impl Sized>>) {
    if matches!(value, Some(None)) {
        errors.add(
            field,
            ValidationError::new("NULL_VALUE").with_message(Cow::from("This field may not be null")),
        );
    }
}

fn finish(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

impl Validate for Changes {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let present = Present {
            title: self.title.clone().flatten(),
            description: self.description.clone().flatten(),
            thumbnail_url: self.thumbnail_url.clone().flatten(),
            data: self.data.clone().flatten(),
        };

        let mut errors = present.errors();
        not_null(&mut errors, "title", &self.title);
        not_null(&mut errors, "data", &self.data);
        not_null(&mut errors, "is_public", &self.is_public);

        finish(errors)
    }
}

impl From<Changes> for UpdateGeoStoryPayload {
    fn from(changes: Changes) -> Self {
        Self {
            title: changes.title.flatten(),
            description: changes.description,
            thumbnail_url: changes.thumbnail_url,
            data: changes.data.flatten(),
            is_public: changes.is_public.flatten(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn changes(value: Value) -> Changes {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn document_requires_object_data() {
        let document: Document =
            serde_json::from_value(json!({ "title": "Rivers", "data": [1, 2] })).unwrap();

        let errors = document.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("data"));
    }

    #[test]
    fn document_rejects_bad_thumbnail_and_long_title() {
        let document: Document = serde_json::from_value(json!({
            "title": "x".repeat(256),
            "thumbnail_url": "not a url",
            "data": {}
        }))
        .unwrap();

        let errors = document.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("thumbnail_url"));
    }

    #[test]
    fn document_leaves_omitted_fields_unchanged() {
        let document: Document =
            serde_json::from_value(json!({ "title": "Rivers", "data": {} })).unwrap();
        assert!(document.validate().is_ok());

        let payload = UpdateGeoStoryPayload::from(document);
        assert_eq!(payload.title.as_deref(), Some("Rivers"));
        assert_eq!(payload.description, None);
        assert_eq!(payload.thumbnail_url, None);
        assert_eq!(payload.is_public, None);

        let cleared: Document = serde_json::from_value(json!({
            "title": "Rivers",
            "description": null,
            "data": {}
        }))
        .unwrap();
        assert_eq!(UpdateGeoStoryPayload::from(cleared).description, Some(None));
    }

    #[test]
    fn document_refuses_null_visibility() {
        let document: Document = serde_json::from_value(json!({
            "title": "Rivers",
            "data": {},
            "is_public": null
        }))
        .unwrap();

        let errors = document.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("is_public"));
    }

    #[test]
    fn explicit_null_clears_nullable_fields_only() {
        let cleared = changes(json!({ "description": null }));
        assert!(cleared.validate().is_ok());

        let payload = UpdateGeoStoryPayload::from(cleared);
        assert_eq!(payload.description, Some(None));
        assert_eq!(payload.thumbnail_url, None);
        assert_eq!(payload.title, None);

        let errors = changes(json!({ "title": null })).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn partial_values_follow_document_rules() {
        let errors = changes(json!({ "title": "", "data": "text" }))
            .validate()
            .unwrap_err();
        let fields = errors.field_errors();

        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("data"));
        assert!(changes(json!({ "is_public": true })).validate().is_ok());
    }
}
