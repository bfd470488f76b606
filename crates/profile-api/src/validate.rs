//! Declarative request-body validation
//!
//! Each endpoint that accepts a body declares a list of [`Rule`]s. The gate
//! evaluates every rule and reports all failures in one response, so callers
//! see the full list of problems in a single round trip.

use crate::error::ApiError;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

/// One failed predicate, as reported to the client
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// A field-level predicate
pub struct Rule {
    pub field: &'static str,
    pub message: &'static str,
    pub check: fn(Option<&Value>) -> bool,
}

/// Passes only for a present, non-empty string value
pub fn non_empty(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::String(s)) if !s.is_empty())
}

/// Evaluate every rule against the body, collecting all failures
pub fn check(body: &Value, rules: &[Rule]) -> Vec<FieldError> {
    rules
        .iter()
        .filter(|rule| !(rule.check)(body.get(rule.field)))
        .map(|rule| FieldError {
            field: rule.field,
            message: rule.message,
        })
        .collect()
}

/// A request body type with validation rules attached
pub trait Validate: Sized {
    /// Rules evaluated before the handler runs
    fn rules() -> &'static [Rule];
    /// Build the typed body from the already-validated JSON value
    fn from_value(value: &Value) -> Self;
}

/// Extractor that runs the validation gate before the handler.
///
/// A missing or unparseable body is treated as an empty object, which the
/// rules then reject field by field.
pub struct ValidatedBody<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedBody<T>
where
    T: Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let value = match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => value,
            Err(_) => Value::Object(Default::default()),
        };

        let errors = check(&value, T::rules());
        if !errors.is_empty() {
            return Err(ApiError::Validation(errors));
        }

        Ok(Self(T::from_value(&value)))
    }
}
