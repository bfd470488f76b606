//! User profile handlers
//!
//! Soft business outcomes (no row after insert, disabled account) ship inside
//! HTTP 200 with distinguishing body codes 600/601; clients branch on the body
//! `code`, not the HTTP status.

use crate::auth::Identity;
use crate::codes;
use crate::error::ApiError;
use crate::response::Envelope;
use crate::state::AppState;
use crate::store::{NewUser, ProfileUpdate, USER_STATUS_ACTIVE, USER_STATUS_DISABLED};
use crate::validate::{non_empty, Rule, Validate, ValidatedBody};
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::Response;
use rand::Rng;
use serde_json::{json, Value};
use std::sync::Arc;

/// Body code for "no user row even after insert", a soft failure
const CODE_NOT_FOUND_SOFT: u16 = 600;
/// Body code for a disabled account
const CODE_ACCOUNT_DISABLED: u16 = 601;

/// GET /user/ - fetch the caller's profile, creating it on first access
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, ApiError> {
    // Unreachable when the authorization gate did its job.
    if identity.email.is_empty() {
        return Err(ApiError::Internal(anyhow::anyhow!(
            "authenticated identity carries no email"
        )));
    }

    let mut rows = state
        .store
        .find_by_email(&identity.email)
        .await
        .map_err(|e| ApiError::internal(e, "error retrieving user data"))?;

    if rows.is_empty() {
        let user = NewUser {
            firstname: identity.firstname.clone(),
            lastname: identity.lastname.clone(),
            email: identity.email.clone(),
            avatar: random_avatar(),
            status: USER_STATUS_ACTIVE,
        };
        state
            .store
            .insert(&user)
            .await
            .map_err(|e| ApiError::internal(e, "error inserting user"))?;
        tracing::info!(email = %user.email, avatar = %user.avatar, "new user inserted");

        rows = state
            .store
            .find_by_email(&identity.email)
            .await
            .map_err(|e| ApiError::internal(e, "error retrieving user data"))?;
    }

    if let Some(first) = rows.first() {
        if first.status == USER_STATUS_DISABLED {
            let code = CODE_ACCOUNT_DISABLED;
            return Ok(
                Envelope::payload(true, code, codes::table().message(code), json!({}))
                    .output(StatusCode::OK),
            );
        }
        return Ok(
            Envelope::payload(true, 200, "Success retrieving user data", json!(rows))
                .output(StatusCode::OK),
        );
    }

    // Row still absent after the insert; report softly inside HTTP 200.
    let code = CODE_NOT_FOUND_SOFT;
    Ok(
        Envelope::payload(true, code, codes::table().message(code), json!({}))
            .output(StatusCode::OK),
    )
}

/// PUT /user/ - overwrite the caller's profile fields
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    ValidatedBody(profile): ValidatedBody<ProfileUpdate>,
) -> Result<Response, ApiError> {
    state
        .store
        .update_profile(&identity.email, &profile)
        .await
        .map_err(|e| ApiError::internal(e, "error updating user"))?;

    let rows = state
        .store
        .find_by_email(&identity.email)
        .await
        .map_err(|e| ApiError::internal(e, "error retrieving user data"))?;

    Ok(
        Envelope::payload(true, 200, "User updated successfully", json!(rows))
            .output(StatusCode::OK),
    )
}

const PROFILE_RULES: &[Rule] = &[
    Rule {
        field: "firstname",
        message: "First name is required and cannot be empty",
        check: non_empty,
    },
    Rule {
        field: "lastname",
        message: "Last name is required and cannot be empty",
        check: non_empty,
    },
];

impl Validate for ProfileUpdate {
    fn rules() -> &'static [Rule] {
        PROFILE_RULES
    }

    /// Absent optional fields default to the empty string
    fn from_value(value: &Value) -> Self {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string()
        };
        Self {
            firstname: field("firstname"),
            lastname: field("lastname"),
            description: field("description"),
            phone: field("phone"),
            avatar: field("avatar"),
        }
    }
}

/// Default avatar for newly created users: one of the eight packaged images
fn random_avatar() -> String {
    let n = rand::thread_rng().gen_range(1..=8);
    format!("{n}.jpg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_avatar_pattern() {
        for _ in 0..64 {
            let avatar = random_avatar();
            let (n, ext) = avatar.split_once('.').unwrap();
            let n: u32 = n.parse().unwrap();
            assert!((1..=8).contains(&n));
            assert_eq!(ext, "jpg");
        }
    }

    #[test]
    fn test_profile_from_value_defaults_missing_fields() {
        let body = serde_json::json!({"firstname": "Ada", "lastname": "Lovelace"});
        let profile = ProfileUpdate::from_value(&body);
        assert_eq!(profile.firstname, "Ada");
        assert_eq!(profile.description, "");
        assert_eq!(profile.phone, "");
        assert_eq!(profile.avatar, "");
    }
}
