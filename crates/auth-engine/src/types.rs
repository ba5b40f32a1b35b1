//! Wire types and the role-discriminated profile model.

use crate::error::AuthError;
use serde::{Deserialize, Serialize};

/// Account role: selects the profile variant and the home surface.
///
/// The three kinds are mutually exclusive; the tag is cached in secure
/// storage next to the token pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Worker,
    Business,
    Individual,
}

impl Role {
    /// The wire/storage form of the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Worker => "worker",
            Role::Business => "business",
            Role::Individual => "individual",
        }
    }

    /// Parse a stored or wire tag; `None` for unrecognized values.
    pub fn parse(tag: &str) -> Option<Role> {
        match tag {
            "worker" => Some(Role::Worker),
            "business" => Some(Role::Business),
            "individual" => Some(Role::Individual),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access/refresh token pair returned by login and registration.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl TokenPair {
    /// Both fields must be non-empty or the pair is discarded.
    pub fn validate(self) -> Result<TokenPair, AuthError> {
        if self.access.is_empty() || self.refresh.is_empty() {
            return Err(AuthError::MalformedResponse(
                "login response is missing token credentials".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Worker profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerProfile {
    pub full_name: String,
}

/// Business profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub company_name: String,
    pub bin: String,
    pub inn: String,
    pub legal_address: String,
    pub contact_name: String,
    pub contact_number: String,
}

/// Individual profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualProfile {
    pub full_name_ru: String,
}

/// Role-discriminated profile, fetched on demand and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Profile {
    Worker(WorkerProfile),
    Business(BusinessProfile),
    Individual(IndividualProfile),
}

impl Profile {
    pub fn role(&self) -> Role {
        match self {
            Profile::Worker(_) => Role::Worker,
            Profile::Business(_) => Role::Business,
            Profile::Individual(_) => Role::Individual,
        }
    }
}

/// Account data returned by `/auth/me/`.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub phone: String,
    pub profile: Profile,
}

/// Common `/auth/me/` fields; the role-specific profile fields sit next
/// to them at the top level and are split off via `flatten`.
#[derive(Debug, Deserialize)]
struct MeBody {
    id: i64,
    email: String,
    phone: String,
    user_type: String,
    #[serde(flatten)]
    rest: serde_json::Value,
}

impl Account {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    /// Decode the role-discriminated `/auth/me/` body.
    ///
    /// The `user_type` tag selects the profile variant explicitly; an
    /// unrecognized tag is an error rather than a silent default, so new
    /// backend roles degrade to a failed profile fetch instead of a
    /// mislabeled session.
    pub(crate) fn from_me_body(body: serde_json::Value) -> Result<Account, AuthError> {
        let me: MeBody = serde_json::from_value(body).map_err(|err| {
            AuthError::MalformedResponse(format!("account response is incomplete: {}", err))
        })?;

        let profile = match me.user_type.as_str() {
            "worker" => Profile::Worker(decode_fields(me.rest)?),
            "business" => Profile::Business(decode_fields(me.rest)?),
            "individual" => Profile::Individual(decode_fields(me.rest)?),
            other => {
                return Err(AuthError::MalformedResponse(format!(
                    "unrecognized account role {:?}",
                    other
                )))
            }
        };

        Ok(Account {
            id: me.id,
            email: me.email,
            phone: me.phone,
            profile,
        })
    }
}

fn decode_fields<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, AuthError> {
    serde_json::from_value(value).map_err(|err| {
        AuthError::MalformedResponse(format!("profile fields are incomplete: {}", err))
    })
}

/// Registration payload sent to `/auth/register/`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub phone: String,
    pub user_type: Role,
    pub profile: RegisterProfile,
}

/// Role-specific registration profile body; serialized without a tag
/// since `user_type` travels as a sibling field.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RegisterProfile {
    Worker(WorkerProfile),
    Business(BusinessProfile),
    Individual(IndividualProfile),
}

impl RegisterRequest {
    pub fn worker(
        email: impl Into<String>,
        password: impl Into<String>,
        phone: impl Into<String>,
        profile: WorkerProfile,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            phone: phone.into(),
            user_type: Role::Worker,
            profile: RegisterProfile::Worker(profile),
        }
    }

    pub fn business(
        email: impl Into<String>,
        password: impl Into<String>,
        phone: impl Into<String>,
        profile: BusinessProfile,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            phone: phone.into(),
            user_type: Role::Business,
            profile: RegisterProfile::Business(profile),
        }
    }

    pub fn individual(
        email: impl Into<String>,
        password: impl Into<String>,
        phone: impl Into<String>,
        profile: IndividualProfile,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            phone: phone.into(),
            user_type: Role::Individual,
            profile: RegisterProfile::Individual(profile),
        }
    }
}
