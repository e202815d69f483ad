//! Identity provider profile payload and its normalized form.

use serde::{Deserialize, Serialize};

use crate::user::Sex;

/// Stored when the provider returns no usable email address.
pub const NO_EMAIL: &str = "no-email";

/// Avatar URL pattern; `{id}` is replaced by `default_avatar_id`.
/// `islands-200` is the 200x200 size.
pub const AVATAR_URL_TEMPLATE: &str = "https://avatars.yandex.net/get-yapic/{id}/islands-200";

/// Profile as returned by `GET https://login.yandex.ru/info?format=json`.
///
/// Only `id` is guaranteed; which other fields arrive depends on the scopes
/// the user granted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProfile {
    pub id: String,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub default_email: Option<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub default_avatar_id: Option<String>,
    #[serde(default)]
    pub is_avatar_empty: Option<bool>,
}

impl RawProfile {
    /// `default_email`, then the first of `emails`, then [`NO_EMAIL`].
    pub fn email(&self) -> String {
        non_empty(self.default_email.as_deref())
            .or_else(|| non_empty(self.emails.first().map(String::as_str)))
            .unwrap_or_else(|| NO_EMAIL.to_string())
    }

    pub fn avatar_url(&self) -> Option<String> {
        if self.is_avatar_empty == Some(true) {
            return None;
        }
        self.default_avatar_id.as_deref().and_then(avatar_url_for)
    }

    /// Normalize into the shape the directory merges. Blank strings are
    /// treated as absent.
    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            id: self.id.clone(),
            login: non_empty(self.login.as_deref()),
            email: self.email(),
            first_name: non_empty(self.first_name.as_deref()),
            last_name: non_empty(self.last_name.as_deref()),
            sex: Sex::from_provider(self.sex.as_deref()),
            avatar_url: self.avatar_url(),
        }
    }
}

/// Build the avatar URL for a provider avatar id. `"0"` and blank ids are
/// the provider's "no avatar" placeholders.
pub fn avatar_url_for(avatar_id: &str) -> Option<String> {
    let avatar_id = avatar_id.trim();
    if avatar_id.is_empty() || avatar_id == "0" {
        return None;
    }
    Some(AVATAR_URL_TEMPLATE.replace("{id}", avatar_id))
}

/// Normalized profile fields ready to be merged into a `UserRecord`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub id: String,
    pub login: Option<String>,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub sex: Option<Sex>,
    pub avatar_url: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
