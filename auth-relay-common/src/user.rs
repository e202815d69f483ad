//! Directory record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profile::ProfileUpdate;

/// Sex as reported by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unspecified,
}

impl Sex {
    /// Parse the provider's `sex` field. Anything other than `male`/`female`
    /// (including null) means the user did not say.
    pub fn from_provider(value: Option<&str>) -> Option<Self> {
        match value.map(str::trim) {
            Some("male") => Some(Sex::Male),
            Some("female") => Some(Sex::Female),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
            Sex::Unspecified => "Not specified",
        }
    }
}

/// One persisted user, keyed by the provider's user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Provider user id (unique key)
    pub id: String,
    pub login: String,
    /// Always set; `"no-email"` when the provider gave none
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Set once when the record is created
    pub first_login: DateTime<Utc>,
    /// Bumped on every successful exchange
    pub last_login: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Create a record for a previously unseen user.
    pub fn create(update: ProfileUpdate, now: DateTime<Utc>) -> Self {
        Self {
            login: update.login.unwrap_or_default(),
            email: update.email,
            first_name: update.first_name,
            last_name: update.last_name,
            sex: update.sex.unwrap_or_default(),
            avatar_url: update.avatar_url,
            first_login: now,
            last_login: now,
            updated_at: Some(now),
            id: update.id,
        }
    }

    /// Merge a fresh profile into this record.
    ///
    /// Present fields overwrite, absent ones keep their stored value. `email`
    /// is always taken from the update. `first_login` never changes and
    /// `last_login` never moves backwards.
    pub fn merge(&mut self, update: ProfileUpdate, now: DateTime<Utc>) {
        debug_assert_eq!(self.id, update.id);

        if let Some(login) = update.login {
            self.login = login;
        }
        self.email = update.email;
        if update.first_name.is_some() {
            self.first_name = update.first_name;
        }
        if update.last_name.is_some() {
            self.last_name = update.last_name;
        }
        if let Some(sex) = update.sex {
            self.sex = sex;
        }
        if update.avatar_url.is_some() {
            self.avatar_url = update.avatar_url;
        }

        self.last_login = self.last_login.max(now);
        self.updated_at = Some(self.last_login);
    }

    /// "First Last", skipping whichever part is missing.
    pub fn display_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}
