use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user known to the directory, keyed by the Telegram account id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    // ---
    /// Internal id assigned by the store. Stable for the lifetime of the row.
    pub id: i64,

    /// Telegram user id. Unique and never changed once set.
    pub external_id: i64,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,

    /// When the row was first inserted.
    pub created_at: DateTime<Utc>,

    /// Refreshed on every successful login.
    pub updated_at: DateTime<Utc>,
}

/// Profile fields carried by a credential.
///
/// Every field is optional; a credential may identify a user by id only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFields {
    // ---
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileFields {
    // ---
    /// Fields for a brand-new row. Empty strings are stored as null.
    pub fn for_insert(&self) -> ProfileFields {
        // ---
        ProfileFields {
            first_name: non_empty(&self.first_name),
            last_name: non_empty(&self.last_name),
            username: non_empty(&self.username),
            avatar_url: non_empty(&self.avatar_url),
        }
    }

    /// Merges `self` over an existing user's fields.
    ///
    /// A field is replaced only when the new value is present and non-empty,
    /// so a sparse credential never erases what is already stored.
    pub fn merged_over(&self, existing: &User) -> ProfileFields {
        // ---
        ProfileFields {
            first_name: non_empty(&self.first_name).or_else(|| existing.first_name.clone()),
            last_name: non_empty(&self.last_name).or_else(|| existing.last_name.clone()),
            username: non_empty(&self.username).or_else(|| existing.username.clone()),
            avatar_url: non_empty(&self.avatar_url).or_else(|| existing.avatar_url.clone()),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    // ---
    value.clone().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn existing() -> User {
        // ---
        let now = Utc::now();
        User {
            id: 7,
            external_id: 555,
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            username: None,
            avatar_url: Some("https://t.me/i/userpic/1.jpg".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn merge_keeps_existing_values_for_empty_fields() {
        // ---
        let update = ProfileFields {
            first_name: Some("Janet".to_string()),
            last_name: Some(String::new()),
            username: Some("janet".to_string()),
            avatar_url: None,
        };

        let merged = update.merged_over(&existing());
        assert_eq!(merged.first_name.as_deref(), Some("Janet"));
        assert_eq!(merged.last_name.as_deref(), Some("Doe"));
        assert_eq!(merged.username.as_deref(), Some("janet"));
        assert_eq!(
            merged.avatar_url.as_deref(),
            Some("https://t.me/i/userpic/1.jpg")
        );
    }

    #[test]
    fn insert_stores_empty_strings_as_null() {
        // ---
        let fields = ProfileFields {
            first_name: Some("  ".to_string()),
            username: Some("jane".to_string()),
            ..Default::default()
        };

        let stored = fields.for_insert();
        assert_eq!(stored.first_name, None);
        assert_eq!(stored.last_name, None);
        assert_eq!(stored.username.as_deref(), Some("jane"));
    }

    #[test]
    fn non_empty_values_are_kept_verbatim() {
        // ---
        let update = ProfileFields {
            first_name: Some(" Jane ".to_string()),
            username: Some("\tjane".to_string()),
            ..Default::default()
        };

        let stored = update.for_insert();
        assert_eq!(stored.first_name.as_deref(), Some(" Jane "));
        assert_eq!(stored.username.as_deref(), Some("\tjane"));

        let merged = update.merged_over(&existing());
        assert_eq!(merged.first_name.as_deref(), Some(" Jane "));
        assert_eq!(merged.last_name.as_deref(), Some("Doe"));
    }
}
