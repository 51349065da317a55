//! Onboarding profile and the settings keys it is stored under.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::{KeyValueStore, StoredValue};

/// Step ids and option values of the onboarding quiz.
pub mod keys {
    pub const WELCOME: &str = "welcome";
    pub const NAME: &str = "name";
    pub const DREAM_RECALL: &str = "dream_recall";
    pub const DREAM_GOAL: &str = "dream_goal";
    pub const SLEEP_CONCERN: &str = "sleep_concern";
    /// The reminders step; its answer is the permission result.
    pub const NOTIFICATIONS: &str = "notifications";
    pub const READY: &str = "ready";
}

/// Settings keys used for onboarding persistence.
pub mod settings_keys {
    pub const NAME: &str = "onboarding.name";
    pub const DREAM_RECALL: &str = "onboarding.dream_recall";
    pub const DREAM_GOAL: &str = "onboarding.dream_goal";
    pub const SLEEP_CONCERN: &str = "onboarding.sleep_concern";
    pub const NOTIFICATIONS_GRANTED: &str = "onboarding.notifications_granted";
    /// Set once the quiz has been finished; gates the next launch.
    pub const COMPLETED: &str = "onboarding.completed";
}

/// What onboarding learned about the user. Handed to the paywall.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingProfile {
    pub name: String,
    pub dream_recall: String,
    pub dream_goal: String,
    pub sleep_concern: String,
    pub notifications_granted: bool,
    pub completed: bool,
}

impl OnboardingProfile {
    /// Restore a completed profile. `None` until onboarding has finished.
    ///
    /// Meant for flow start; a running flow never re-reads the store.
    pub async fn load(store: &dyn KeyValueStore) -> Result<Option<Self>, StoreError> {
        let completed = flag(store, settings_keys::COMPLETED).await?;
        if !completed {
            return Ok(None);
        }

        Ok(Some(Self {
            name: text(store, settings_keys::NAME).await?,
            dream_recall: text(store, settings_keys::DREAM_RECALL).await?,
            dream_goal: text(store, settings_keys::DREAM_GOAL).await?,
            sleep_concern: text(store, settings_keys::SLEEP_CONCERN).await?,
            notifications_granted: flag(store, settings_keys::NOTIFICATIONS_GRANTED).await?,
            completed,
        }))
    }
}

async fn flag(store: &dyn KeyValueStore, key: &str) -> Result<bool, StoreError> {
    Ok(store
        .get(key)
        .await?
        .and_then(|v| v.as_flag())
        .unwrap_or(false))
}

async fn text(store: &dyn KeyValueStore, key: &str) -> Result<String, StoreError> {
    Ok(store
        .get(key)
        .await?
        .as_ref()
        .and_then(StoredValue::as_text)
        .map(str::to_string)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn load_returns_none_before_completion() {
        let store = MemoryStore::new();
        store
            .set(settings_keys::NAME, StoredValue::Text("Ada".into()))
            .await
            .unwrap();
        assert!(OnboardingProfile::load(&store).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_restores_completed_profile() {
        let store = MemoryStore::new();
        for (key, value) in [
            (settings_keys::NAME, "Ada"),
            (settings_keys::DREAM_RECALL, "often"),
            (settings_keys::DREAM_GOAL, "lucid"),
            (settings_keys::SLEEP_CONCERN, "nightmares"),
        ] {
            store.set(key, StoredValue::Text(value.into())).await.unwrap();
        }
        store
            .set(settings_keys::COMPLETED, StoredValue::Flag(true))
            .await
            .unwrap();

        let profile = OnboardingProfile::load(&store).await.unwrap().unwrap();
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.dream_goal, "lucid");
        assert!(profile.completed);
        assert!(!profile.notifications_granted, "missing flag reads as false");
    }

    #[test]
    fn profile_serializes_with_snake_case_fields() {
        let profile = OnboardingProfile {
            name: "Dreamer".into(),
            notifications_granted: true,
            ..Default::default()
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["name"], "Dreamer");
        assert_eq!(json["notifications_granted"], true);
    }
}
