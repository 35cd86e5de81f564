use std::sync::Arc;

use crate::api::{Endpoint, Query, Transport};
use crate::config::Role;
use crate::error::{PortalError, PortalResult};
use crate::forms::{PasswordChange, PhotoUpload, ProfileForm};
use crate::models::Profile;
use crate::normalize::{self, shapes};
use crate::notify::Notifications;
use crate::storage::SchoolIdStore;
use crate::view_state::{Phase, ViewState};

/// What differs between the parent and admin profile editors.
#[derive(Debug, Clone)]
pub struct ProfileConfig {
    pub role: Role,
    pub title: &'static str,
    pub load: Endpoint,
    pub update: Endpoint,
    pub change_password: Option<Endpoint>,
    pub shape: &'static [&'static str],
    pub fields: &'static [&'static str],
}

impl ProfileConfig {
    pub fn parent() -> Self {
        Self {
            role: Role::Parent,
            title: "My Profile",
            load: Endpoint::ParentProfile,
            update: Endpoint::UpdateParentProfile,
            change_password: Some(Endpoint::ParentChangePassword),
            shape: shapes::PARENT,
            fields: &["name", "phone", "address", "occupation"],
        }
    }

    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            title: "Admin Profile",
            load: Endpoint::AdminProfile,
            update: Endpoint::UpdateAdminProfile,
            change_password: Some(Endpoint::AdminChangePassword),
            shape: shapes::ADMIN,
            fields: &["name", "phone", "address", "designation"],
        }
    }

    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Parent => Self::parent(),
            Role::Admin => Self::admin(),
        }
    }
}

pub struct ProfileScreen {
    api: Arc<dyn Transport>,
    config: ProfileConfig,
    pub state: ViewState<Profile>,
    form: ProfileForm,
    pub notices: Notifications,
}

impl ProfileScreen {
    pub fn new(api: Arc<dyn Transport>, config: ProfileConfig) -> Self {
        Self {
            api,
            config,
            state: ViewState::new(),
            form: ProfileForm::default(),
            notices: Notifications::default(),
        }
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    pub fn form(&self) -> &ProfileForm {
        &self.form
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.state.data()
    }

    pub async fn mount(&mut self) -> Phase {
        let ticket = self.state.begin(None);
        let result = fetch_profile(self.api.as_ref(), &self.config).await;
        self.state.resolve(&ticket, result);

        match self.state.phase() {
            Phase::Error => {
                let err = self.state.error().unwrap_or_default().to_string();
                self.notices.error("Failed to load profile:", err);
            }
            Phase::Empty => {
                self.notices.warning("Profile not found");
            }
            _ => {}
        }
        if let Some(profile) = self.state.data() {
            self.form = ProfileForm::from_profile(profile, self.config.fields);
        }
        self.state.phase()
    }

    /// Returns false when `field` is not editable on this profile.
    pub fn edit(&mut self, field: &str, value: impl Into<String>) -> bool {
        self.form.set(field, value)
    }

    pub fn attach_photo(&mut self, photo: PhotoUpload) -> PortalResult<()> {
        if let Err(err) = photo.validate() {
            self.notices.error("Photo rejected:", &err);
            return Err(err.into());
        }
        self.form.attach_photo(photo);
        Ok(())
    }

    /// Sends every form field, applies them locally, then reloads.
    pub async fn save(&mut self) -> PortalResult<()> {
        if let Err(err) = self.form.validate() {
            self.notices.error("Could not save profile:", &err);
            return Err(err.into());
        }

        if let Err(err) = self.api.put(&self.config.update, self.form.to_body()).await {
            self.notices.error("Failed to update profile:", &err);
            return Err(err.into());
        }

        tracing::info!(role = ?self.config.role, "Profile updated");
        if let Some(profile) = self.state.data_mut() {
            self.form.apply_to(profile);
        }
        self.notices.success("Profile updated successfully");
        self.mount().await;
        Ok(())
    }

    pub async fn change_password(&mut self, change: PasswordChange) -> PortalResult<()> {
        let Some(endpoint) = self.config.change_password.clone() else {
            self.notices.warning("Password change is not available");
            return Err(PortalError::Unsupported("password change"));
        };
        if let Err(err) = change.validate() {
            self.notices.error("Could not change password:", &err);
            return Err(err.into());
        }

        match self.api.put(&endpoint, change.to_body()).await {
            Ok(_) => {
                tracing::info!(role = ?self.config.role, "Password changed");
                self.notices.success("Password changed successfully");
                Ok(())
            }
            Err(err) => {
                self.notices.error("Failed to change password:", &err);
                Err(err.into())
            }
        }
    }

    /// Caches the profile's school id for image URLs.
    pub fn remember_school_id(&self, store: &SchoolIdStore) -> PortalResult<()> {
        if let Some(school_id) = self
            .profile()
            .and_then(|p| p.school_id.as_deref())
            .filter(|id| !id.is_empty())
        {
            store.set_school_id(school_id)?;
            tracing::debug!(school_id, "Cached school id");
        }
        Ok(())
    }
}

pub(crate) async fn fetch_profile(
    api: &dyn Transport,
    config: &ProfileConfig,
) -> PortalResult<Profile> {
    let resp = api.get(&config.load, &Query::new()).await?;
    Ok(normalize::extract_entity::<Profile>(&resp, config.shape).unwrap_or_default())
}
