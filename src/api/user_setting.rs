//! Server-side user settings endpoints. Envelope-wrapped.
//!
//! The wire shape is camelCase with a bare `timeout` field; the local
//! [`Settings`] type uses snake_case TOML keys, so the two are kept separate
//! and converted at this boundary.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{ApiClient, Envelope};
use crate::config::Settings;

/// User settings as exchanged with the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettingDto {
    pub user_id: String,
    pub user_name: String,
    pub stream_mode: bool,
    pub auto_scroll: bool,
    pub show_timestamp: bool,
    pub api_base_url: String,
    pub timeout: u64,
}

impl Default for UserSettingDto {
    fn default() -> Self {
        Settings::default().into()
    }
}

impl From<Settings> for UserSettingDto {
    fn from(settings: Settings) -> Self {
        Self {
            user_id: settings.user_id,
            user_name: settings.user_name,
            stream_mode: settings.stream_mode,
            auto_scroll: settings.auto_scroll,
            show_timestamp: settings.show_timestamp,
            api_base_url: settings.api_base_url,
            timeout: settings.timeout_secs,
        }
    }
}

impl From<UserSettingDto> for Settings {
    fn from(dto: UserSettingDto) -> Self {
        Self {
            user_id: dto.user_id,
            user_name: dto.user_name,
            stream_mode: dto.stream_mode,
            auto_scroll: dto.auto_scroll,
            show_timestamp: dto.show_timestamp,
            api_base_url: dto.api_base_url,
            timeout_secs: dto.timeout,
        }
    }
}

impl ApiClient {
    /// Fetches the user's settings from the backend.
    pub async fn get_user_settings(&self, user_id: &str) -> Result<Envelope<UserSettingDto>> {
        let request = self.http().get(self.url(&format!("/settings/{}", user_id)));
        self.fetch_enveloped(request, "get user settings").await
    }

    /// Saves the user's settings to the backend.
    pub async fn save_user_settings(
        &self,
        user_id: &str,
        settings: &Settings,
    ) -> Result<Envelope<bool>> {
        let dto: UserSettingDto = settings.clone().into();
        let request = self
            .http()
            .post(self.url(&format!("/settings/{}", user_id)))
            .json(&dto);
        self.fetch_enveloped(request, "save user settings").await
    }
}
