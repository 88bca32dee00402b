use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::{execute, ApiClient, ApiRequest};
use crate::mirror::ConfigMirror;
use crate::model::{
    ConfigEntry, ControllerSettings, EntryIndex, EntryKind, LuckyDevice, QbitInstance,
};
use crate::notify::NotificationQueue;
use crate::{targets, Error};

pub const SETTINGS_PATH: &str = "/api/config/controller-settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit(EntryIndex),
}

/// Raw field text as typed into an entry dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct FormValues {
    pub name: String,
    pub endpoint: String,
    pub weight: String,
    pub enabled: bool,
    pub description: String,
    pub username: String,
    pub password: String,
}

impl Default for FormValues {
    fn default() -> Self {
        Self {
            name: String::new(),
            endpoint: String::new(),
            weight: "1.0".to_string(),
            enabled: true,
            description: String::new(),
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Conversion between a configuration entry and its dialog fields.
pub trait FormEntry: ConfigEntry {
    fn form_values(&self) -> FormValues;
    fn from_form(values: &FormValues) -> Result<Self, Error>;
}

impl FormEntry for LuckyDevice {
    fn form_values(&self) -> FormValues {
        FormValues {
            name: self.name.clone(),
            endpoint: self.api_url.clone(),
            weight: self.weight.to_string(),
            enabled: self.enabled,
            description: self.description.clone().unwrap_or_default(),
            ..FormValues::default()
        }
    }

    fn from_form(values: &FormValues) -> Result<Self, Error> {
        let (name, endpoint) = required_fields(values)?;
        Ok(Self {
            name,
            api_url: endpoint,
            weight: parse_weight(&values.weight)?,
            enabled: values.enabled,
            description: optional_text(&values.description),
        })
    }
}

impl FormEntry for QbitInstance {
    fn form_values(&self) -> FormValues {
        FormValues {
            name: self.name.clone(),
            endpoint: self.host.clone(),
            enabled: self.enabled,
            description: self.description.clone().unwrap_or_default(),
            username: self.username.clone(),
            password: self.password.clone(),
            ..FormValues::default()
        }
    }

    fn from_form(values: &FormValues) -> Result<Self, Error> {
        let (name, endpoint) = required_fields(values)?;
        Ok(Self {
            name,
            host: endpoint,
            username: values.username.trim().to_string(),
            password: values.password.clone(),
            enabled: values.enabled,
            description: optional_text(&values.description),
        })
    }
}

fn required_fields(values: &FormValues) -> Result<(String, String), Error> {
    let name = values.name.trim();
    if name.is_empty() {
        return Err(Error::validation("name", "must not be empty"));
    }
    let endpoint = values.endpoint.trim();
    if endpoint.is_empty() {
        return Err(Error::validation("endpoint", "must not be empty"));
    }
    Ok((name.to_string(), endpoint.to_string()))
}

fn parse_weight(value: &str) -> Result<f64, Error> {
    let weight: f64 = value
        .trim()
        .parse()
        .map_err(|_| Error::validation("weight", format!("'{}' is not a number", value.trim())))?;
    if !weight.is_finite() || weight < 0.0 {
        return Err(Error::validation("weight", "must be a non-negative number"));
    }
    // "-0" parses to -0.0; send a plain zero.
    Ok(weight.abs())
}

fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Transient state of an open add/edit dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    kind: EntryKind,
    mode: FormMode,
    pub values: FormValues,
}

impl EditSession {
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn index(&self) -> Option<EntryIndex> {
        match self.mode {
            FormMode::Add => None,
            FormMode::Edit(index) => Some(index),
        }
    }

    pub fn title(&self) -> String {
        match self.mode {
            FormMode::Add => format!("Add {}", self.kind.label().to_lowercase()),
            FormMode::Edit(index) => {
                format!("Edit {} #{index}", self.kind.label().to_lowercase())
            }
        }
    }

    fn request_body(&self) -> Result<serde_json::Value, Error> {
        let encoded = match self.kind {
            EntryKind::LuckyDevice => serde_json::to_value(LuckyDevice::from_form(&self.values)?),
            EntryKind::QbitInstance => {
                serde_json::to_value(QbitInstance::from_form(&self.values)?)
            }
        };
        encoded.map_err(|error| Error::validation("entry", error.to_string()))
    }

    fn request(&self) -> Result<ApiRequest, Error> {
        let body = self.request_body()?;
        Ok(match self.mode {
            FormMode::Add => ApiRequest::post(self.kind.collection_path(), body),
            FormMode::Edit(index) => ApiRequest::put(self.kind.entry_path(index), body),
        })
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Saved,
    /// The dialog stays open; `session` carries the values as submitted.
    Rejected { session: EditSession, error: Error },
}

impl SubmitOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SubmitOutcome::Saved)
    }
}

/// Controller-settings fields as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsForm {
    pub poll_interval: String,
    pub limit_on_delay: String,
    pub limit_off_delay: String,
    pub retry_interval: String,
    pub limited_download: String,
    pub limited_upload: String,
    pub normal_download: String,
    pub normal_upload: String,
}

impl From<&ControllerSettings> for SettingsForm {
    fn from(settings: &ControllerSettings) -> Self {
        Self {
            poll_interval: settings.poll_interval.to_string(),
            limit_on_delay: settings.limit_on_delay.to_string(),
            limit_off_delay: settings.limit_off_delay.to_string(),
            retry_interval: settings.retry_interval.to_string(),
            limited_download: settings.limited_download.to_string(),
            limited_upload: settings.limited_upload.to_string(),
            normal_download: settings.normal_download.to_string(),
            normal_upload: settings.normal_upload.to_string(),
        }
    }
}

impl SettingsForm {
    pub fn parse(&self) -> Result<ControllerSettings, Error> {
        Ok(ControllerSettings {
            poll_interval: parse_setting("poll_interval", &self.poll_interval)?,
            limit_on_delay: parse_setting("limit_on_delay", &self.limit_on_delay)?,
            limit_off_delay: parse_setting("limit_off_delay", &self.limit_off_delay)?,
            retry_interval: parse_setting("retry_interval", &self.retry_interval)?,
            limited_download: parse_setting("limited_download", &self.limited_download)?,
            limited_upload: parse_setting("limited_upload", &self.limited_upload)?,
            normal_download: parse_setting("normal_download", &self.normal_download)?,
            normal_upload: parse_setting("normal_upload", &self.normal_upload)?,
        })
    }
}

fn parse_setting(field: &'static str, value: &str) -> Result<u64, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::validation(field, "must be a non-negative whole number"))
}

/// Drives add/edit/delete of list entries and the settings form.
///
/// Every successful write is followed by a full mirror reload; the list view
/// only changes once that reload lands.
#[derive(Clone)]
pub struct FormController {
    client: Arc<dyn ApiClient>,
    mirror: ConfigMirror,
    notifications: NotificationQueue,
}

impl FormController {
    pub fn new(mirror: ConfigMirror, notifications: NotificationQueue) -> Self {
        Self {
            client: mirror.client(),
            mirror,
            notifications,
        }
    }

    pub fn mirror(&self) -> &ConfigMirror {
        &self.mirror
    }

    pub fn open_add(&self, kind: EntryKind) -> EditSession {
        debug!(target: targets::FORMS, %kind, "Add dialog opened");
        EditSession {
            kind,
            mode: FormMode::Add,
            values: FormValues::default(),
        }
    }

    pub fn open_edit<E: FormEntry>(&self, index: EntryIndex, current: &E) -> EditSession {
        debug!(target: targets::FORMS, kind = %E::KIND, index, "Edit dialog opened");
        EditSession {
            kind: E::KIND,
            mode: FormMode::Edit(index),
            values: current.form_values(),
        }
    }

    pub async fn submit(&self, mut session: EditSession, values: FormValues) -> SubmitOutcome {
        session.values = values;
        let kind = session.kind;

        let request = match session.request() {
            Ok(request) => request,
            Err(error) => {
                debug!(
                    target: targets::FORMS,
                    %kind,
                    error = %error,
                    "Submission blocked by validation"
                );
                return SubmitOutcome::Rejected { session, error };
            }
        };

        match execute(self.client.as_ref(), request).await {
            Ok(_) => {
                info!(target: targets::FORMS, %kind, mode = ?session.mode, "Entry saved");
                let _ = self.mirror.reload().await;
                self.notifications.success(format!("{} saved", kind.label()));
                SubmitOutcome::Saved
            }
            Err(error) => {
                warn!(
                    target: targets::FORMS,
                    %kind,
                    mode = ?session.mode,
                    error = %error.technical_detail(),
                    "Entry save failed"
                );
                self.notifications.danger(format!(
                    "{} save failed: {}",
                    kind.label(),
                    error.user_summary()
                ));
                SubmitOutcome::Rejected { session, error }
            }
        }
    }

    /// Deletes whatever entry occupies `index` on the server right now.
    pub async fn delete(&self, kind: EntryKind, index: EntryIndex) -> Result<(), Error> {
        match execute(self.client.as_ref(), ApiRequest::delete(kind.entry_path(index))).await {
            Ok(_) => {
                info!(target: targets::FORMS, %kind, index, "Entry deleted");
                let _ = self.mirror.reload().await;
                self.notifications.success(format!("{} deleted", kind.label()));
                Ok(())
            }
            Err(error) => {
                warn!(
                    target: targets::FORMS,
                    %kind,
                    index,
                    error = %error.technical_detail(),
                    "Entry delete failed"
                );
                self.notifications.danger(format!(
                    "{} delete failed: {}",
                    kind.label(),
                    error.user_summary()
                ));
                Err(error)
            }
        }
    }

    pub async fn save_settings(&self, form: SettingsForm) -> Result<ControllerSettings, Error> {
        let settings = form.parse()?;
        let body = serde_json::to_value(settings)
            .map_err(|error| Error::validation("settings", error.to_string()))?;

        match execute(self.client.as_ref(), ApiRequest::put(SETTINGS_PATH, body)).await {
            Ok(_) => {
                info!(target: targets::FORMS, "Controller settings saved");
                let _ = self.mirror.reload().await;
                self.notifications.success("Controller settings saved");
                Ok(settings)
            }
            Err(error) => {
                warn!(
                    target: targets::FORMS,
                    error = %error.technical_detail(),
                    "Controller settings save failed"
                );
                self.notifications.danger(format!(
                    "Controller settings save failed: {}",
                    error.user_summary()
                ));
                Err(error)
            }
        }
    }
}
