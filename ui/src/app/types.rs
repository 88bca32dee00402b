use std::sync::Arc;

use qbctl_core::{
    ApiClient, ConnectionReport, ControllerSettings, EditSession, EntryIndex, EntryKind, Error,
    FormValues, NotificationId, PanelConfig, PollerHandle, SettingsForm, View,
};

use crate::logging::{LogLevel, LogStore, ReloadHandle};

pub struct Flags {
    pub config: PanelConfig,
    pub client: Arc<dyn ApiClient>,
    pub log_store: LogStore,
    pub reload_handle: ReloadHandle,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone)]
pub enum Message {
    EngineTick,
    LogLevelChanged(LogLevel),
    ToggleTarget(String, bool),
    CopyDiagnostics,
    ClearLogs,
    SelectView(View),
    ReloadConfig,
    ConfigReloaded(Result<(), ErrorInfo>),
    PollerStarted(PollerHandle),
    TogglePolling,
    DismissNotification(NotificationId),
    OpenAdd(EntryKind),
    OpenEdit(EntryKind, EntryIndex),
    DialogChanged(DialogField, String),
    DialogEnabledToggled(bool),
    SubmitDialog,
    CancelDialog,
    DialogSubmitted(u64, Result<(), RejectedSubmit>),
    DeleteEntry(EntryKind, EntryIndex),
    EntryDeleted(Result<(), ErrorInfo>),
    TestConnection(String),
    ConnectionTested(Result<ConnectionReport, ErrorInfo>),
    SettingsChanged(SettingsField, String),
    ResetSettings,
    SaveSettings,
    SettingsSaved(Result<ControllerSettings, ErrorInfo>),
}

/// Cloneable view of a core error for messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub(crate) summary: String,
    pub(crate) detail: String,
    pub(crate) validation: bool,
}

impl From<&Error> for ErrorInfo {
    fn from(error: &Error) -> Self {
        Self {
            summary: error.user_summary(),
            detail: error.technical_detail(),
            validation: error.is_validation(),
        }
    }
}

impl From<Error> for ErrorInfo {
    fn from(error: Error) -> Self {
        Self::from(&error)
    }
}

#[derive(Debug, Clone)]
pub struct RejectedSubmit {
    pub(crate) session: EditSession,
    pub(crate) error: ErrorInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogField {
    Name,
    Endpoint,
    Weight,
    Description,
    Username,
    Password,
}

impl DialogField {
    pub(crate) fn apply(self, values: &mut FormValues, value: String) {
        match self {
            DialogField::Name => values.name = value,
            DialogField::Endpoint => values.endpoint = value,
            DialogField::Weight => values.weight = value,
            DialogField::Description => values.description = value,
            DialogField::Username => values.username = value,
            DialogField::Password => values.password = value,
        }
    }
}

/// An open add/edit dialog. The session is handed to the controller on submit
/// and handed back if the save is rejected.
#[derive(Debug, Clone)]
pub(crate) struct EntryDialog {
    pub(crate) ticket: u64,
    pub(crate) session: EditSession,
    pub(crate) error: Option<String>,
    pub(crate) saving: bool,
}

impl EntryDialog {
    pub(crate) fn new(ticket: u64, session: EditSession) -> Self {
        Self {
            ticket,
            session,
            error: None,
            saving: false,
        }
    }

    /// Applies a finished save to `slot` if it still holds the dialog that
    /// issued `ticket`. Returns whether anything changed.
    pub(crate) fn settle(
        slot: &mut Option<EntryDialog>,
        ticket: u64,
        result: Result<(), RejectedSubmit>,
    ) -> bool {
        if slot.as_ref().map(|dialog| dialog.ticket) != Some(ticket) {
            return false;
        }
        match result {
            Ok(()) => *slot = None,
            Err(rejected) => {
                if let Some(dialog) = slot.as_mut() {
                    dialog.session = rejected.session;
                    dialog.error = Some(rejected.error.summary);
                    dialog.saving = false;
                }
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    PollInterval,
    LimitOnDelay,
    LimitOffDelay,
    RetryInterval,
    LimitedDownload,
    LimitedUpload,
    NormalDownload,
    NormalUpload,
}

impl SettingsField {
    pub(crate) const ALL: [SettingsField; 8] = [
        SettingsField::PollInterval,
        SettingsField::LimitOnDelay,
        SettingsField::LimitOffDelay,
        SettingsField::RetryInterval,
        SettingsField::LimitedDownload,
        SettingsField::LimitedUpload,
        SettingsField::NormalDownload,
        SettingsField::NormalUpload,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            SettingsField::PollInterval => "Poll interval (s)",
            SettingsField::LimitOnDelay => "Limit-on delay (s)",
            SettingsField::LimitOffDelay => "Limit-off delay (s)",
            SettingsField::RetryInterval => "Retry interval (s)",
            SettingsField::LimitedDownload => "Limited download (KB/s)",
            SettingsField::LimitedUpload => "Limited upload (KB/s)",
            SettingsField::NormalDownload => "Normal download (KB/s, 0 = unlimited)",
            SettingsField::NormalUpload => "Normal upload (KB/s, 0 = unlimited)",
        }
    }

    pub(crate) fn value(self, form: &SettingsForm) -> &str {
        match self {
            SettingsField::PollInterval => &form.poll_interval,
            SettingsField::LimitOnDelay => &form.limit_on_delay,
            SettingsField::LimitOffDelay => &form.limit_off_delay,
            SettingsField::RetryInterval => &form.retry_interval,
            SettingsField::LimitedDownload => &form.limited_download,
            SettingsField::LimitedUpload => &form.limited_upload,
            SettingsField::NormalDownload => &form.normal_download,
            SettingsField::NormalUpload => &form.normal_upload,
        }
    }

    pub(crate) fn apply(self, form: &mut SettingsForm, value: String) {
        let slot = match self {
            SettingsField::PollInterval => &mut form.poll_interval,
            SettingsField::LimitOnDelay => &mut form.limit_on_delay,
            SettingsField::LimitOffDelay => &mut form.limit_off_delay,
            SettingsField::RetryInterval => &mut form.retry_interval,
            SettingsField::LimitedDownload => &mut form.limited_download,
            SettingsField::LimitedUpload => &mut form.limited_upload,
            SettingsField::NormalDownload => &mut form.normal_download,
            SettingsField::NormalUpload => &mut form.normal_upload,
        };
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use qbctl_core::{ConfigMirror, FormController, MockApiClient, NotificationQueue};

    use super::*;

    fn session(kind: EntryKind) -> EditSession {
        let mirror = ConfigMirror::new(Arc::new(MockApiClient::new()));
        FormController::new(mirror, NotificationQueue::default()).open_add(kind)
    }

    #[test]
    fn stale_save_result_leaves_newer_dialog_open() {
        let mut slot = Some(EntryDialog::new(2, session(EntryKind::QbitInstance)));

        assert!(!EntryDialog::settle(&mut slot, 1, Ok(())));
        let dialog = slot.as_ref().expect("newer dialog still open");
        assert_eq!(dialog.ticket, 2);
        assert_eq!(dialog.session.kind(), EntryKind::QbitInstance);

        assert!(EntryDialog::settle(&mut slot, 2, Ok(())));
        assert!(slot.is_none());
    }

    #[test]
    fn rejected_save_reopens_matching_dialog_with_error() {
        let mut slot = Some(EntryDialog::new(7, session(EntryKind::LuckyDevice)));
        if let Some(dialog) = slot.as_mut() {
            dialog.saving = true;
        }
        let mut returned = session(EntryKind::LuckyDevice);
        returned.values.name = "dev1".to_string();

        let rejected = RejectedSubmit {
            session: returned,
            error: ErrorInfo::from(Error::validation("weight", "must be a number")),
        };
        assert!(EntryDialog::settle(&mut slot, 7, Err(rejected)));

        let dialog = slot.as_ref().expect("dialog kept open");
        assert!(!dialog.saving);
        assert_eq!(dialog.session.values.name, "dev1");
        assert_eq!(dialog.error.as_deref(), Some("weight: must be a number"));
    }

    #[test]
    fn result_after_cancel_is_dropped() {
        let mut slot: Option<EntryDialog> = None;
        assert!(!EntryDialog::settle(&mut slot, 3, Ok(())));
        assert!(slot.is_none());
    }

    #[test]
    fn validation_errors_stay_flagged_through_conversion() {
        let info = ErrorInfo::from(Error::validation("weight", "must be a number"));
        assert!(info.validation);
        assert_eq!(info.summary, "weight: must be a number");

        let info = ErrorInfo::from(Error::HttpStatus {
            method: "POST".to_string(),
            path: "/api/config/lucky-devices".to_string(),
            status: 500,
            detail: Some("disk full".to_string()),
        });
        assert!(!info.validation);
        assert!(info.detail.contains("HTTP 500"));
    }

    #[test]
    fn settings_fields_write_their_own_slot() {
        let mut form = SettingsForm::from(&ControllerSettings::default());
        SettingsField::LimitedUpload.apply(&mut form, "256".to_string());

        assert_eq!(SettingsField::LimitedUpload.value(&form), "256");
        assert_eq!(SettingsField::LimitedDownload.value(&form), "1024");
        assert_eq!(form.parse().expect("valid").limited_upload, 256);
    }

    #[test]
    fn dialog_fields_map_onto_form_values() {
        let mut values = FormValues::default();
        DialogField::Endpoint.apply(&mut values, "http://x".to_string());
        DialogField::Weight.apply(&mut values, "1.5".to_string());

        assert_eq!(values.endpoint, "http://x");
        assert_eq!(values.weight, "1.5");
        assert!(values.name.is_empty());
    }
}
