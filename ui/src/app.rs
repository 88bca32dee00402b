mod actions;
mod helpers;
mod styles;
mod types;
mod views;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use iced::keyboard;
use iced::widget::{column, container};
use iced::{Application, Command, Element, Length, Subscription, Theme};
use tokio::sync::watch;

use qbctl_core::{
    targets, ConfigMirror, Configuration, ConnectionTester, FormController, LatestSnapshot,
    Notification, NotificationQueue, PanelConfig, PollerHandle, SettingsForm, StatusPoller,
    StatusSnapshot, ViewRouter,
};

use crate::logging::{apply_log_level, LogEntry, LogLevel, LogStore, ReloadHandle};

pub use types::{DialogField, ErrorInfo, Flags, Message, RejectedSubmit, SettingsField};

use helpers::escape_key_event;
use types::EntryDialog;

const ENGINE_TICK: Duration = Duration::from_millis(250);

pub struct PanelApp {
    log_store: LogStore,
    reload_handle: ReloadHandle,
    log_entries: Vec<LogEntry>,
    log_level: LogLevel,
    known_targets: HashSet<String>,
    enabled_targets: HashSet<String>,
    copy_status: Option<String>,
    config: PanelConfig,
    router: ViewRouter,
    notifications: NotificationQueue,
    mirror: ConfigMirror,
    forms: FormController,
    tester: ConnectionTester,
    poller: StatusPoller,
    status_board: LatestSnapshot,
    poller_handle: Option<PollerHandle>,
    configuration: Arc<Configuration>,
    config_updates: watch::Receiver<Arc<Configuration>>,
    config_error: Option<ErrorInfo>,
    status: Option<StatusSnapshot>,
    status_renders: u64,
    alerts: Vec<Notification>,
    dialog: Option<EntryDialog>,
    next_dialog_ticket: u64,
    settings_form: SettingsForm,
    settings_dirty: bool,
    settings_saving: bool,
    settings_error: Option<String>,
    tests_in_flight: usize,
}

impl Application for PanelApp {
    type Executor = crate::executor::PanelExecutor;
    type Message = Message;
    type Theme = Theme;
    type Flags = Flags;

    fn new(flags: Flags) -> (Self, Command<Message>) {
        let known_targets: HashSet<String> =
            targets::ALL.iter().map(|value| value.to_string()).collect();
        let enabled_targets = known_targets.clone();

        let notifications = NotificationQueue::new(flags.config.notification_ttl());
        let mirror = ConfigMirror::new(Arc::clone(&flags.client));
        let forms = FormController::new(mirror.clone(), notifications.clone());
        let tester = ConnectionTester::new(Arc::clone(&flags.client), notifications.clone());
        let poller = StatusPoller::with_period(flags.client, flags.config.poll_interval());
        let config_updates = mirror.subscribe();
        let configuration = mirror.current();
        let settings_form = SettingsForm::from(&configuration.controller_settings);

        let app = Self {
            log_store: flags.log_store,
            reload_handle: flags.reload_handle,
            log_entries: Vec::new(),
            log_level: flags.log_level,
            known_targets,
            enabled_targets,
            copy_status: None,
            config: flags.config,
            router: ViewRouter::new(),
            notifications,
            mirror,
            forms,
            tester,
            poller,
            status_board: LatestSnapshot::new(),
            poller_handle: None,
            configuration,
            config_updates,
            config_error: None,
            status: None,
            status_renders: 0,
            alerts: Vec::new(),
            dialog: None,
            next_dialog_ticket: 0,
            settings_form,
            settings_dirty: false,
            settings_saving: false,
            settings_error: None,
            tests_in_flight: 0,
        };

        tracing::info!(target: targets::UI, api_base = %app.config.api_base, "Panel started");
        let startup = Command::batch(vec![app.reload_config(), app.start_poller()]);
        (app, startup)
    }

    fn title(&self) -> String {
        format!("qbctl - {}", self.config.api_base)
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::EngineTick => {
                self.refresh_logs();
                self.sync_engine();
                Command::none()
            }
            Message::LogLevelChanged(level) => {
                self.log_level = level;
                apply_log_level(&self.reload_handle, level);
                tracing::info!(target: targets::UI, "Log level set to {}", level);
                Command::none()
            }
            Message::ToggleTarget(target, enabled) => {
                if enabled {
                    self.enabled_targets.insert(target);
                } else {
                    self.enabled_targets.remove(&target);
                }
                Command::none()
            }
            Message::CopyDiagnostics => {
                self.copy_status = Some(self.copy_diagnostics());
                Command::none()
            }
            Message::ClearLogs => {
                self.log_store.clear();
                self.log_entries.clear();
                Command::none()
            }
            Message::SelectView(view) => {
                self.router.select(view);
                Command::none()
            }
            Message::ReloadConfig => self.reload_config(),
            Message::ConfigReloaded(result) => {
                self.config_error = result.err();
                self.sync_engine();
                Command::none()
            }
            Message::PollerStarted(handle) => {
                self.poller_handle = Some(handle);
                Command::none()
            }
            Message::TogglePolling => self.toggle_polling(),
            Message::DismissNotification(id) => {
                self.notifications.dismiss(id);
                self.alerts = self.notifications.snapshot();
                Command::none()
            }
            Message::OpenAdd(kind) => {
                let session = self.forms.open_add(kind);
                self.open_dialog(session);
                Command::none()
            }
            Message::OpenEdit(kind, index) => {
                self.open_edit(kind, index);
                Command::none()
            }
            Message::DialogChanged(field, value) => {
                if let Some(dialog) = self.dialog.as_mut() {
                    field.apply(&mut dialog.session.values, value);
                    dialog.error = None;
                }
                Command::none()
            }
            Message::DialogEnabledToggled(enabled) => {
                if let Some(dialog) = self.dialog.as_mut() {
                    dialog.session.values.enabled = enabled;
                }
                Command::none()
            }
            Message::SubmitDialog => self.submit_dialog(),
            Message::CancelDialog => {
                self.dialog = None;
                Command::none()
            }
            Message::DialogSubmitted(ticket, result) => {
                self.handle_dialog_result(ticket, result);
                Command::none()
            }
            Message::DeleteEntry(kind, index) => self.delete_entry(kind, index),
            Message::EntryDeleted(result) => {
                if let Err(error) = result {
                    tracing::debug!(target: targets::UI, detail = %error.detail, "Delete rejected");
                }
                self.sync_engine();
                Command::none()
            }
            Message::TestConnection(endpoint) => self.test_connection(endpoint),
            Message::ConnectionTested(result) => {
                self.tests_in_flight = self.tests_in_flight.saturating_sub(1);
                if let Ok(report) = result {
                    tracing::debug!(target: targets::UI, success = report.success, "Test finished");
                }
                self.alerts = self.notifications.snapshot();
                Command::none()
            }
            Message::SettingsChanged(field, value) => {
                field.apply(&mut self.settings_form, value);
                self.settings_dirty = true;
                self.settings_error = None;
                Command::none()
            }
            Message::ResetSettings => {
                self.settings_form = SettingsForm::from(&self.configuration.controller_settings);
                self.settings_dirty = false;
                self.settings_error = None;
                Command::none()
            }
            Message::SaveSettings => self.save_settings(),
            Message::SettingsSaved(result) => {
                self.handle_settings_result(result);
                Command::none()
            }
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        let engine_tick = iced::time::every(ENGINE_TICK).map(|_| Message::EngineTick);
        let escape_key = keyboard::on_key_press(escape_key_event);
        Subscription::batch(vec![engine_tick, escape_key])
    }

    fn view(&self) -> Element<'_, Message> {
        let body = match &self.dialog {
            Some(dialog) => self.dialog_view(dialog),
            None => self.active_view(),
        };

        let content = column![self.header_view(), self.tab_bar(), self.alerts_view(), body]
            .spacing(16)
            .padding(16);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}
