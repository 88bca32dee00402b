use std::sync::Arc;

use iced::Command;
use qbctl_core::{
    targets, ControllerSettings, EditSession, EntryIndex, EntryKind, SettingsForm, SubmitOutcome,
};

use super::types::{EntryDialog, ErrorInfo, Message, RejectedSubmit};
use super::PanelApp;
use crate::logging::LogEntry;

impl PanelApp {
    pub(super) fn refresh_logs(&mut self) {
        let entries = self.log_store.snapshot();
        for entry in &entries {
            if self.known_targets.insert(entry.target.clone()) {
                self.enabled_targets.insert(entry.target.clone());
            }
        }
        self.log_entries = entries;
    }

    pub(super) fn sorted_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = self.known_targets.iter().cloned().collect();
        targets.sort();
        targets
    }

    pub(super) fn visible_entries(&self) -> Vec<&LogEntry> {
        self.log_entries
            .iter()
            .filter(|entry| self.enabled_targets.contains(&entry.target))
            .collect()
    }

    pub(super) fn copy_diagnostics(&self) -> String {
        let text = self.diagnostics_text();
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
            Ok(()) => {
                tracing::info!(target: targets::UI, "Diagnostics copied to clipboard");
                "Copied".to_string()
            }
            Err(error) => {
                tracing::warn!(target: targets::UI, "Clipboard copy failed: {}", error);
                format!("Failed: {error}")
            }
        }
    }

    fn diagnostics_text(&self) -> String {
        let mut output = String::new();
        output.push_str("qbctl diagnostics\n");
        output.push_str(&format!("API base: {}\n", self.config.api_base));
        output.push_str(&format!("Log level: {}\n", self.log_level));
        output.push_str(&format!("Active view: {}\n", self.router.active().name()));
        output.push_str(&format!(
            "Mirror: {} devices, {} instances\n",
            self.configuration.lucky_devices.len(),
            self.configuration.qbittorrent_instances.len()
        ));
        if let Some(error) = &self.config_error {
            output.push_str(&format!("Last reload error: {}\n", error.detail));
        }
        match &self.poller_handle {
            Some(handle) => output.push_str(&format!(
                "Poller: running, {} ticks, {} failed, {} in flight, {} renders\n",
                handle.ticks(),
                handle.failures(),
                handle.in_flight(),
                self.status_board.render_count()
            )),
            None => output.push_str("Poller: stopped\n"),
        }
        output.push_str(&format!(
            "Visible notifications: {} (expire after {} ms)\n",
            self.alerts.len(),
            self.notifications.ttl().as_millis()
        ));
        output.push_str(&format!(
            "Targets enabled: {}\n",
            self.sorted_targets()
                .into_iter()
                .filter(|target| self.enabled_targets.contains(target))
                .collect::<Vec<String>>()
                .join(", ")
        ));
        output.push_str(&format!(
            "Log buffer: {}/{} entries\n",
            self.log_entries.len(),
            self.log_store.capacity()
        ));
        output.push_str("Recent logs:\n");

        let entries = self.visible_entries();
        let start = entries.len().saturating_sub(50);
        for entry in entries.into_iter().skip(start) {
            output.push_str(&entry.format_line());
            output.push('\n');
        }

        output
    }

    /// Pulls everything the engine tasks have published since the last frame.
    pub(super) fn sync_engine(&mut self) {
        if self.config_updates.has_changed().unwrap_or(false) {
            let latest = Arc::clone(&self.config_updates.borrow_and_update());
            self.configuration = latest;
            if !self.settings_dirty && !self.settings_saving {
                self.settings_form = SettingsForm::from(&self.configuration.controller_settings);
            }
        }

        let renders = self.status_board.render_count();
        if renders != self.status_renders {
            self.status_renders = renders;
            self.status = self.status_board.get();
        }

        self.alerts = self.notifications.snapshot();
    }

    pub(super) fn reload_config(&self) -> Command<Message> {
        let mirror = self.mirror.clone();
        Command::perform(
            async move { mirror.reload().await.map(|_| ()).map_err(ErrorInfo::from) },
            Message::ConfigReloaded,
        )
    }

    pub(super) fn start_poller(&self) -> Command<Message> {
        let poller = self.poller.clone();
        let renderer = Arc::new(self.status_board.clone());
        tracing::info!(
            target: targets::POLLING,
            period_ms = poller.period().as_millis() as u64,
            "Starting status poller"
        );
        Command::perform(async move { poller.spawn(renderer) }, Message::PollerStarted)
    }

    pub(super) fn toggle_polling(&mut self) -> Command<Message> {
        match self.poller_handle.take() {
            Some(handle) => {
                handle.stop();
                Command::none()
            }
            None => self.start_poller(),
        }
    }

    pub(super) fn open_edit(&mut self, kind: EntryKind, index: EntryIndex) {
        let session = match kind {
            EntryKind::LuckyDevice => self
                .configuration
                .lucky_devices
                .get(index)
                .map(|device| self.forms.open_edit(index, device)),
            EntryKind::QbitInstance => self
                .configuration
                .qbittorrent_instances
                .get(index)
                .map(|instance| self.forms.open_edit(index, instance)),
        };

        match session {
            Some(session) => self.open_dialog(session),
            None => {
                tracing::debug!(target: targets::UI, %kind, index, "Edit requested for missing row");
            }
        }
    }

    pub(super) fn open_dialog(&mut self, session: EditSession) {
        self.next_dialog_ticket += 1;
        self.dialog = Some(EntryDialog::new(self.next_dialog_ticket, session));
    }

    pub(super) fn submit_dialog(&mut self) -> Command<Message> {
        let Some(dialog) = self.dialog.as_mut() else {
            return Command::none();
        };
        if dialog.saving {
            return Command::none();
        }
        dialog.saving = true;
        dialog.error = None;

        let ticket = dialog.ticket;
        let session = dialog.session.clone();
        let values = session.values.clone();
        let forms = self.forms.clone();
        Command::perform(
            async move {
                match forms.submit(session, values).await {
                    SubmitOutcome::Saved => Ok(()),
                    SubmitOutcome::Rejected { session, error } => Err(RejectedSubmit {
                        session,
                        error: ErrorInfo::from(error),
                    }),
                }
            },
            move |result| Message::DialogSubmitted(ticket, result),
        )
    }

    pub(super) fn handle_dialog_result(
        &mut self,
        ticket: u64,
        result: Result<(), RejectedSubmit>,
    ) {
        // A dialog cancelled or replaced mid-save is left alone.
        if !EntryDialog::settle(&mut self.dialog, ticket, result) {
            tracing::debug!(target: targets::UI, ticket, "Save finished for a closed dialog");
        }
        self.sync_engine();
    }

    pub(super) fn delete_entry(&self, kind: EntryKind, index: EntryIndex) -> Command<Message> {
        let forms = self.forms.clone();
        Command::perform(
            async move { forms.delete(kind, index).await.map_err(ErrorInfo::from) },
            Message::EntryDeleted,
        )
    }

    pub(super) fn test_connection(&mut self, endpoint: String) -> Command<Message> {
        self.tests_in_flight += 1;
        let tester = self.tester.clone();
        Command::perform(
            async move { tester.test(&endpoint).await.map_err(ErrorInfo::from) },
            Message::ConnectionTested,
        )
    }

    pub(super) fn save_settings(&mut self) -> Command<Message> {
        if self.settings_saving {
            return Command::none();
        }
        self.settings_saving = true;
        self.settings_error = None;

        let forms = self.forms.clone();
        let form = self.settings_form.clone();
        Command::perform(
            async move { forms.save_settings(form).await.map_err(ErrorInfo::from) },
            Message::SettingsSaved,
        )
    }

    pub(super) fn handle_settings_result(&mut self, result: Result<ControllerSettings, ErrorInfo>) {
        self.settings_saving = false;
        match result {
            Ok(settings) => {
                self.settings_form = SettingsForm::from(&settings);
                self.settings_dirty = false;
            }
            Err(error) => {
                self.settings_error = Some(error.summary);
            }
        }
        self.sync_engine();
    }
}
