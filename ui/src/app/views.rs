use iced::alignment::Horizontal;
use iced::theme;
use iced::widget::{
    button, checkbox, column, container, pick_list, row, scrollable, text, text_input, Space,
};
use iced::{Alignment, Color, Element, Length};
use qbctl_core::{
    ConfigEntry, EntryKind, FormMode, LuckyDevice, QbitInstance, Severity, View,
};
use serde_json::Value;

use super::helpers::{format_weight, level_color, status_lines};
use super::styles::{AlertStyle, DialogStyle, TabStyle};
use super::types::{DialogField, EntryDialog, Message, SettingsField};
use super::PanelApp;
use crate::logging::LogLevel;

fn heading_color() -> Color {
    Color::from_rgb8(0x12, 0x12, 0x12)
}

fn label_color() -> Color {
    Color::from_rgb8(0x3a, 0x4a, 0x5a)
}

fn muted_color() -> Color {
    Color::from_rgb8(0x6a, 0x6a, 0x6a)
}

impl PanelApp {
    pub(super) fn header_view(&self) -> Element<'_, Message> {
        let polling = match &self.poller_handle {
            Some(handle) if handle.in_flight() > 0 => "Polling…",
            Some(_) => "Live",
            None => "Paused",
        };
        let toggle_label = if self.poller_handle.is_some() {
            "Pause updates"
        } else {
            "Resume updates"
        };

        row![
            text("qbctl")
                .size(28)
                .style(theme::Text::Color(Color::from_rgb8(0x10, 0x1a, 0x24))),
            text(&self.config.api_base)
                .size(16)
                .style(theme::Text::Color(Color::from_rgb8(0x5f, 0x6b, 0x7a))),
            Space::with_width(Length::Fill),
            text(polling)
                .size(14)
                .style(theme::Text::Color(label_color())),
            button(text(toggle_label)).on_press(Message::TogglePolling),
            button(text("Reload config")).on_press(Message::ReloadConfig),
        ]
        .spacing(12)
        .align_items(Alignment::Center)
        .into()
    }

    pub(super) fn tab_bar(&self) -> Element<'_, Message> {
        let mut tabs = row![].spacing(4).align_items(Alignment::Center);
        for view in View::ALL {
            tabs = tabs.push(
                button(text(view.title()))
                    .padding([6, 12])
                    .style(theme::Button::custom(TabStyle {
                        active: self.router.is_active(view),
                    }))
                    .on_press(Message::SelectView(view)),
            );
        }
        tabs.into()
    }

    pub(super) fn alerts_view(&self) -> Element<'_, Message> {
        let mut alerts = column![].spacing(6);
        if let Some(error) = &self.config_error {
            alerts = alerts.push(alert_banner(
                format!("Configuration not loaded: {}", error.summary),
                Severity::Danger,
                None,
            ));
        }
        for alert in &self.alerts {
            alerts = alerts.push(alert_banner(
                alert.message.clone(),
                alert.severity,
                Some(Message::DismissNotification(alert.id)),
            ));
        }
        alerts.into()
    }

    pub(super) fn active_view(&self) -> Element<'_, Message> {
        match self.router.active() {
            View::Dashboard => self.dashboard_view(),
            View::LuckyDevices => self.entry_list_view(EntryKind::LuckyDevice),
            View::QbitInstances => self.entry_list_view(EntryKind::QbitInstance),
            View::Settings => self.settings_view(),
            View::Logs => self.logs_view(),
        }
    }

    fn dashboard_view(&self) -> Element<'_, Message> {
        let Some(status) = &self.status else {
            let waiting = if self.poller_handle.is_some() {
                "Waiting for the first status update."
            } else {
                "Status updates are paused."
            };
            return container(text(waiting).size(14).style(theme::Text::Color(muted_color())))
                .padding(12)
                .style(theme::Container::Box)
                .into();
        };

        let panels = row![
            status_panel("Lucky pool", &status.pool),
            status_panel("qBittorrent instances", &status.instances),
            status_panel("Controller", &status.controller),
        ]
        .spacing(16)
        .align_items(Alignment::Start);

        scrollable(panels).height(Length::Fill).into()
    }

    fn entry_list_view(&self, kind: EntryKind) -> Element<'_, Message> {
        let title = match kind {
            EntryKind::LuckyDevice => "Lucky devices",
            EntryKind::QbitInstance => "qBittorrent instances",
        };

        let mut list_items = column![].spacing(6);
        let rows: Vec<Element<'_, Message>> = match kind {
            EntryKind::LuckyDevice => self
                .configuration
                .lucky_devices
                .iter()
                .enumerate()
                .map(|(index, device)| self.device_row(index, device))
                .collect(),
            EntryKind::QbitInstance => self
                .configuration
                .qbittorrent_instances
                .iter()
                .enumerate()
                .map(|(index, instance)| self.instance_row(index, instance))
                .collect(),
        };

        if rows.is_empty() {
            list_items = list_items.push(
                text(format!("No {}s configured.", kind.label().to_lowercase()))
                    .size(14)
                    .style(theme::Text::Color(Color::from_rgb8(0x4a, 0x4a, 0x4a))),
            );
        } else {
            for entry_row in rows {
                list_items = list_items.push(entry_row);
            }
        }

        let header = row![
            text(title).size(20).style(theme::Text::Color(heading_color())),
            Space::with_width(Length::Fill),
            button(text(format!("Add {}", kind.label().to_lowercase())))
                .style(theme::Button::Primary)
                .on_press(Message::OpenAdd(kind)),
        ]
        .spacing(12)
        .align_items(Alignment::Center);

        let mut content = column![header].spacing(12);
        if self.tests_in_flight > 0 && kind == EntryKind::LuckyDevice {
            content = content.push(
                text(format!("Connection tests running: {}", self.tests_in_flight))
                    .size(12)
                    .style(theme::Text::Color(muted_color())),
            );
        }
        content = content.push(scrollable(list_items).height(Length::Fill));

        container(content)
            .padding(12)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(theme::Container::Box)
            .into()
    }

    fn device_row(&self, index: usize, device: &LuckyDevice) -> Element<'_, Message> {
        let details = format!(
            "{} | weight {} | {}",
            device.api_url,
            format_weight(device.weight),
            enabled_label(device.enabled())
        );
        let actions = row![
            button(text("Test"))
                .style(theme::Button::Secondary)
                .on_press(Message::TestConnection(device.api_url.clone())),
            button(text("Edit"))
                .style(theme::Button::Secondary)
                .on_press(Message::OpenEdit(EntryKind::LuckyDevice, index)),
            button(text("Delete"))
                .style(theme::Button::Destructive)
                .on_press(Message::DeleteEntry(EntryKind::LuckyDevice, index)),
        ]
        .spacing(6);

        entry_row(device, details, actions.into())
    }

    fn instance_row(&self, index: usize, instance: &QbitInstance) -> Element<'_, Message> {
        let details = format!(
            "{} | user {} | {}",
            instance.host,
            instance.username,
            enabled_label(instance.enabled())
        );
        let actions = row![
            button(text("Edit"))
                .style(theme::Button::Secondary)
                .on_press(Message::OpenEdit(EntryKind::QbitInstance, index)),
            button(text("Delete"))
                .style(theme::Button::Destructive)
                .on_press(Message::DeleteEntry(EntryKind::QbitInstance, index)),
        ]
        .spacing(6);

        entry_row(instance, details, actions.into())
    }

    pub(super) fn dialog_view<'a>(&'a self, dialog: &'a EntryDialog) -> Element<'a, Message> {
        let session = &dialog.session;
        let kind = session.kind();
        let values = &session.values;

        let mut fields = column![
            text(session.title())
                .size(20)
                .style(theme::Text::Color(heading_color())),
            labeled_input("Name", "front-door", &values.name, DialogField::Name),
            labeled_input(
                kind.endpoint_label(),
                "http://192.168.1.10:16601",
                &values.endpoint,
                DialogField::Endpoint,
            ),
        ]
        .spacing(8);

        if kind.has_weight() {
            fields = fields.push(labeled_input("Weight", "1.0", &values.weight, DialogField::Weight));
        }
        if kind.has_credentials() {
            fields = fields
                .push(labeled_input("Username", "admin", &values.username, DialogField::Username))
                .push(column![
                    text("Password").size(12).style(theme::Text::Color(label_color())),
                    text_input("", &values.password)
                        .on_input(|value| Message::DialogChanged(DialogField::Password, value))
                        .secure(true)
                        .padding(6)
                        .size(12)
                        .width(Length::Fill),
                ]
                .spacing(4));
        }
        fields = fields
            .push(labeled_input(
                "Description",
                "optional",
                &values.description,
                DialogField::Description,
            ))
            .push(checkbox("Enabled", values.enabled).on_toggle(Message::DialogEnabledToggled));

        if let Some(error) = &dialog.error {
            fields = fields.push(
                text(error)
                    .size(13)
                    .style(theme::Text::Color(Color::from_rgb8(0xe0, 0x4f, 0x4f))),
            );
        }

        let submit_label = match (dialog.saving, session.mode()) {
            (true, _) => "Saving…",
            (false, FormMode::Add) => "Add",
            (false, FormMode::Edit(_)) => "Save",
        };
        let submit = button(text(submit_label)).style(theme::Button::Primary);
        let submit = if dialog.saving {
            submit
        } else {
            submit.on_press(Message::SubmitDialog)
        };
        fields = fields.push(
            row![
                submit,
                button(text("Cancel"))
                    .style(theme::Button::Secondary)
                    .on_press(Message::CancelDialog),
            ]
            .spacing(8),
        );

        container(fields)
            .padding(16)
            .max_width(560.0)
            .style(theme::Container::Custom(Box::new(DialogStyle)))
            .into()
    }

    fn settings_view(&self) -> Element<'_, Message> {
        let mut form = column![
            text("Controller settings")
                .size(20)
                .style(theme::Text::Color(heading_color())),
            text("Applied by the backend speed-limit controller.")
                .size(12)
                .style(theme::Text::Color(muted_color())),
        ]
        .spacing(8);

        for field in SettingsField::ALL {
            form = form.push(
                column![
                    text(field.label()).size(12).style(theme::Text::Color(label_color())),
                    text_input("0", field.value(&self.settings_form))
                        .on_input(move |value| Message::SettingsChanged(field, value))
                        .padding(6)
                        .size(12)
                        .width(Length::Fixed(240.0)),
                ]
                .spacing(4),
            );
        }

        if let Some(error) = &self.settings_error {
            form = form.push(
                text(error)
                    .size(13)
                    .style(theme::Text::Color(Color::from_rgb8(0xe0, 0x4f, 0x4f))),
            );
        }

        let save = button(text(if self.settings_saving { "Saving…" } else { "Save" }))
            .style(theme::Button::Primary);
        let save = if self.settings_saving {
            save
        } else {
            save.on_press(Message::SaveSettings)
        };
        form = form.push(
            row![
                save,
                button(text("Revert"))
                    .style(theme::Button::Secondary)
                    .on_press(Message::ResetSettings),
            ]
            .spacing(8),
        );

        container(scrollable(form).height(Length::Fill))
            .padding(12)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(theme::Container::Box)
            .into()
    }

    fn logs_view(&self) -> Element<'_, Message> {
        let level_picker = pick_list(
            &LogLevel::ALL[..],
            Some(self.log_level),
            Message::LogLevelChanged,
        )
        .placeholder("Log level");

        let copy_status = self.copy_status.as_deref().unwrap_or("Ready");
        let console_header = row![
            text("Console")
                .size(20)
                .style(theme::Text::Color(heading_color())),
            level_picker,
            button("Copy diagnostics").on_press(Message::CopyDiagnostics),
            button("Clear").on_press(Message::ClearLogs),
            text(format!("Clipboard: {copy_status}"))
                .size(12)
                .style(theme::Text::Color(muted_color())),
        ]
        .spacing(12)
        .align_items(Alignment::Center);

        let console = column![console_header, self.log_lines_view()]
            .spacing(12)
            .width(Length::FillPortion(3));

        row![console, self.target_filters_view()]
            .spacing(16)
            .align_items(Alignment::Start)
            .into()
    }

    fn target_filters_view(&self) -> Element<'_, Message> {
        let mut filter_column = column![
            text("Targets")
                .size(14)
                .style(theme::Text::Color(label_color()))
        ]
        .spacing(6);

        for target in self.sorted_targets() {
            let enabled = self.enabled_targets.contains(&target);
            filter_column = filter_column.push(
                checkbox(target.clone(), enabled)
                    .on_toggle(move |value| Message::ToggleTarget(target.clone(), value)),
            );
        }

        container(filter_column)
            .padding(8)
            .width(Length::FillPortion(1))
            .style(theme::Container::Box)
            .into()
    }

    fn log_lines_view(&self) -> Element<'_, Message> {
        let mut lines = column![].spacing(4);

        for entry in self.visible_entries() {
            let line = text(entry.format_line())
                .size(13)
                .horizontal_alignment(Horizontal::Left)
                .style(theme::Text::Color(level_color(entry.level)));
            lines = lines.push(line);
        }

        scrollable(lines)
            .height(Length::Fill)
            .width(Length::Fill)
            .into()
    }
}

fn status_panel<'a>(title: &'a str, value: &Value) -> Element<'a, Message> {
    let mut lines = column![text(title).size(16).style(theme::Text::Color(heading_color()))]
        .spacing(4);

    for (label, value) in status_lines(value) {
        lines = lines.push(
            row![
                text(label)
                    .size(13)
                    .width(Length::Fill)
                    .style(theme::Text::Color(label_color())),
                text(value)
                    .size(13)
                    .style(theme::Text::Color(Color::from_rgb8(0x1f, 0x2a, 0x37))),
            ]
            .spacing(12)
            .align_items(Alignment::Center),
        );
    }

    container(lines)
        .padding(12)
        .width(Length::FillPortion(1))
        .style(theme::Container::Box)
        .into()
}

fn entry_row<'a, E: ConfigEntry>(
    entry: &E,
    details: String,
    actions: Element<'a, Message>,
) -> Element<'a, Message> {
    let mut summary = column![
        text(entry.name().to_string())
            .size(14)
            .style(theme::Text::Color(Color::from_rgb8(0x1f, 0x2a, 0x37))),
        text(details)
            .size(12)
            .style(theme::Text::Color(Color::from_rgb8(0x4a, 0x4a, 0x4a))),
    ]
    .spacing(2)
    .width(Length::Fill);
    if let Some(description) = entry.description() {
        summary = summary.push(
            text(description.to_string())
                .size(12)
                .style(theme::Text::Color(muted_color())),
        );
    }

    container(
        row![summary, actions]
            .spacing(12)
            .align_items(Alignment::Center),
    )
    .padding(8)
    .style(theme::Container::Box)
    .into()
}

fn labeled_input<'a>(
    label: &'a str,
    placeholder: &'a str,
    value: &'a str,
    field: DialogField,
) -> Element<'a, Message> {
    column![
        text(label).size(12).style(theme::Text::Color(label_color())),
        text_input(placeholder, value)
            .on_input(move |value| Message::DialogChanged(field, value))
            .padding(6)
            .size(12)
            .width(Length::Fill),
    ]
    .spacing(4)
    .into()
}

fn alert_banner<'a>(
    message: String,
    severity: Severity,
    dismiss: Option<Message>,
) -> Element<'a, Message> {
    let mut content = row![text(message).size(14).width(Length::Fill)]
        .spacing(12)
        .align_items(Alignment::Center);
    if let Some(dismiss) = dismiss {
        content = content.push(
            button(text("×"))
                .style(theme::Button::Text)
                .on_press(dismiss),
        );
    }

    container(content)
        .padding([6, 12])
        .width(Length::Fill)
        .style(theme::Container::Custom(Box::new(AlertStyle { severity })))
        .into()
}

fn enabled_label(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}
