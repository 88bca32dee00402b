use iced::{Background, Border, Color, Theme, Vector};
use qbctl_core::Severity;

#[derive(Debug, Clone, Copy)]
pub(crate) struct TabStyle {
    pub(crate) active: bool,
}

impl iced::widget::button::StyleSheet for TabStyle {
    type Style = Theme;

    fn active(&self, style: &Self::Style) -> iced::widget::button::Appearance {
        let palette = style.extended_palette();
        let background = if self.active {
            palette.background.base.color
        } else {
            palette.background.weak.color
        };
        let text_color = if self.active {
            palette.background.base.text
        } else {
            palette.background.weak.text
        };

        iced::widget::button::Appearance {
            background: Some(Background::Color(background)),
            text_color,
            border: Border {
                color: palette.background.strong.color,
                width: 1.0,
                radius: [8.0, 8.0, 0.0, 0.0].into(),
            },
            shadow_offset: if self.active {
                Vector::new(0.0, 0.0)
            } else {
                Vector::new(0.0, 1.0)
            },
            ..iced::widget::button::Appearance::default()
        }
    }

    fn hovered(&self, style: &Self::Style) -> iced::widget::button::Appearance {
        let mut appearance = self.active(style);
        if !self.active {
            if let Some(Background::Color(color)) = appearance.background {
                let lifted = Color {
                    r: (color.r + 0.05).min(1.0),
                    g: (color.g + 0.05).min(1.0),
                    b: (color.b + 0.05).min(1.0),
                    a: color.a,
                };
                appearance.background = Some(Background::Color(lifted));
            }
        }
        appearance
    }
}

/// Alert banner tinted by severity.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AlertStyle {
    pub(crate) severity: Severity,
}

impl AlertStyle {
    fn accent(self) -> Color {
        match self.severity {
            Severity::Info => Color::from_rgb8(0x3b, 0x82, 0xf6),
            Severity::Success => Color::from_rgb8(0x22, 0x9a, 0x5c),
            Severity::Danger => Color::from_rgb8(0xe0, 0x4f, 0x4f),
        }
    }
}

impl iced::widget::container::StyleSheet for AlertStyle {
    type Style = Theme;

    fn appearance(&self, _style: &Self::Style) -> iced::widget::container::Appearance {
        let accent = self.accent();
        iced::widget::container::Appearance {
            text_color: Some(accent),
            background: Some(Background::Color(Color { a: 0.12, ..accent })),
            border: Border {
                color: accent,
                width: 1.0,
                radius: 6.0.into(),
            },
            ..iced::widget::container::Appearance::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct DialogStyle;

impl iced::widget::container::StyleSheet for DialogStyle {
    type Style = Theme;

    fn appearance(&self, style: &Self::Style) -> iced::widget::container::Appearance {
        let palette = style.extended_palette();
        iced::widget::container::Appearance {
            background: Some(Background::Color(palette.background.base.color)),
            border: Border {
                color: palette.primary.strong.color,
                width: 2.0,
                radius: 8.0.into(),
            },
            ..iced::widget::container::Appearance::default()
        }
    }
}
