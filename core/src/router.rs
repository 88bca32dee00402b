use std::fmt;

use tracing::debug;

use crate::targets;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    #[default]
    Dashboard,
    LuckyDevices,
    QbitInstances,
    Settings,
    Logs,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Dashboard,
        View::LuckyDevices,
        View::QbitInstances,
        View::Settings,
        View::Logs,
    ];

    /// Name used by navigation controls.
    pub fn name(self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::LuckyDevices => "lucky",
            View::QbitInstances => "qbit",
            View::Settings => "settings",
            View::Logs => "logs",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::LuckyDevices => "Lucky Devices",
            View::QbitInstances => "qBittorrent",
            View::Settings => "Settings",
            View::Logs => "Logs",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|view| view.name() == name)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Exactly one view is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewRouter {
    active: View,
}

impl ViewRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> View {
        self.active
    }

    pub fn is_active(&self, view: View) -> bool {
        self.active == view
    }

    pub fn select(&mut self, view: View) {
        if self.active != view {
            debug!(target: targets::UI, from = self.active.name(), to = view.name(), "View switched");
        }
        self.active = view;
    }

    /// Switches by name. Unknown names leave the active view unchanged.
    pub fn switch_to(&mut self, name: &str) -> bool {
        match View::from_name(name) {
            Some(view) => {
                self.select(view);
                true
            }
            None => {
                debug!(target: targets::UI, name, "Ignoring unknown view name");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_dashboard() {
        let router = ViewRouter::new();
        assert_eq!(router.active(), View::Dashboard);
        assert!(router.is_active(View::Dashboard));
    }

    #[test]
    fn switching_activates_exactly_one_view() {
        let mut router = ViewRouter::new();
        assert!(router.switch_to("qbit"));
        for view in View::ALL {
            assert_eq!(router.is_active(view), view == View::QbitInstances);
        }
    }

    #[test]
    fn unknown_name_is_a_no_op() {
        let mut router = ViewRouter::new();
        router.select(View::Settings);
        assert!(!router.switch_to("downloads"));
        assert!(!router.switch_to(""));
        assert_eq!(router.active(), View::Settings);
    }

    #[test]
    fn names_round_trip() {
        for view in View::ALL {
            assert_eq!(View::from_name(view.name()), Some(view));
        }
    }
}
