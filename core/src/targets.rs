pub const API: &str = "qbctl::api";
pub const MIRROR: &str = "qbctl::mirror";
pub const FORMS: &str = "qbctl::forms";
pub const CONNECTION: &str = "qbctl::connection";
pub const POLLING: &str = "qbctl::polling";
pub const NOTIFY: &str = "qbctl::notify";
pub const CONFIG: &str = "qbctl::config";
pub const UI: &str = "qbctl::ui";

pub const ALL: [&str; 8] = [API, MIRROR, FORMS, CONNECTION, POLLING, NOTIFY, CONFIG, UI];
