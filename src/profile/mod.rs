//! 个人资料：偏好字段、持久化、设置对话框、帮助与支持

pub mod dialog;
pub mod settings;
pub mod store;
pub mod support;

pub use dialog::{DialogKind, DialogPhase, SettingsDialog};
pub use settings::{Language, ProfileSettings, SettingsPatch, TextSize, SETTINGS_FIELDS};
pub use store::{InMemoryProfileStore, ProfileError, ProfileStore, RestProfileStore, UserSession};
pub use support::{submit_support_request, SupportRequest, FAQS, SUPPORT_EMAIL, SUPPORT_PHONE};
