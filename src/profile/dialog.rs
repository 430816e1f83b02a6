//! 偏好设置对话框：打开时读取，保存时整条 upsert
//!
//! 读取失败给出非致命提示并展示默认值；此时保存前会重新读取，只把本次编辑合并到已存记录上，
//! 重读仍失败则拒绝保存。写入失败对话框保持打开以便重试。

use std::sync::Arc;

use crate::core::NoticeBus;
use crate::profile::{ProfileError, ProfileSettings, ProfileStore, SettingsPatch, UserSession};

/// 对话框种类（决定标题与提示文案）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Accessibility,
    Notifications,
    Language,
}

impl DialogKind {
    pub fn title(&self) -> &'static str {
        match self {
            DialogKind::Accessibility => "Accessibility Settings",
            DialogKind::Notifications => "Notification Settings",
            DialogKind::Language => "Language Preferences",
        }
    }

    fn load_failed(&self) -> &'static str {
        match self {
            DialogKind::Accessibility => "Error loading accessibility settings",
            DialogKind::Notifications => "Error loading notification settings",
            DialogKind::Language => "Error loading language preference",
        }
    }

    fn saved(&self) -> &'static str {
        match self {
            DialogKind::Accessibility => "Accessibility settings updated",
            DialogKind::Notifications => "Notification settings updated",
            DialogKind::Language => "Language preference updated",
        }
    }

    fn save_failed(&self) -> &'static str {
        match self {
            DialogKind::Language => "Error updating language",
            _ => "Error updating settings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPhase {
    Closed,
    Loading,
    Open,
    Saving,
}

/// 单个设置对话框
pub struct SettingsDialog {
    kind: DialogKind,
    store: Arc<dyn ProfileStore>,
    notices: NoticeBus,
    session: UserSession,
    defaults: ProfileSettings,
    draft: ProfileSettings,
    /// 本次打开后的编辑
    edits: SettingsPatch,
    /// 草稿是否基于已存记录（读取成功或确认无记录）
    loaded: bool,
    phase: DialogPhase,
}

impl SettingsDialog {
    pub fn new(
        kind: DialogKind,
        store: Arc<dyn ProfileStore>,
        session: UserSession,
        notices: NoticeBus,
    ) -> Self {
        Self {
            kind,
            store,
            notices,
            session,
            defaults: ProfileSettings::default(),
            draft: ProfileSettings::default(),
            edits: SettingsPatch::new(),
            loaded: false,
            phase: DialogPhase::Closed,
        }
    }

    /// 无记录或读取失败时使用的默认值（如配置了默认语言）
    pub fn with_defaults(mut self, defaults: ProfileSettings) -> Self {
        self.draft = defaults.clone();
        self.defaults = defaults;
        self
    }

    pub fn kind(&self) -> DialogKind {
        self.kind
    }

    pub fn phase(&self) -> DialogPhase {
        self.phase
    }

    pub fn draft(&self) -> &ProfileSettings {
        &self.draft
    }

    /// 打开并加载当前记录
    pub async fn open(&mut self) {
        self.phase = DialogPhase::Loading;
        self.edits = SettingsPatch::new();
        self.loaded = false;
        self.draft = match self.store.fetch(&self.session).await {
            Ok(Some(settings)) => {
                self.loaded = true;
                settings
            }
            Ok(None) => {
                self.loaded = true;
                self.defaults.clone()
            }
            Err(e) => {
                tracing::warn!(dialog = ?self.kind, "profile load failed: {}", e);
                self.notices.error(self.kind.load_failed());
                self.defaults.clone()
            }
        };
        self.phase = DialogPhase::Open;
    }

    /// 编辑草稿（仅在打开时生效）
    pub fn apply(&mut self, patch: &SettingsPatch) -> bool {
        if self.phase != DialogPhase::Open {
            return false;
        }
        self.draft.apply(patch);
        self.edits.absorb(patch);
        true
    }

    /// 保存：整条写入；成功关闭，失败保持打开
    pub async fn save(&mut self) -> Result<(), ProfileError> {
        if self.phase != DialogPhase::Open {
            return Err(ProfileError::DialogClosed);
        }
        self.phase = DialogPhase::Saving;

        if !self.loaded {
            // 草稿来自默认值，先取回已存记录再合并本次编辑
            match self.store.fetch(&self.session).await {
                Ok(stored) => {
                    let base = stored.unwrap_or_else(|| self.defaults.clone());
                    self.draft = base.merged(&self.edits);
                    self.loaded = true;
                }
                Err(e) => {
                    tracing::warn!(dialog = ?self.kind, "profile reload before save failed: {}", e);
                    self.notices.error(self.kind.load_failed());
                    self.phase = DialogPhase::Open;
                    return Err(e);
                }
            }
        }

        match self.store.upsert(&self.session, &self.draft).await {
            Ok(()) => {
                self.notices.success(self.kind.saved());
                self.phase = DialogPhase::Closed;
                Ok(())
            }
            Err(e) => {
                let message = match &e {
                    ProfileError::Remote(remote) => remote.user_message(),
                    _ => self.kind.save_failed().to_string(),
                };
                self.notices.error(message);
                self.phase = DialogPhase::Open;
                Err(e)
            }
        }
    }

    pub fn cancel(&mut self) {
        self.phase = DialogPhase::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NoticeLevel;
    use crate::profile::{InMemoryProfileStore, Language, TextSize};

    fn setup() -> (Arc<InMemoryProfileStore>, NoticeBus, UserSession) {
        (
            Arc::new(InMemoryProfileStore::new()),
            NoticeBus::new(16),
            UserSession::new("user-42"),
        )
    }

    #[tokio::test]
    async fn test_open_without_record_shows_defaults() {
        let (store, bus, session) = setup();
        let mut dialog = SettingsDialog::new(DialogKind::Accessibility, store, session, bus);
        dialog.open().await;
        assert_eq!(dialog.phase(), DialogPhase::Open);
        assert_eq!(dialog.draft(), &ProfileSettings::default());
    }

    #[tokio::test]
    async fn test_save_writes_full_record_and_closes() {
        let (store, bus, session) = setup();
        let existing = ProfileSettings {
            medication_reminders: false,
            language: Language::Bn,
            ..ProfileSettings::default()
        };
        store.insert("user-42", existing.clone()).await;
        let mut rx = bus.subscribe();

        let mut dialog =
            SettingsDialog::new(DialogKind::Accessibility, store.clone(), session.clone(), bus);
        dialog.open().await;
        assert!(dialog.apply(&SettingsPatch::new().text_size(TextSize::Large).high_contrast(true)));
        dialog.save().await.unwrap();
        assert_eq!(dialog.phase(), DialogPhase::Closed);

        let saved = store.fetch(&session).await.unwrap().unwrap();
        assert_eq!(saved.text_size, TextSize::Large);
        assert!(saved.high_contrast);
        assert!(!saved.medication_reminders);
        assert_eq!(saved.language, Language::Bn);

        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.message, "Accessibility settings updated");
    }

    #[tokio::test]
    async fn test_load_failure_is_non_fatal() {
        let (store, bus, session) = setup();
        store.set_unavailable(true);
        let mut rx = bus.subscribe();
        let mut dialog = SettingsDialog::new(DialogKind::Language, store, session, bus)
            .with_defaults(ProfileSettings::defaults_with_language("hi"));
        dialog.open().await;

        assert_eq!(dialog.phase(), DialogPhase::Open);
        assert_eq!(dialog.draft().language, Language::Hi);
        assert_eq!(rx.recv().await.unwrap().message, "Error loading language preference");
    }

    #[tokio::test]
    async fn test_write_failure_keeps_dialog_open_for_retry() {
        let (store, bus, session) = setup();
        let mut dialog =
            SettingsDialog::new(DialogKind::Notifications, store.clone(), session.clone(), bus);
        dialog.open().await;
        dialog.apply(&SettingsPatch::new().government_updates(false));

        store.set_unavailable(true);
        assert!(dialog.save().await.is_err());
        assert_eq!(dialog.phase(), DialogPhase::Open);
        assert!(!dialog.draft().government_updates);

        store.set_unavailable(false);
        dialog.save().await.unwrap();
        assert!(!store.fetch(&session).await.unwrap().unwrap().government_updates);
    }

    #[tokio::test]
    async fn test_save_after_failed_load_keeps_untouched_fields() {
        let (store, bus, session) = setup();
        let stored = ProfileSettings {
            text_size: TextSize::Large,
            government_updates: false,
            language: Language::Te,
            ..ProfileSettings::default()
        };
        store.insert("user-42", stored.clone()).await;

        let mut dialog =
            SettingsDialog::new(DialogKind::Notifications, store.clone(), session.clone(), bus);
        store.set_unavailable(true);
        dialog.open().await;
        store.set_unavailable(false);

        dialog.apply(&SettingsPatch::new().medication_reminders(false));
        dialog.save().await.unwrap();

        let after = store.fetch(&session).await.unwrap().unwrap();
        assert_eq!(
            after,
            stored.merged(&SettingsPatch::new().medication_reminders(false))
        );
        assert_eq!(dialog.draft(), &after);
    }

    #[tokio::test]
    async fn test_save_refused_while_record_unreadable() {
        let (store, bus, session) = setup();
        let stored = ProfileSettings {
            language: Language::Ta,
            ..ProfileSettings::default()
        };
        store.insert("user-42", stored.clone()).await;
        let mut rx = bus.subscribe();

        let mut dialog =
            SettingsDialog::new(DialogKind::Accessibility, store.clone(), session.clone(), bus);
        store.set_unavailable(true);
        dialog.open().await;
        dialog.apply(&SettingsPatch::new().high_contrast(true));

        assert!(dialog.save().await.is_err());
        assert_eq!(dialog.phase(), DialogPhase::Open);
        assert_eq!(rx.recv().await.unwrap().message, "Error loading accessibility settings");
        assert_eq!(rx.recv().await.unwrap().message, "Error loading accessibility settings");

        store.set_unavailable(false);
        assert_eq!(store.fetch(&session).await.unwrap().unwrap(), stored);
        dialog.save().await.unwrap();
        let after = store.fetch(&session).await.unwrap().unwrap();
        assert!(after.high_contrast);
        assert_eq!(after.language, Language::Ta);
    }

    #[tokio::test]
    async fn test_closed_dialog_rejects_edits() {
        let (store, bus, session) = setup();
        let mut dialog = SettingsDialog::new(DialogKind::Language, store, session, bus);
        assert!(!dialog.apply(&SettingsPatch::new().language(Language::Ta)));
        assert_eq!(dialog.save().await, Err(ProfileError::DialogClosed));

        dialog.open().await;
        dialog.cancel();
        assert_eq!(dialog.phase(), DialogPhase::Closed);
    }
}
