//! 编排器场景集成测试（Mock 网关 + 内存资料存储）

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jansathi::core::{NoticeBus, NoticeLevel, ViewPhase, ViewState};
    use jansathi::gateway::{ActionOutput, GatewayError, MockGateway};
    use jansathi::media::ImageSource;
    use jansathi::memory::ConversationTurn;
    use jansathi::orchestrator::{ChatOrchestrator, MedicineScanner, SubmitOutcome};
    use jansathi::profile::{
        DialogKind, InMemoryProfileStore, Language, ProfileSettings, ProfileStore, SettingsDialog,
        SettingsPatch, TextSize, UserSession,
    };

    fn jpeg(tag: u8) -> ImageSource {
        ImageSource::file(vec![0xFF, 0xD8, 0xFF, 0xE0, tag, tag], "strip.jpg")
    }

    #[tokio::test]
    async fn test_medicine_scan_then_clear() {
        let gw = Arc::new(MockGateway::new());
        gw.push_ok(ActionOutput::Analysis("Report X".into()));
        let bus = NoticeBus::new(16);
        let mut notices = bus.subscribe();
        let scanner = MedicineScanner::new(gw.clone(), bus);
        let mut view = scanner.subscribe();

        assert_eq!(scanner.submit_source(jpeg(1)).await, SubmitOutcome::Succeeded);
        assert!(view.has_changed().unwrap());
        let current = view.borrow_and_update().clone();
        assert_eq!(current.state, ViewState::Success("Report X".into()));
        assert_eq!(current.image.unwrap().mime(), "image/jpeg");
        assert_eq!(notices.recv().await.unwrap().message, "Medicine analyzed successfully");

        assert!(scanner.clear());
        let cleared = scanner.view();
        assert_eq!(cleared.state, ViewState::Idle);
        assert!(cleared.image.is_none());
        assert_eq!(gw.call_count(), 1);
    }

    #[tokio::test]
    async fn test_offline_then_retry_overwrites_error() {
        let gw = Arc::new(MockGateway::new());
        gw.push_err(GatewayError::Network("connection refused".into()))
            .push_ok(ActionOutput::Analysis("Report Y".into()));
        let scanner = MedicineScanner::new(gw.clone(), NoticeBus::new(16));

        assert_eq!(scanner.submit_source(jpeg(2)).await, SubmitOutcome::Failed);
        let message = scanner.view().state.error().map(str::to_string).unwrap();
        assert!(!message.is_empty());

        assert_eq!(scanner.submit_source(jpeg(2)).await, SubmitOutcome::Succeeded);
        assert_eq!(scanner.view().state, ViewState::Success("Report Y".into()));
        assert_eq!(gw.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_discards_previous_success() {
        let gw = Arc::new(MockGateway::new());
        gw.push_ok(ActionOutput::Analysis("old report".into()))
            .push_err(GatewayError::from_status(402, None));
        let scanner = MedicineScanner::new(gw, NoticeBus::new(16));

        scanner.submit_source(jpeg(3)).await;
        scanner.submit_source(jpeg(4)).await;
        let state = scanner.view().state;
        assert_eq!(state.phase(), ViewPhase::Error);
        assert_eq!(state.result(), None);
        assert_eq!(
            state.error(),
            Some("Payment required. Please add credits to your workspace.")
        );
    }

    #[tokio::test]
    async fn test_pending_observed_between_transitions() {
        let gw = Arc::new(MockGateway::new());
        gw.hold();
        let scanner = Arc::new(MedicineScanner::new(gw.clone(), NoticeBus::new(16)));
        let mut view = scanner.subscribe();

        let task = {
            let scanner = scanner.clone();
            tokio::spawn(async move { scanner.submit_source(jpeg(5)).await })
        };
        view.changed().await.unwrap();
        assert!(view.borrow_and_update().state.is_pending());

        assert_eq!(scanner.submit_source(jpeg(6)).await, SubmitOutcome::Ignored);
        gw.release();
        assert_eq!(task.await.unwrap(), SubmitOutcome::Succeeded);

        view.changed().await.unwrap();
        assert_eq!(view.borrow().state.phase(), ViewPhase::Success);
        assert_eq!(gw.call_count(), 1);
    }

    #[tokio::test]
    async fn test_chat_transcript_success_and_failure() {
        let gw = Arc::new(MockGateway::new());
        gw.push_ok(ActionOutput::Reply("Hello".into()));
        let chat = ChatOrchestrator::new(gw.clone(), NoticeBus::new(16));
        chat.submit("Hi").await;
        assert_eq!(
            chat.transcript().turns(),
            &[ConversationTurn::user("Hi"), ConversationTurn::assistant("Hello")]
        );

        let gw = Arc::new(MockGateway::new());
        gw.push_err(GatewayError::from_status(500, Some("upstream down".into())));
        let bus = NoticeBus::new(16);
        let mut notices = bus.subscribe();
        let chat = ChatOrchestrator::new(gw, bus);
        chat.submit("Hi").await;
        assert_eq!(chat.transcript().turns(), &[ConversationTurn::user("Hi")]);
        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "upstream down");
    }

    #[tokio::test]
    async fn test_profile_partial_edit_round_trip() {
        let store = Arc::new(InMemoryProfileStore::new());
        let session = UserSession::new("citizen-7");
        let before = ProfileSettings {
            appointment_alerts: false,
            language: Language::Te,
            ..ProfileSettings::default()
        };
        store.insert("citizen-7", before.clone()).await;

        let mut dialog = SettingsDialog::new(
            DialogKind::Accessibility,
            store.clone(),
            session.clone(),
            NoticeBus::new(16),
        );
        dialog.open().await;
        dialog.apply(
            &SettingsPatch::new()
                .text_size(TextSize::Large)
                .high_contrast(true),
        );
        dialog.save().await.unwrap();

        let after = store.fetch(&session).await.unwrap().unwrap();
        assert_eq!(after.text_size, TextSize::Large);
        assert!(after.high_contrast);
        assert_eq!(
            after,
            before.merged(&SettingsPatch::new().text_size(TextSize::Large).high_contrast(true))
        );
    }

    #[tokio::test]
    async fn test_language_save_after_transient_load_error() {
        let store = Arc::new(InMemoryProfileStore::new());
        let session = UserSession::new("citizen-9");
        let before = ProfileSettings {
            text_size: TextSize::Large,
            government_updates: false,
            language: Language::Te,
            ..ProfileSettings::default()
        };
        store.insert("citizen-9", before.clone()).await;

        let mut dialog = SettingsDialog::new(
            DialogKind::Language,
            store.clone(),
            session.clone(),
            NoticeBus::new(16),
        );
        store.set_unavailable(true);
        dialog.open().await;
        assert_eq!(dialog.draft(), &ProfileSettings::default());
        store.set_unavailable(false);

        dialog.apply(&SettingsPatch::new().language(Language::Hi));
        dialog.save().await.unwrap();

        let after = store.fetch(&session).await.unwrap().unwrap();
        assert_eq!(after.language, Language::Hi);
        assert_eq!(after.text_size, TextSize::Large);
        assert!(!after.government_updates);
    }
}
