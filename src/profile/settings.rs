//! 个人资料偏好：固定字段集与默认值
//!
//! 字段集合客户端与持久化服务共同约定，不在客户端臆造新字段。
//! 读取时按行解码为 `SettingsPatch`（缺失或 null 的列视为未设置），再与默认值合并。

use serde::{Deserialize, Serialize};

/// 持久化层识别的全部字段（REST select 与 upsert 都只用这些列）
pub const SETTINGS_FIELDS: [&str; 9] = [
    "text_size",
    "high_contrast",
    "screen_reader",
    "voice_navigation",
    "notifications_enabled",
    "medication_reminders",
    "appointment_alerts",
    "government_updates",
    "language",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextSize {
    Small,
    #[default]
    Medium,
    Large,
    ExtraLarge,
}

/// 界面与语音助手语言
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Bn,
    Te,
    Mr,
    Ta,
    Gu,
    Kn,
    Ml,
    Pa,
}

impl Language {
    pub const ALL: [Language; 10] = [
        Language::En,
        Language::Hi,
        Language::Bn,
        Language::Te,
        Language::Mr,
        Language::Ta,
        Language::Gu,
        Language::Kn,
        Language::Ml,
        Language::Pa,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Bn => "bn",
            Language::Te => "te",
            Language::Mr => "mr",
            Language::Ta => "ta",
            Language::Gu => "gu",
            Language::Kn => "kn",
            Language::Ml => "ml",
            Language::Pa => "pa",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Hi => "हिंदी (Hindi)",
            Language::Bn => "বাংলা (Bengali)",
            Language::Te => "తెలుగు (Telugu)",
            Language::Mr => "मराठी (Marathi)",
            Language::Ta => "தமிழ் (Tamil)",
            Language::Gu => "ગુજરાતી (Gujarati)",
            Language::Kn => "ಕನ್ನಡ (Kannada)",
            Language::Ml => "മലയാളം (Malayalam)",
            Language::Pa => "ਪੰਜਾਬੀ (Punjabi)",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|l| l.code() == code)
    }
}

/// 完整的偏好记录；写入总是整条替换
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSettings {
    pub text_size: TextSize,
    pub high_contrast: bool,
    pub screen_reader: bool,
    pub voice_navigation: bool,
    pub notifications_enabled: bool,
    pub medication_reminders: bool,
    pub appointment_alerts: bool,
    pub government_updates: bool,
    pub language: Language,
}

impl Default for ProfileSettings {
    /// 尚无记录时的默认值
    fn default() -> Self {
        Self {
            text_size: TextSize::Medium,
            high_contrast: false,
            screen_reader: false,
            voice_navigation: true,
            notifications_enabled: true,
            medication_reminders: true,
            appointment_alerts: true,
            government_updates: true,
            language: Language::En,
        }
    }
}

impl ProfileSettings {
    /// 默认值，但语言取配置（无法识别时保持 en）
    pub fn defaults_with_language(code: &str) -> Self {
        Self {
            language: Language::parse(code).unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.text_size {
            self.text_size = v;
        }
        if let Some(v) = patch.high_contrast {
            self.high_contrast = v;
        }
        if let Some(v) = patch.screen_reader {
            self.screen_reader = v;
        }
        if let Some(v) = patch.voice_navigation {
            self.voice_navigation = v;
        }
        if let Some(v) = patch.notifications_enabled {
            self.notifications_enabled = v;
        }
        if let Some(v) = patch.medication_reminders {
            self.medication_reminders = v;
        }
        if let Some(v) = patch.appointment_alerts {
            self.appointment_alerts = v;
        }
        if let Some(v) = patch.government_updates {
            self.government_updates = v;
        }
        if let Some(v) = patch.language {
            self.language = v;
        }
    }

    pub fn merged(&self, patch: &SettingsPatch) -> Self {
        let mut next = self.clone();
        next.apply(patch);
        next
    }
}

/// 部分字段：对话框编辑与读取行解码都用它
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    pub text_size: Option<TextSize>,
    pub high_contrast: Option<bool>,
    pub screen_reader: Option<bool>,
    pub voice_navigation: Option<bool>,
    pub notifications_enabled: Option<bool>,
    pub medication_reminders: Option<bool>,
    pub appointment_alerts: Option<bool>,
    pub government_updates: Option<bool>,
    pub language: Option<Language>,
}

impl SettingsPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text_size(mut self, v: TextSize) -> Self {
        self.text_size = Some(v);
        self
    }

    pub fn high_contrast(mut self, v: bool) -> Self {
        self.high_contrast = Some(v);
        self
    }

    pub fn screen_reader(mut self, v: bool) -> Self {
        self.screen_reader = Some(v);
        self
    }

    pub fn voice_navigation(mut self, v: bool) -> Self {
        self.voice_navigation = Some(v);
        self
    }

    pub fn notifications_enabled(mut self, v: bool) -> Self {
        self.notifications_enabled = Some(v);
        self
    }

    pub fn medication_reminders(mut self, v: bool) -> Self {
        self.medication_reminders = Some(v);
        self
    }

    pub fn appointment_alerts(mut self, v: bool) -> Self {
        self.appointment_alerts = Some(v);
        self
    }

    pub fn government_updates(mut self, v: bool) -> Self {
        self.government_updates = Some(v);
        self
    }

    pub fn language(mut self, v: Language) -> Self {
        self.language = Some(v);
        self
    }

    /// 合并后来的编辑，同一字段以 `later` 为准
    pub fn absorb(&mut self, later: &SettingsPatch) {
        self.text_size = later.text_size.or(self.text_size);
        self.high_contrast = later.high_contrast.or(self.high_contrast);
        self.screen_reader = later.screen_reader.or(self.screen_reader);
        self.voice_navigation = later.voice_navigation.or(self.voice_navigation);
        self.notifications_enabled = later.notifications_enabled.or(self.notifications_enabled);
        self.medication_reminders = later.medication_reminders.or(self.medication_reminders);
        self.appointment_alerts = later.appointment_alerts.or(self.appointment_alerts);
        self.government_updates = later.government_updates.or(self.government_updates);
        self.language = later.language.or(self.language);
    }
}
