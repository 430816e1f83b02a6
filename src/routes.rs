//! 页面路由表
//!
//! 路径精确匹配（忽略末尾斜杠与查询串），未知路径落到 NotFound。

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Health,
    MedicineScanner,
    PrescriptionReader,
    GAssist,
    PhotoToForm,
    VoiceChatbot,
    Profile,
    About,
    NotFound,
}

impl Route {
    pub const ALL: [Route; 9] = [
        Route::Home,
        Route::Health,
        Route::MedicineScanner,
        Route::PrescriptionReader,
        Route::GAssist,
        Route::PhotoToForm,
        Route::VoiceChatbot,
        Route::Profile,
        Route::About,
    ];

    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Self::ALL
            .into_iter()
            .find(|r| r.path() == normalized)
            .unwrap_or(Route::NotFound)
    }

    /// NotFound 没有固定路径，返回空串
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Health => "/health",
            Route::MedicineScanner => "/health/medicine-scanner",
            Route::PrescriptionReader => "/health/prescription-reader",
            Route::GAssist => "/g-assist",
            Route::PhotoToForm => "/g-assist/photo-to-form",
            Route::VoiceChatbot => "/g-assist/voice-chatbot",
            Route::Profile => "/profile",
            Route::About => "/about",
            Route::NotFound => "",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Home => "JanSathi",
            Route::Health => "Health",
            Route::MedicineScanner => "Medicine Scanner",
            Route::PrescriptionReader => "Prescription Reader",
            Route::GAssist => "G-Assist",
            Route::PhotoToForm => "Photo to Form",
            Route::VoiceChatbot => "Voice Chatbot",
            Route::Profile => "Profile",
            Route::About => "About",
            Route::NotFound => "Page not found",
        }
    }

    /// 返回按钮的目标；功能页回到所属分区，其余回首页
    pub fn parent(&self) -> Option<Route> {
        match self {
            Route::Home => None,
            Route::MedicineScanner | Route::PrescriptionReader => Some(Route::Health),
            Route::PhotoToForm | Route::VoiceChatbot => Some(Route::GAssist),
            _ => Some(Route::Home),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Route::NotFound)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
