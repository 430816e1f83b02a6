//! 动作编排器：一个页面实例一个编排器
//!
//! 每个编排器独占自己的视图状态，经 watch 通道发布给 UI。
//! 同一实例内提交串行（Pending 守卫）；卸载后到达的响应直接丢弃。

pub mod chat;
pub mod image;
pub mod voice;

pub use chat::{ChatOrchestrator, ChatView};
pub use image::{
    FormExtraction, ImageActionOrchestrator, ImageFeature, ImageView, MedicineAnalysis,
    MedicineScanner, PhotoToForm, PrescriptionReader, PrescriptionReading,
};
pub use voice::{VoiceInput, VoiceToggle};

/// 一次提交的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// 网关返回成功，视图已进入 Success
    Succeeded,
    /// 网关失败，视图已进入 Error
    Failed,
    /// 本地校验未通过，未调用网关
    Rejected,
    /// 已有请求进行中
    Ignored,
    /// 响应到达时页面已卸载
    Abandoned,
}
