//! 图片类动作编排器：药品分析、处方识别、表单提取
//!
//! 三个功能共用同一状态机，差异（动作名、提示文案）由 ImageFeature 标记类型提供。
//! 视图通过 watch 通道发布；Pending 检查与置位在一次 `send_if_modified` 内完成。

use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::watch;

use crate::core::{AppError, NoticeBus, SessionSupervisor, ViewState};
use crate::gateway::{ActionGateway, ActionName, GatewayError, RemoteActionRequest};
use crate::media::{encode_image, ImageAsset, ImageSource};
use crate::orchestrator::SubmitOutcome;

/// 图片功能描述
pub trait ImageFeature: Send + Sync + 'static {
    const ACTION: ActionName;
    const SUCCESS_NOTICE: &'static str;
    /// 网关没有给出消息时的失败文案
    const FAILURE_NOTICE: &'static str;
}

/// 药品扫描
#[derive(Debug)]
pub struct MedicineAnalysis;

impl ImageFeature for MedicineAnalysis {
    const ACTION: ActionName = ActionName::AnalyzeMedicine;
    const SUCCESS_NOTICE: &'static str = "Medicine analyzed successfully";
    const FAILURE_NOTICE: &'static str = "Failed to analyze medicine";
}

/// 处方识别
#[derive(Debug)]
pub struct PrescriptionReading;

impl ImageFeature for PrescriptionReading {
    const ACTION: ActionName = ActionName::ReadPrescription;
    const SUCCESS_NOTICE: &'static str = "Prescription read successfully";
    const FAILURE_NOTICE: &'static str = "Failed to read prescription";
}

/// 拍照填表
#[derive(Debug)]
pub struct FormExtraction;

impl ImageFeature for FormExtraction {
    const ACTION: ActionName = ActionName::ExtractFormData;
    const SUCCESS_NOTICE: &'static str = "Data extracted successfully";
    const FAILURE_NOTICE: &'static str = "Failed to extract form data";
}

/// 图片编排器对 UI 的投影：状态 + 当前图片预览
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageView {
    pub state: ViewState<String>,
    pub image: Option<ImageAsset>,
}

/// 图片动作编排器
pub struct ImageActionOrchestrator<F: ImageFeature> {
    gateway: Arc<dyn ActionGateway>,
    notices: NoticeBus,
    supervisor: SessionSupervisor,
    view_tx: watch::Sender<ImageView>,
    _feature: PhantomData<F>,
}

pub type MedicineScanner = ImageActionOrchestrator<MedicineAnalysis>;
pub type PrescriptionReader = ImageActionOrchestrator<PrescriptionReading>;
pub type PhotoToForm = ImageActionOrchestrator<FormExtraction>;

impl<F: ImageFeature> ImageActionOrchestrator<F> {
    pub fn new(gateway: Arc<dyn ActionGateway>, notices: NoticeBus) -> Self {
        let (view_tx, _) = watch::channel(ImageView::default());
        Self {
            gateway,
            notices,
            supervisor: SessionSupervisor::new(),
            view_tx,
            _feature: PhantomData,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ImageView> {
        self.view_tx.subscribe()
    }

    pub fn view(&self) -> ImageView {
        self.view_tx.borrow().clone()
    }

    /// 编码原始图片后提交；编码失败在本地提示，不调用网关
    pub async fn submit_source(&self, source: ImageSource) -> SubmitOutcome {
        match encode_image(source) {
            Ok(asset) => self.submit(asset).await,
            Err(e) => {
                self.notices.error(AppError::from(e).user_message());
                SubmitOutcome::Rejected
            }
        }
    }

    /// 提交已编码图片；Pending 期间再次提交直接忽略
    pub async fn submit(&self, asset: ImageAsset) -> SubmitOutcome {
        if self.supervisor.is_unmounted() {
            tracing::debug!(action = %F::ACTION, "submit after unmount dropped");
            return SubmitOutcome::Abandoned;
        }

        let started = self.view_tx.send_if_modified(|view| {
            if view.state.is_pending() {
                return false;
            }
            view.state = ViewState::Pending;
            view.image = Some(asset.clone());
            true
        });
        if !started {
            tracing::debug!(action = %F::ACTION, "submit ignored while pending");
            return SubmitOutcome::Ignored;
        }

        let request = RemoteActionRequest::image(F::ACTION, asset.data_url());
        let result = self.gateway.invoke(request).await.and_then(|out| {
            if out.action() == F::ACTION {
                Ok(out.into_text())
            } else {
                Err(GatewayError::MalformedResponse(format!(
                    "expected {} result, got {}",
                    F::ACTION,
                    out.action()
                )))
            }
        });

        if self.supervisor.is_unmounted() {
            tracing::debug!(action = %F::ACTION, "late response discarded after unmount");
            return SubmitOutcome::Abandoned;
        }

        match result {
            Ok(text) => {
                self.view_tx.send_modify(|view| view.state = ViewState::Success(text));
                self.notices.success(F::SUCCESS_NOTICE);
                SubmitOutcome::Succeeded
            }
            Err(e) => {
                let message = Some(e.user_message())
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| F::FAILURE_NOTICE.to_string());
                tracing::warn!(action = %F::ACTION, "action failed: {}", e);
                self.view_tx
                    .send_modify(|view| view.state = ViewState::Error(message.clone()));
                self.notices.error(message);
                SubmitOutcome::Failed
            }
        }
    }

    /// Success / Error → Idle，丢弃结果与图片；Idle / Pending 时忽略
    pub fn clear(&self) -> bool {
        self.view_tx.send_if_modified(|view| match view.state {
            ViewState::Success(_) | ViewState::Error(_) => {
                *view = ImageView::default();
                true
            }
            ViewState::Idle | ViewState::Pending => false,
        })
    }

    /// 页面卸载：之后到达的响应被丢弃
    pub fn unmount(&self) {
        self.supervisor.unmount();
    }
}
