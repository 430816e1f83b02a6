//! JanSathi - 健康与政务 AI 助手的编排核心
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 视图状态、全局提示总线、卸载监管、统一错误
//! - **gateway**: 远程动作网关（托管函数调用、状态分类、Mock）
//! - **media**: 图片编码、麦克风录音、文本转语音适配
//! - **memory**: 对话记录
//! - **observability**: 日志初始化
//! - **orchestrator**: 药品扫描 / 处方识别 / 拍照填表 / 对话编排器
//! - **profile**: 偏好设置读写、设置对话框、帮助与支持
//! - **routes**: 页面路由表
//! - **functions**: 托管函数服务（feature = "functions"）

pub mod config;
pub mod core;
pub mod gateway;
pub mod media;
pub mod memory;
pub mod observability;
pub mod orchestrator;
pub mod profile;
pub mod routes;

#[cfg(feature = "functions")]
pub mod functions;

pub use orchestrator::{ChatOrchestrator, ImageActionOrchestrator, SubmitOutcome};
pub use routes::Route;
