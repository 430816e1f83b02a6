//! 核心层：错误分类、视图状态、提示总线、挂载监管

pub mod error;
pub mod notice;
pub mod session_supervisor;
pub mod state;

pub use error::{AppError, ErrorKind, Surface};
pub use notice::{Notice, NoticeBus, NoticeLevel};
pub use session_supervisor::SessionSupervisor;
pub use state::{ViewPhase, ViewState};
