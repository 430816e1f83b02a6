//! 远程动作网关：动作定义、错误分类、HTTP 实现与 Mock

pub mod action;
pub mod error;
pub mod http;
pub mod mock;
pub mod traits;

pub use action::{ActionName, ActionOutput, RemoteActionRequest, RemoteActionResult};
pub use error::{GatewayError, StatusClass};
pub use http::HttpGateway;
pub use mock::MockGateway;
pub use traits::ActionGateway;
