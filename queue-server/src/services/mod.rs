//! 服务层
//!
//! - [`https`] - Router 组装、中间件与 HTTP 服务

pub mod https;

pub use https::{HttpService, build_app, build_router};
