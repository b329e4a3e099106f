//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`reservations`] - 取号与进度查询 (公共)
//! - [`queue`] - 队列快照 (公共) 与记录列表 (管理员)
//! - [`admin`] - 登录/注销、记录管理、导出
//! - [`settings`] - 管理员设置
//! - [`analytics`] - 统计
//! - [`services`] - 服务目录 (公共)
//! - [`ws`] - 实时推送

pub mod extract;

pub mod admin;
pub mod analytics;
pub mod health;
pub mod queue;
pub mod reservations;
pub mod services;
pub mod settings;
pub mod ws;
