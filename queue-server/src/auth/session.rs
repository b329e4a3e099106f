//! 会话存储
//!
//! 会话令牌为 32 字节随机数 (hex)，无状态含义，仅作为查找键。
//! 每次成功校验都会把过期时间顺延一个 TTL (滑动过期)。

use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use serde::Serialize;
use shared::error::AppError;
use thiserror::Error;

const TOKEN_BYTES: usize = 32;

/// 会话错误
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Unknown session")]
    Unknown,

    #[error("Session expired")]
    Expired,

    #[error("Failed to generate session token")]
    TokenGenerationFailed,
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Unknown => AppError::unauthorized(),
            SessionError::Expired => AppError::session_expired(),
            SessionError::TokenGenerationFailed => AppError::internal(err.to_string()),
        }
    }
}

/// 已认证的管理员会话
#[derive(Debug, Clone, Serialize)]
pub struct AdminSession {
    pub session_id: String,
    pub created_at: i64,
    pub expires_at: i64,
}

impl AdminSession {
    /// 日志中使用的令牌指纹
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.session_id)
    }
}

pub fn fingerprint(session_id: &str) -> String {
    session_id.chars().take(8).collect()
}

/// 内存会话表
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, AdminSession>,
    ttl_millis: i64,
    rng: SystemRandom,
}

impl SessionStore {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl_millis: ttl_minutes.max(1) * 60_000,
            rng: SystemRandom::new(),
        }
    }

    /// 签发新会话
    pub fn issue(&self, now: i64) -> Result<AdminSession, SessionError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| SessionError::TokenGenerationFailed)?;
        let session = AdminSession {
            session_id: hex::encode(bytes),
            created_at: now,
            expires_at: now + self.ttl_millis,
        };
        self.sessions
            .insert(session.session_id.clone(), session.clone());
        Ok(session)
    }

    /// 校验并顺延会话
    pub fn validate(&self, session_id: &str, now: i64) -> Result<AdminSession, SessionError> {
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or(SessionError::Unknown)?;
        if entry.expires_at <= now {
            drop(entry);
            self.sessions.remove(session_id);
            return Err(SessionError::Expired);
        }
        entry.expires_at = now + self.ttl_millis;
        Ok(entry.clone())
    }

    pub fn revoke(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// 清理过期会话，返回清理数量
    pub fn sweep(&self, now: i64) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at > now);
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// 从 `Authorization: Bearer <token>` 头提取令牌
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}
