//! 管理员认证模块
//!
//! 单一管理员口令 + 不透明会话令牌：
//! - [`AdminAuth`] - 口令校验与会话签发
//! - [`SessionStore`] - 会话存储 (滑动过期)
//! - [`AdminSession`] - 当前会话上下文 (extractor)
//! - [`require_admin`] - 认证中间件

pub mod extractor;
pub mod middleware;
pub mod password;
pub mod session;

pub use middleware::{is_public_route, require_admin};
pub use session::{AdminSession, SessionError, SessionStore};

use crate::core::Config;
use crate::security_log;
use shared::error::{AppError, AppResult};

/// 开发环境默认口令 (生产环境必须设置 ADMIN_PASSWORD)
pub const DEV_ADMIN_PASSWORD: &str = "admin123";

/// 管理员认证服务
#[derive(Debug)]
pub struct AdminAuth {
    /// Argon2 PHC 字符串，明文口令不驻留内存
    password_hash: String,
    sessions: SessionStore,
}

impl AdminAuth {
    /// 从配置构建：哈希口令，创建会话存储
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let password = match &config.admin_password {
            Some(p) if !p.is_empty() => p.clone(),
            _ if config.is_production() => {
                return Err(AppError::with_message(
                    shared::error::ErrorCode::ConfigError,
                    "ADMIN_PASSWORD must be set in production",
                ));
            }
            _ => {
                tracing::warn!("ADMIN_PASSWORD not set, using development default");
                DEV_ADMIN_PASSWORD.to_string()
            }
        };
        Self::new(&password, config.session_ttl_minutes)
    }

    pub fn new(password: &str, session_ttl_minutes: i64) -> AppResult<Self> {
        let password_hash = password::hash_password(password)
            .map_err(|e| AppError::internal(format!("Failed to hash admin password: {}", e)))?;
        Ok(Self {
            password_hash,
            sessions: SessionStore::new(session_ttl_minutes),
        })
    }

    /// 校验口令并签发会话
    pub fn login(&self, password: &str, now: i64) -> AppResult<AdminSession> {
        if !password::verify_password(password, &self.password_hash) {
            security_log!("WARN", "login_failed", reason = "invalid_password");
            return Err(AppError::invalid_credentials());
        }
        let session = self.sessions.issue(now).map_err(AppError::from)?;
        security_log!(
            "INFO",
            "login_success",
            session = session.fingerprint(),
            expires_at = session.expires_at
        );
        Ok(session)
    }

    pub fn logout(&self, session_id: &str) -> bool {
        let revoked = self.sessions.revoke(session_id);
        if revoked {
            security_log!("INFO", "logout", session = session::fingerprint(session_id));
        }
        revoked
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_and_logout() {
        let auth = AdminAuth::new("s3cret", 30).unwrap();

        assert!(auth.login("wrong", 0).is_err());
        let session = auth.login("s3cret", 0).unwrap();
        assert_eq!(session.expires_at, 30 * 60_000);
        assert!(auth.sessions().validate(&session.session_id, 1_000).is_ok());

        assert!(auth.logout(&session.session_id));
        assert!(!auth.logout(&session.session_id));
        assert!(auth.sessions().validate(&session.session_id, 1_000).is_err());
    }

    #[test]
    fn test_wrong_password_code() {
        let auth = AdminAuth::new("s3cret", 30).unwrap();
        let err = auth.login("nope", 0).unwrap_err();
        assert_eq!(err.code, shared::error::ErrorCode::InvalidCredentials);
    }
}
