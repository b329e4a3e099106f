//! 请求提取器
//!
//! 把 axum 的 JSON / Query / Path 拒绝与 validator 错误统一转换为
//! [`AppError`] (`ValidationFailed`, 400, 带字段信息)。

use axum::Json;
use axum::extract::path::ErrorKind;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use shared::error::AppError;
use validator::{Validate, ValidationErrors};

/// JSON body，解析失败返回 400 (而不是 axum 默认的 422 纯文本)
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        Ok(Self(value))
    }
}

/// JSON body + `Validate` 校验
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let AppJson(value) = AppJson::<T>::from_request(req, state).await?;
        value.validate().map_err(validation_error)?;
        Ok(Self(value))
    }
}

/// Query string，解析失败返回 JSON 错误 (而不是 axum 默认的纯文本)
pub struct AppQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(query_rejection)?;
        Ok(Self(value))
    }
}

/// 路径参数，解析失败返回 JSON 错误
pub struct AppPath<T>(pub T);

impl<T, S> FromRequestParts<S> for AppPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(path_rejection)?;
        Ok(Self(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    AppError::validation(rejection.body_text())
}

fn query_rejection(rejection: QueryRejection) -> AppError {
    let message = rejection.body_text();
    let field = rejected_field(&message).unwrap_or("query").to_string();
    AppError::invalid_field(&field, message)
}

fn path_rejection(rejection: PathRejection) -> AppError {
    let field = match &rejection {
        PathRejection::FailedToDeserializePathParams(e) => match e.kind() {
            ErrorKind::ParseErrorAtKey { key, .. } => key.clone(),
            _ => "path".to_string(),
        },
        _ => "path".to_string(),
    };
    AppError::invalid_field(&field, rejection.body_text())
}

/// 从 "Failed to deserialize query string: status: unknown variant ..." 中取出字段名
fn rejected_field(body: &str) -> Option<&str> {
    let (_, rest) = body.split_once(": ")?;
    let (field, _) = rest.split_once(": ")?;
    let is_ident = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    is_ident.then_some(field)
}

/// 取字典序第一个出错字段，保证错误信息稳定
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let field_errors = errors.field_errors();
    let mut fields: Vec<(String, String)> = field_errors
        .iter()
        .map(|(field, errs)| {
            let field = field.to_string();
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{} is invalid", field));
            (field, message)
        })
        .collect();
    fields.sort();
    match fields.into_iter().next() {
        Some((field, message)) => AppError::invalid_field(&field, message),
        None => AppError::validation("Validation failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_field() {
        assert_eq!(
            rejected_field("Failed to deserialize query string: status: unknown variant `bogus`"),
            Some("status")
        );
        assert_eq!(
            rejected_field("Failed to deserialize query string: invalid type: string"),
            None
        );
        assert_eq!(rejected_field("no separator here"), None);
    }
}
