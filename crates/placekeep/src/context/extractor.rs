//! Axum extractor for RequestContext.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use uuid::Uuid;

use super::types::{RequestContext, RequestId};
use crate::state::AppState;

fn extract_request_id(headers: &HeaderMap) -> RequestId {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .map(RequestId::from_uuid)
        .unwrap_or_else(RequestId::new)
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let request_id = extract_request_id(&parts.headers);
        tracing::trace!(%request_id, "Opening unit of work for request");

        Ok(RequestContext {
            request_id,
            unit_of_work: state.unit_of_work(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn test_extract_request_id_from_header() {
        let mut headers = HeaderMap::new();
        let id = "550e8400-e29b-41d4-a716-446655440000";
        headers.insert("x-request-id", id.parse().unwrap());

        assert_eq!(extract_request_id(&headers).to_string(), id);
    }

    #[test]
    fn test_extract_request_id_generates_when_invalid() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "not-a-uuid".parse().unwrap());

        let request_id = extract_request_id(&headers);

        assert!(Uuid::parse_str(&request_id.to_string()).is_ok());
    }

    #[tokio::test]
    async fn test_each_request_gets_its_own_unit_of_work() {
        let state = AppState::in_memory();
        let (mut first, _) = Request::new(()).into_parts();
        let (mut second, _) = Request::new(()).into_parts();

        let a = RequestContext::from_request_parts(&mut first, &state).await.unwrap();
        let b = RequestContext::from_request_parts(&mut second, &state).await.unwrap();

        assert_ne!(a.request_id, b.request_id);
        assert!(!std::sync::Arc::ptr_eq(
            a.unit_of_work.context().unwrap(),
            b.unit_of_work.context().unwrap()
        ));
    }
}
