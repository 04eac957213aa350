//! Bearer token authentication.
//!
//! # Responsibilities
//! - Resolve `Authorization: Bearer <secret>` to a stored [`Token`]
//! - Attach the token to the request for handlers to authorize against
//!
//! # Design Decisions
//! - Only the SHA-256 of the secret is looked up; secrets never reach the store
//! - Authentication (401) happens in middleware, authorization (403) in each
//!   handler, because only the handler knows the project and the action

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use super::server::AppState;
use crate::error::{Error, Result};
use crate::model::{Action, Token};
use crate::store::Store;

const BEARER: &str = "Bearer ";

pub async fn require_token(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match authenticate(&state.store, request.headers()) {
        Ok(token) => {
            request.extensions_mut().insert(token);
            next.run(request).await
        }
        Err(e) => {
            debug!(path = %request.uri().path(), error = %e, "rejected request");
            e.into_response()
        }
    }
}

fn authenticate(store: &Store, headers: &HeaderMap) -> Result<Token> {
    let secret = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(Error::Unauthorized)?;
    store.find_token(secret)?.ok_or(Error::Unauthorized)
}

pub fn authorize(token: &Token, namespace: &str, project: &str, action: Action) -> Result<()> {
    if token.allows(namespace, project, action) {
        Ok(())
    } else {
        Err(Error::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_authenticate() {
        let store = Store::open_in_memory().unwrap();
        let (secret, token) = store.create_token("agent", false, vec![], 1).unwrap();

        let mut headers = HeaderMap::new();
        assert!(matches!(authenticate(&store, &headers), Err(Error::Unauthorized)));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer flt_unknown"));
        assert!(matches!(authenticate(&store, &headers), Err(Error::Unauthorized)));

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {secret}")).unwrap(),
        );
        assert_eq!(authenticate(&store, &headers).unwrap(), token);
    }

    #[test]
    fn test_authorize_forbidden() {
        let token = Token {
            id: "t".into(),
            name: "t".into(),
            hash: "h".into(),
            admin: false,
            permissions: vec![],
            created_at: 0,
        };
        assert!(matches!(
            authorize(&token, "ns", "proj", Action::Read),
            Err(Error::Forbidden)
        ));
    }
}
