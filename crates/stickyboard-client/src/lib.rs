//! HTTP implementation of the StickyBoard backend contract.
//!
//! Thin JSON-over-HTTP glue: every [`BackendApi`] call becomes one
//! request against the REST backend, authenticated with a bearer token
//! from a [`TokenProvider`]. When the session is missing or rejected the
//! provider's login hook fires and the call fails with
//! [`ApiError::Unauthorized`]; the optimistic store logs and moves on.

use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::rc::Rc;
use stickyboard_core::api::{ApiError, ApiResult, BackendApi, BoxFuture};
use stickyboard_core::model::{Note, NoteId, NotePatch, User, WorkspaceId, WorkspaceRecord};

/// Supplies the bearer token and owns the external login flow.
pub trait TokenProvider {
    /// The current session token, if one exists.
    fn token(&self) -> Option<String>;

    /// Called when a request finds no usable session. Typically
    /// navigates to the identity provider.
    fn begin_login(&self);
}

/// `BackendApi` over HTTP.
pub struct HttpBackend {
    base_url: String,
    client: Client,
    tokens: Rc<dyn TokenProvider>,
}

impl HttpBackend {
    /// `base_url` with or without a trailing slash, e.g.
    /// `https://boards.example.com`.
    pub fn new(base_url: impl Into<String>, tokens: Rc<dyn TokenProvider>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
            tokens,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn bearer(&self) -> ApiResult<String> {
        match self.tokens.token() {
            Some(token) => Ok(token),
            None => {
                log::warn!("No session token; starting login");
                self.tokens.begin_login();
                Err(ApiError::Unauthorized)
            }
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> ApiResult<Response> {
        let token = self.bearer()?;
        let mut request = self
            .client
            .request(method, self.endpoint(path))
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            log::warn!("Session rejected by backend; starting login");
            self.tokens.begin_login();
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> ApiResult<T> {
        let response = self.send(method, path, body).await?;
        response
            .json()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn request_unit(
        &self,
        method: Method,
        path: &str,
        body: Option<&(impl Serialize + ?Sized)>,
    ) -> ApiResult<()> {
        self.send(method, path, body).await?;
        Ok(())
    }
}

impl BackendApi for HttpBackend {
    /// Session probe. Unlike every other call, a missing or rejected
    /// token here is an answer (no user), not a failure, and does not
    /// trigger the login flow.
    fn fetch_current_user(&self) -> BoxFuture<'_, ApiResult<Option<User>>> {
        Box::pin(async move {
            let Some(token) = self.tokens.token() else {
                return Ok(None);
            };
            let response = self
                .client
                .get(self.endpoint("me"))
                .bearer_auth(token)
                .send()
                .await
                .map_err(|err| ApiError::Network(err.to_string()))?;

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED {
                return Ok(None);
            }
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(ApiError::Server {
                    status: status.as_u16(),
                    message,
                });
            }
            response
                .json()
                .await
                .map(Some)
                .map_err(|err| ApiError::Decode(err.to_string()))
        })
    }

    fn list_workspaces(&self) -> BoxFuture<'_, ApiResult<Vec<WorkspaceRecord>>> {
        Box::pin(self.request(Method::GET, "workspaces", None::<&()>))
    }

    fn create_workspace(&self, name: &str) -> BoxFuture<'_, ApiResult<WorkspaceRecord>> {
        let body = json!({ "name": name });
        Box::pin(async move { self.request(Method::POST, "workspaces", Some(&body)).await })
    }

    fn rename_workspace(&self, id: WorkspaceId, name: &str) -> BoxFuture<'_, ApiResult<()>> {
        let body = json!({ "name": name });
        Box::pin(async move {
            self.request_unit(Method::PATCH, &format!("workspaces/{id}"), Some(&body))
                .await
        })
    }

    fn delete_workspace(&self, id: WorkspaceId) -> BoxFuture<'_, ApiResult<()>> {
        Box::pin(async move {
            self.request_unit(Method::DELETE, &format!("workspaces/{id}"), None::<&()>)
                .await
        })
    }

    fn list_notes(&self, workspace: WorkspaceId) -> BoxFuture<'_, ApiResult<Vec<Note>>> {
        Box::pin(async move {
            self.request(
                Method::GET,
                &format!("workspaces/{workspace}/notes"),
                None::<&()>,
            )
            .await
        })
    }

    fn create_note(&self, workspace: WorkspaceId, note: &Note) -> BoxFuture<'_, ApiResult<Note>> {
        let note = note.clone();
        Box::pin(async move {
            self.request(
                Method::POST,
                &format!("workspaces/{workspace}/notes"),
                Some(&note),
            )
            .await
        })
    }

    fn update_note(
        &self,
        workspace: WorkspaceId,
        id: NoteId,
        patch: &NotePatch,
    ) -> BoxFuture<'_, ApiResult<()>> {
        let patch = patch.clone();
        Box::pin(async move {
            self.request_unit(
                Method::PATCH,
                &format!("workspaces/{workspace}/notes/{id}"),
                Some(&patch),
            )
            .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct StubTokens {
        token: Option<String>,
        login_calls: Cell<u32>,
    }

    impl TokenProvider for StubTokens {
        fn token(&self) -> Option<String> {
            self.token.clone()
        }

        fn begin_login(&self) {
            self.login_calls.set(self.login_calls.get() + 1);
        }
    }

    fn backend(token: Option<&str>) -> (Rc<StubTokens>, HttpBackend) {
        let tokens = Rc::new(StubTokens {
            token: token.map(str::to_string),
            login_calls: Cell::new(0),
        });
        let backend = HttpBackend::new("https://boards.example.com/", tokens.clone());
        (tokens, backend)
    }

    #[test]
    fn test_endpoint_normalizes_slashes() {
        let (_, backend) = backend(Some("t"));
        assert_eq!(
            backend.endpoint("/workspaces/3/notes"),
            "https://boards.example.com/api/workspaces/3/notes"
        );
        assert_eq!(backend.endpoint("me"), "https://boards.example.com/api/me");
    }

    #[test]
    fn test_missing_token_starts_login() {
        let (tokens, backend) = backend(None);

        let result = pollster::block_on(backend.list_workspaces());

        assert!(matches!(result, Err(ApiError::Unauthorized)));
        assert_eq!(tokens.login_calls.get(), 1);
    }

    #[test]
    fn test_user_probe_without_token_is_logged_out() {
        let (tokens, backend) = backend(None);

        let result = pollster::block_on(backend.fetch_current_user());

        assert!(matches!(result, Ok(None)));
        assert_eq!(tokens.login_calls.get(), 0);
    }
}
