//! The request pipeline shared by every authenticated endpoint:
//! method check → token → identity → authorization → backend call → response.

use std::future::Future;

use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::error::ApiError;
use crate::state::{AppState, AuthorizedIdentity};

/// How an endpoint treats methods it does not serve.
#[derive(Debug, Clone, Copy)]
pub enum MethodPolicy {
    /// Whatever the router lets through.
    Any,
    /// Anything else is answered with 405.
    Reject(&'static [Method]),
    /// Anything else is answered with an empty 200 and otherwise ignored.
    /// Browsers send CORS preflights to endpoints that cannot refuse them.
    Ignore(&'static [Method]),
}

#[derive(Debug, Clone, Copy)]
pub struct Endpoint {
    name: &'static str,
    methods: MethodPolicy,
}

enum Admission {
    Proceed,
    Skip,
}

impl Endpoint {
    pub const fn new(name: &'static str, methods: MethodPolicy) -> Self {
        Self { name, methods }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn admit(&self, method: &Method) -> Result<Admission, ApiError> {
        match self.methods {
            MethodPolicy::Any => Ok(Admission::Proceed),
            MethodPolicy::Reject(allowed) if allowed.contains(method) => Ok(Admission::Proceed),
            MethodPolicy::Reject(_) => Err(ApiError::method_not_allowed()),
            MethodPolicy::Ignore(allowed) if allowed.contains(method) => Ok(Admission::Proceed),
            MethodPolicy::Ignore(_) => Ok(Admission::Skip),
        }
    }

    /// Run `operation` for an authenticated caller.
    ///
    /// The operation receives its own handle on the state so that the future
    /// it returns does not borrow from the handler.
    pub async fn run<T, Op, Fut>(
        &self,
        state: &AppState,
        method: &Method,
        headers: &HeaderMap,
        operation: Op,
    ) -> Result<Response, ApiError>
    where
        T: IntoResponse,
        Op: FnOnce(AppState, AuthorizedIdentity) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if let Admission::Skip = self.admit(method)? {
            debug!(endpoint = self.name, %method, "ignoring request");
            return Ok(StatusCode::OK.into_response());
        }

        let identity = state.identify(headers).await?;
        debug!(endpoint = self.name, user_id = %identity.id(), "running operation");
        operation(state.clone(), identity)
            .await
            .map(IntoResponse::into_response)
    }

    /// Like [`Endpoint::run`], with a resource that must satisfy `authorize`
    /// before `operation` may touch it.
    ///
    /// `load` may surface backend errors as-is; `authorize` only ever runs once
    /// the caller is known.
    pub async fn run_authorized<R, T, Load, LoadFut, Authorize, Op, OpFut>(
        &self,
        state: &AppState,
        method: &Method,
        headers: &HeaderMap,
        load: Load,
        authorize: Authorize,
        operation: Op,
    ) -> Result<Response, ApiError>
    where
        T: IntoResponse,
        Load: FnOnce(AppState, AuthorizedIdentity) -> LoadFut,
        LoadFut: Future<Output = Result<R, ApiError>>,
        Authorize: FnOnce(&AuthorizedIdentity, &R) -> Result<(), ApiError>,
        Op: FnOnce(AppState, AuthorizedIdentity, R) -> OpFut,
        OpFut: Future<Output = Result<T, ApiError>>,
    {
        self.run(state, method, headers, |state, identity| async move {
            let resource = load(state.clone(), identity.clone()).await?;
            authorize(&identity, &resource)?;
            operation(state, identity, resource).await
        })
        .await
    }
}
