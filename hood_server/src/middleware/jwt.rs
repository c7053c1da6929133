//! Bearer token middleware.
//!
//! Wrap a scope with [`JwtMiddlewareFactory`] to require a valid access token on every route inside it. The token is
//! read from the `Authorization: Bearer <token>` header. A missing token is rejected with 401; a token that fails
//! validation (bad signature, expired, malformed) is rejected with 403. On success the [`JwtClaims`] are inserted into
//! the request extensions.
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::*;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    errors::{AuthError, ServerError},
};

pub struct JwtMiddlewareFactory {
    issuer: Rc<TokenIssuer>,
}

impl JwtMiddlewareFactory {
    pub fn new(issuer: TokenIssuer) -> Self {
        JwtMiddlewareFactory { issuer: Rc::new(issuer) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = JwtMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtMiddlewareService { issuer: Rc::clone(&self.issuer), service: Rc::new(service) }))
    }
}

pub struct JwtMiddlewareService<S> {
    issuer: Rc<TokenIssuer>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let issuer = Rc::clone(&self.issuer);
        Box::pin(async move {
            let Some(token) = bearer_token(req.headers()) else {
                debug!("🔐️ No access token on request for {}", req.path());
                return Err(ServerError::AuthenticationError(AuthError::MissingToken).into());
            };
            let claims: JwtClaims = issuer.validate_token(&token).map_err(ServerError::AuthenticationError)?;
            trace!("🔐️ Access token for user #{} accepted", claims.id);
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header. Any other scheme counts as no token.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}
