//! Responses the proxy produces itself.
//!
//! # Responsibilities
//! - Answer CORS preflight (`OPTIONS`) without touching the verifier
//! - Build the payment challenge for rejected requests
//!
//! # Design Decisions
//! - Templates are compiled once at startup; a bad template is a startup error
//! - Both kinds of response carry `Connection: close` so the session ends after them
//! - CORS headers are only added here, relayed upstream responses are untouched

use bytes::Bytes;
use http_body_util::{BodyExt, Empty, Full};
use hyper::header::{
    HeaderMap, HeaderValue, InvalidHeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONNECTION, CONTENT_TYPE, WWW_AUTHENTICATE,
};
use hyper::{Method, Response, StatusCode};
use thiserror::Error;

use crate::http::template::{Bindings, Escape, Template, TemplateError};
use crate::http::ProxyBody;
use crate::payments::{FailureReason, Policy};

const CHALLENGE_HEADER: &str = r#"${auth_scheme} realm="xmr402 proxy",currency="XMR",address="${address}",min_amount="${min_amount}",min_confirmations="${min_confirmations}",max_confirmations="${max_confirmations}""#;

const CHALLENGE_HEADER_WITH_ERROR: &str = r#"${auth_scheme} realm="xmr402 proxy",currency="XMR",address="${address}",min_amount="${min_amount}",min_confirmations="${min_confirmations}",max_confirmations="${max_confirmations}",error="invalid_token",error_description="${error_description}""#;

const CHALLENGE_BODY: &str = r#"{"realm":"xmr402 proxy","currency":"XMR","address":"${address}","min_amount":"${min_amount}","min_confirmations":"${min_confirmations}","max_confirmations":"${max_confirmations}"}"#;

const CHALLENGE_BODY_WITH_ERROR: &str = r#"{"realm":"xmr402 proxy","currency":"XMR","address":"${address}","min_amount":"${min_amount}","min_confirmations":"${min_confirmations}","max_confirmations":"${max_confirmations}","error":"invalid_token","error_description":"${error_description}"}"#;

const ALLOW_METHODS: &str = "*";
const ALLOW_HEADERS: &str = "Authorization";

/// Failure to build a proxy-generated response.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("challenge template: {0}")]
    Template(#[from] TemplateError),

    #[error("challenge header is not a valid header value: {0}")]
    HeaderValue(#[from] InvalidHeaderValue),

    #[error("response build failed: {0}")]
    Build(#[from] hyper::http::Error),
}

/// Build a fixed body.
pub fn full(bytes: impl Into<Bytes>) -> ProxyBody {
    Full::new(bytes.into()).map_err(|never| match never {}).boxed_unsync()
}

/// Build an empty body.
pub fn empty() -> ProxyBody {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed_unsync()
}

/// Whether the request is a CORS preflight.
pub fn is_preflight(method: &Method) -> bool {
    method == Method::OPTIONS
}

/// Add the permissive CORS headers.
pub fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
}

/// Builds preflight and challenge responses for one payment address.
#[derive(Debug, Clone)]
pub struct ChallengeResponder {
    address: String,
    header: Template,
    header_with_error: Template,
    body: Template,
    body_with_error: Template,
}

impl ChallengeResponder {
    /// Compile the challenge templates for `address`.
    pub fn new(address: impl Into<String>) -> Result<Self, TemplateError> {
        Ok(Self {
            address: address.into(),
            header: Template::compile(CHALLENGE_HEADER, Escape::QuotedString)?,
            header_with_error: Template::compile(CHALLENGE_HEADER_WITH_ERROR, Escape::QuotedString)?,
            body: Template::compile(CHALLENGE_BODY, Escape::Json)?,
            body_with_error: Template::compile(CHALLENGE_BODY_WITH_ERROR, Escape::Json)?,
        })
    }

    /// `200 OK` with CORS headers and no body.
    pub fn preflight(&self) -> Result<Response<ProxyBody>, ResponseError> {
        let mut response = Response::builder()
            .status(StatusCode::OK)
            .header(CONNECTION, "close")
            .body(empty())?;
        apply_cors(response.headers_mut());
        Ok(response)
    }

    /// Challenge for a rejected request.
    ///
    /// `reason` is `None` when no credential was presented; the error
    /// parameters are then left out of both header and body.
    pub fn challenge(
        &self,
        policy: &Policy,
        reason: Option<&FailureReason>,
    ) -> Result<Response<ProxyBody>, ResponseError> {
        let description = reason.map(|r| r.to_string());
        let bindings = Bindings {
            auth_scheme: policy.scheme().as_str(),
            address: &self.address,
            min_amount: policy.min_amount_text(),
            min_confirmations: policy.min_confirmations(),
            max_confirmations: policy.max_confirmations(),
            error_description: description.as_deref(),
        };

        let (header, body) = match reason {
            Some(_) => (&self.header_with_error, &self.body_with_error),
            None => (&self.header, &self.body),
        };
        let header = HeaderValue::from_str(&header.render(&bindings)?)?;
        let body = body.render(&bindings)?;

        let mut response = Response::builder()
            .status(policy.scheme().challenge_status())
            .header(WWW_AUTHENTICATE, header)
            .header(CONTENT_TYPE, "application/json")
            .header(CONNECTION, "close")
            .body(full(body))?;
        apply_cors(response.headers_mut());
        Ok(response)
    }
}
