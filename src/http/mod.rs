//! HTTP layer: sessions, challenge responses and the accept loop.

pub mod request;
pub mod response;
pub mod server;
pub mod session;
pub mod template;

use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;

/// Body type of every response the proxy writes to clients.
pub type ProxyBody = UnsyncBoxBody<Bytes, hyper::Error>;

pub use response::{ChallengeResponder, ResponseError};
pub use server::ProxyServer;
pub use session::{run_session, SessionContext, SessionError};
pub use template::{Template, TemplateError};
