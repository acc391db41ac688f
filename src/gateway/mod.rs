//! Gateway server implementation

mod acceptor;
pub mod authz;
mod server;
pub mod upstream;

pub use acceptor::PeerCertAcceptor;
pub use authz::{DENY_BODY, PeerCertificate, authz_middleware, build, forbidden_response};
pub use server::Server;
pub use upstream::Upstream;
