mod acl;
mod jwt;

pub use acl::{AclMiddlewareFactory, AclMiddlewareService};
pub use jwt::{bearer_token, JwtMiddlewareFactory, JwtMiddlewareService};
