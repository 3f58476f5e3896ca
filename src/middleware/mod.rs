pub mod csrf;
pub mod security_headers;

pub use csrf::csrf_validation_middleware;
pub use security_headers::add_security_headers;
