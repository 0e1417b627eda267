pub mod email;
pub mod health;
pub mod upload;

pub use email::{method_not_allowed, send_email};
pub use health::{health_check, metrics_endpoint, readiness_check};
pub use upload::upload_pdf;
