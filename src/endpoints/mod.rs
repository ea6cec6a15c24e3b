pub mod echo;
pub mod health;

pub use echo::format_message;
pub use health::{api_info, health_check};
