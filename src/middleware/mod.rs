pub mod csrf;
pub mod response;

pub use csrf::{csrf_middleware, CurrentSession};
pub use response::ApiResponse;
