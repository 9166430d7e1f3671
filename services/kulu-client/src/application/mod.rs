mod forms;
mod session_service;

pub use forms::*;
pub use session_service::*;
