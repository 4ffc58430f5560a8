pub mod evaluation;
pub mod request;
pub mod response;

pub use evaluation::*;
pub use request::*;
pub use response::*;
