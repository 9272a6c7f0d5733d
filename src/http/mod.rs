pub mod client;
pub mod method;
pub mod request;
pub mod response;

pub use client::{ExecutionContext, execute};
pub use method::HttpMethod;
pub use request::RequestSpec;
pub use response::{ResponseBody, ResponseCapture};
