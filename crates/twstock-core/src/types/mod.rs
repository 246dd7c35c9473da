//! 도메인 타입 정의.

pub mod price;
pub mod security;
pub mod window;

pub use price::*;
pub use security::*;
pub use window::*;
