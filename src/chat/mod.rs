mod core;
mod models;
mod view;

pub use self::core::*;
pub use self::models::*;
pub use self::view::*;
