pub mod config;
pub mod session;
pub mod utils;

pub use config::*;
pub use session::*;
pub use utils::*;
