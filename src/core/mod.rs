pub mod config;
pub mod config_loader;
pub mod error;
pub mod statement;
pub mod traits;

pub use config::*;
pub use config_loader::*;
pub use error::*;
pub use statement::*;
pub use traits::*;
