pub mod api;
pub mod error;
pub mod server;
pub mod state;

pub use error::*;
pub use server::*;
pub use state::*;
