pub mod context;
pub mod sentiment;
pub mod volatility;

pub use context::*;
pub use sentiment::*;
pub use volatility::*;
