pub mod bar;
pub mod forecast;
pub mod sentiment;
pub mod ticker;

pub use bar::*;
pub use forecast::*;
pub use sentiment::*;
pub use ticker::*;
