pub mod base;
pub mod bot;
pub mod logging;
pub mod player;

pub use base::*;
pub use bot::*;
pub use logging::*;
pub use player::*;
