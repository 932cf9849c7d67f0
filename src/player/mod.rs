pub mod events;
pub mod intent;
pub mod manager;
pub mod registry;
pub mod state;

pub use events::*;
pub use intent::*;
pub use manager::SessionManager;
pub use registry::SessionRegistry;
pub use state::*;
