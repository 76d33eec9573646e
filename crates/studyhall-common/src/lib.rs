pub mod errors;
pub mod events;
pub mod id;

pub use errors::{ConfigError, LiveError, StoreError, StudyhallError};
pub use events::{Event, EventBus};
pub use id::{new_id, short_id};

pub type Result<T> = std::result::Result<T, StudyhallError>;
