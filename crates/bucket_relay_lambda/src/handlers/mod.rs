pub mod cleaner;
pub mod copier;
pub mod error;
pub mod logger;

pub use error::HandlerError;
