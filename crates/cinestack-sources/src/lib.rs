pub mod backend;
pub mod error;
pub mod session;
pub mod traits;

#[cfg(test)]
mod test_server;

pub use backend::CineStackClient;
pub use error::{classify_status, ApiError};
pub use session::{SessionClient, SessionContext};
pub use traits::{CatalogProvider, MovieStore, PlaylistBackend};
