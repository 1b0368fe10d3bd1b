// Application layer - use cases and orchestration over the repository.
// Clients (the CLI, importers, exporters) go through LedgerService only.

pub mod error;
pub mod service;
pub mod view;

pub use error::*;
pub use service::*;
pub use view::*;
