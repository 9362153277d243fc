// Backends the views talk to: an in-memory mock store, its REST router and
// an HTTP client for a remote server.

pub mod command;
pub mod mock_store;
pub mod remote;
pub mod router;
pub mod routes;

pub use command::Command;
pub use mock_store::{demo_user, MockStore};
pub use remote::RemoteBackend;
pub use router::create_api_router;
pub use routes::Route;
