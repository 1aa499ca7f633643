//! CLI command implementations.

pub mod generate;
pub mod init;
pub mod routes;

pub use generate::generate_pages;
pub use init::init_project;
pub use routes::list_routes;
