pub mod auth;
pub mod geostory;
pub mod user;

mod router;
pub use router::get_router;
