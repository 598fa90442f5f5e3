pub mod endpoint;
pub mod filters;
pub mod permissions;
pub mod repository;
pub mod routes;
