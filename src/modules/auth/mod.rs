pub mod authentication;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod service;
