pub mod handler;
mod service;
mod types;
