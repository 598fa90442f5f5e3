pub mod database;
pub mod pagination;
pub mod password;
pub mod response;
pub mod token;
pub mod validation;
