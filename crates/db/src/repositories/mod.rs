mod response_repository;

pub use response_repository::*;
