pub mod credential;
pub mod migrate;
pub mod services;
