pub mod admin;
pub mod config;
pub mod entities;
pub mod error;
pub mod middleware;
pub mod repository;
pub mod routes;

#[cfg(test)]
mod test_utils;
