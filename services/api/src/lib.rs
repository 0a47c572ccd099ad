//! Video API service
//!
//! Issues pre-signed object-store URLs for uploading and viewing videos and
//! keeps one metadata row per video. Clients upload and download directly
//! against the store; this service only decides who may do so.

pub mod access;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod storage;

#[cfg(test)]
mod testing;
