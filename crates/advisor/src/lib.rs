//! HTTP service exposing the rightsizing engine

pub mod api;
pub mod config;
