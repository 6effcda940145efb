//! HTTP API: routing, request/response mapping, and the cloud-function adapter.

pub mod app;
pub mod function;
