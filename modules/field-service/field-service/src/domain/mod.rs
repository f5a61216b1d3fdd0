pub mod error;
pub mod lifecycle;
pub mod ports;
pub mod repo;
pub mod scope;
pub mod sequence;
pub mod service;

#[cfg(test)]
mod service_test;
