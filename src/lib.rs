pub mod account;
pub mod cli;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod node;
pub mod rpc;
pub mod service;
pub mod session;
pub mod sign;
