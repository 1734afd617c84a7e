pub mod cli;
pub mod config;
pub mod repository;
pub mod serializers;
pub mod transfer;
