//! Command handlers, one module per command group

pub mod config;
pub mod convert;
pub mod post;
pub mod status;
pub mod tag;
pub mod upload;
