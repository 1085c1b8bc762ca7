// src/lib.rs

//! Guardian content streamer library

pub mod error;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod stream;
pub mod utils;
pub mod validation;
