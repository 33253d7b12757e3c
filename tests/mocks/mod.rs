#![allow(dead_code)]

pub mod mock_framework;

pub use mock_framework::*;
