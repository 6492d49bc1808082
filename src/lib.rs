pub mod config;
pub mod controller;
pub mod delta;
pub mod error;
pub mod feed;
pub mod history;
pub mod input;
pub mod mapper;
pub mod model;
pub mod ports;
pub mod retry;
pub mod servo;
pub mod ui;
