pub mod api;
pub mod config;
pub mod database_ops;
pub mod logging;
pub mod normalization;
pub mod refresh;

pub mod util {
    pub mod env;
}
