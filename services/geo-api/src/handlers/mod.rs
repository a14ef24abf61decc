//! HTTP request handlers for the geo API.

pub mod filetype;
pub mod health;
pub mod raster;
pub mod upload;
pub mod workspace;
