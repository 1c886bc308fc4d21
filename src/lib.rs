// Library interface for manga_bridge
// The binary and the integration tests both drive the pipeline through these modules

pub mod advance;
pub mod bridge;
pub mod browser;
pub mod config;
pub mod discovery;
pub mod document;
pub mod encode;
pub mod error;
pub mod helpers;
pub mod http_client;
pub mod integrity;
pub mod logging;
pub mod models;
pub mod readiness;
pub mod scroll;
pub mod session;
pub mod status;
pub mod transfer;
