pub mod middleware;
pub mod server;
pub mod upload;

pub use middleware::AuthConfig;
pub use server::{GatewayOptions, GatewayServer};
