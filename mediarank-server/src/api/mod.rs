//! HTTP API handlers for mediarank-server

pub mod auth;
pub mod families;
pub mod health;
pub mod profile;
pub mod rankings;
pub mod search;
pub mod stats;

pub use auth::AuthenticatedUser;
pub use families::family_routes;
pub use health::health_routes;
pub use profile::profile_routes;
pub use rankings::ranking_routes;
pub use search::search_routes;
pub use stats::stats_routes;
