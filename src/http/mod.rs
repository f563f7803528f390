//! HTTP API for the practice web app
//!
//! - `/me/*` - profile, notification settings, account deletion
//! - `/templates/*` - practice scenario catalogue
//! - `/practice/:template_id/start` - pay for and open a session
//! - `/sessions/:id/*` - voice call control, feedback, completion
//! - `/admin/*` - template management, users, statistics
//! - `/webhooks/identity` - user creation events
//! - `/health` - health check

mod error;
mod handlers;
mod identity;
mod routes;
mod state;

pub use error::ApiError;
pub use identity::{AdminUser, CurrentUser};
pub use routes::create_router;
pub use state::{AppState, CallSlot};
