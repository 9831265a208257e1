mod accept;
mod bootstrap;
mod session;

pub use accept::accept_invitation_handler;
pub use bootstrap::bootstrap_handler;
pub use session::{logout_handler, me_handler};

pub const SESSION_USER_KEY: &str = "user_identity";
