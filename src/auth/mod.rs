//! OAuth2 sessions, grant flows and token storage.

pub mod error;
pub mod flow;
pub mod session;
pub mod store;
pub mod token;

pub use error::AuthError;
pub use flow::{AuthorizationRequest, GrantFlow, InteractiveGrant, TokenStatus};
pub use session::AuthSession;
pub use store::{FileTokenStore, InlineToken, TokenStore, TokenStoreConfig};
pub use token::Token;
