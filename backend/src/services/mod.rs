pub mod credentials;
pub mod error;
pub mod session;
pub mod token_store;

pub use credentials::CredentialStore;
pub use error::AuthError;
pub use session::SessionAuthenticator;
pub use token_store::TokenStore;
