pub mod account;
pub mod error;
pub mod password;
pub mod store;
pub mod user;

pub use account::{AccountPatch, AccountService, NewAccount};
pub use error::ServiceError;
pub use password::PasswordHasher;
pub use user::{NewUser, UserPatch, UserService};
