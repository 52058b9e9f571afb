//! Root for the SeaORM entity modules.
//!
//! Two tables back the service: `user` for login and profile data and
//! `account` for named balances owned by a user.

pub mod account;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::account::Entity as Account;
    pub use super::user::Entity as User;
}
