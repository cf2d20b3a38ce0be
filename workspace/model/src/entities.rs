//! This file serves as the root for all SeaORM entity modules.
//! The credential store is the only durable table: one row per registered
//! dashboard account. Uploaded datasets live as per-user files, not here.

pub mod account;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::account::Entity as Account;
}
