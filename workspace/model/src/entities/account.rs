use sea_orm::entity::prelude::*;

/// Represents a registered dashboard account.
/// The password is stored only as a salted argon2id hash in PHC string
/// form; plaintext never reaches the database.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    /// Human-readable name shown in the dashboard greeting.
    pub display_name: String,
    pub password_hash: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
