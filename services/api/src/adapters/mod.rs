pub mod db;
pub mod identity;
pub mod memory;

pub use db::DbAdapter;
pub use identity::PasswordIdentity;
pub use memory::InMemoryDb;
