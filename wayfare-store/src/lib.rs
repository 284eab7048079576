pub mod app_config;
pub mod booking_repo;
pub mod conversation_repo;
pub mod database;
pub mod memory;

pub use booking_repo::PostgresBookingRepository;
pub use conversation_repo::PostgresConversationRepository;
pub use database::Db;
pub use memory::{InMemoryBookingRepository, InMemoryConversationRepository};
