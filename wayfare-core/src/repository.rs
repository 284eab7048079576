use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::{Booking, Passenger};
use crate::conversation::{Conversation, NewMessage, StoredMessage};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;

/// Repository trait for the conversation/message log. The log is
/// append-only; historical messages are never updated or deleted.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn create_conversation(
        &self,
        user_id: Option<&str>,
        title: &str,
    ) -> Result<Conversation, RepoError>;

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>, RepoError>;

    async fn append_message(&self, message: &NewMessage) -> Result<StoredMessage, RepoError>;

    /// All messages of a conversation, ordered by creation time.
    async fn list_messages(&self, conversation_id: Uuid) -> Result<Vec<StoredMessage>, RepoError>;
}

/// Repository trait for booking and passenger rows. The compensating
/// delete is how the manager approximates atomicity, so removal must
/// take partially inserted passengers with it.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_booking(&self, booking: &Booking) -> Result<(), RepoError>;

    async fn insert_passenger(&self, passenger: &Passenger) -> Result<(), RepoError>;

    /// Compensating action: remove the booking and any passengers
    /// already attached to it.
    async fn delete_booking(&self, booking_id: Uuid) -> Result<(), RepoError>;

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, RepoError>;
}
