use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use wayfare_core::booking::{Booking, Passenger};
use wayfare_core::conversation::{Conversation, NewMessage, StoredMessage};
use wayfare_core::repository::{BookingRepository, ConversationRepository, RepoError};

/// Message log held in process memory. Backs anonymous/dev sessions and
/// the test suites; the Postgres repository is the production path.
#[derive(Default)]
pub struct InMemoryConversationRepository {
    conversations: Mutex<HashMap<Uuid, Conversation>>,
    messages: Mutex<Vec<StoredMessage>>,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(_: impl std::fmt::Debug) -> RepoError {
    "repository lock poisoned".into()
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn create_conversation(
        &self,
        user_id: Option<&str>,
        title: &str,
    ) -> Result<Conversation, RepoError> {
        let conversation = Conversation {
            id: Uuid::new_v4(),
            user_id: user_id.map(|s| s.to_string()),
            title: title.to_string(),
            created_at: Utc::now(),
        };
        self.conversations
            .lock()
            .map_err(poisoned)?
            .insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn get_conversation(&self, id: Uuid) -> Result<Option<Conversation>, RepoError> {
        Ok(self.conversations.lock().map_err(poisoned)?.get(&id).cloned())
    }

    async fn append_message(&self, message: &NewMessage) -> Result<StoredMessage, RepoError> {
        let stored = StoredMessage {
            id: Uuid::new_v4(),
            conversation_id: message.conversation_id,
            role: message.role,
            content: message.content.clone(),
            metadata: message.metadata.clone(),
            created_at: Utc::now(),
        };
        self.messages.lock().map_err(poisoned)?.push(stored.clone());
        Ok(stored)
    }

    async fn list_messages(
        &self,
        conversation_id: Uuid,
    ) -> Result<Vec<StoredMessage>, RepoError> {
        // Insertion order doubles as creation order here.
        Ok(self
            .messages
            .lock()
            .map_err(poisoned)?
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect())
    }
}

/// Booking store held in process memory, with a failure trigger so the
/// compensating-delete path can be exercised.
#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: Mutex<HashMap<Uuid, Booking>>,
    passengers: Mutex<Vec<Passenger>>,
    fail_passenger_insert_at: Mutex<Option<usize>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the nth passenger insert (1-based) fail.
    pub fn fail_passenger_insert_at(&self, n: usize) {
        if let Ok(mut slot) = self.fail_passenger_insert_at.lock() {
            *slot = Some(n);
        }
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn passenger_count_for(&self, booking_id: Uuid) -> usize {
        self.passengers
            .lock()
            .map(|p| p.iter().filter(|x| x.booking_id == booking_id).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn insert_booking(&self, booking: &Booking) -> Result<(), RepoError> {
        self.bookings
            .lock()
            .map_err(poisoned)?
            .insert(booking.id, booking.clone());
        Ok(())
    }

    async fn insert_passenger(&self, passenger: &Passenger) -> Result<(), RepoError> {
        let mut passengers = self.passengers.lock().map_err(poisoned)?;
        if let Some(n) = *self.fail_passenger_insert_at.lock().map_err(poisoned)? {
            if passengers.len() + 1 == n {
                return Err("simulated passenger insert failure".into());
            }
        }
        passengers.push(passenger.clone());
        Ok(())
    }

    async fn delete_booking(&self, booking_id: Uuid) -> Result<(), RepoError> {
        self.bookings.lock().map_err(poisoned)?.remove(&booking_id);
        self.passengers
            .lock()
            .map_err(poisoned)?
            .retain(|p| p.booking_id != booking_id);
        Ok(())
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, RepoError> {
        Ok(self.bookings.lock().map_err(poisoned)?.get(&booking_id).cloned())
    }
}
