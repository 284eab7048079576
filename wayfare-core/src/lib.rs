pub mod booking;
pub mod cities;
pub mod conversation;
pub mod dates;
pub mod flight;
pub mod pii;
pub mod repository;
pub mod search;

pub use booking::{Booking, BookingConfirmation, BookingDraft, BookingStatus, Passenger, PassengerDetails};
pub use conversation::{Conversation, MessageRole, NewMessage, StoredMessage};
pub use flight::{CanonicalFlight, FlightSegment, Money};
pub use search::{CachedSearch, SearchContext};
