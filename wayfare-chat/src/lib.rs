pub mod booking_manager;
pub mod dispatcher;
pub mod error;
pub mod orchestrator;
pub mod prompts;
pub mod reconstruct;

pub use booking_manager::{BookingError, BookingTransactionManager};
pub use dispatcher::{BookingArgs, DispatchOutcome, FunctionDispatcher, FunctionIntent, SearchArgs};
pub use error::{categorize_failure, ErrorReport};
pub use orchestrator::{ChatTurnRequest, ChatTurnResponse, Orchestrator};
