pub mod booking;
pub mod conversation;
pub mod envelope;
pub mod event;
pub mod intent;
pub mod schedule;
pub mod slot;

pub use booking::{Booking, BookingConfirmation, BookingRecord, BookingStatus};
pub use conversation::{Conversation, ConversationState, PendingBooking};
pub use envelope::Envelope;
pub use event::{BookingEvent, BookingEventKind};
pub use intent::{CancelIntent, ParsedTurn};
pub use schedule::Schedule;
pub use slot::{display_date, display_time, Slot, TimeBucket, TimeSpec};
