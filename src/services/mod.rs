pub mod calendar;
pub mod conversation;
pub mod notify;
pub mod parser;
pub mod scheduling;
