pub mod dataset;
pub mod ticket;

pub use dataset::Dataset;
pub use ticket::TicketLineItem;
