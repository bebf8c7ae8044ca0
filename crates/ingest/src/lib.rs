pub mod client;
pub mod events;

pub use client::{channel, spawn_line_reader, spawn_stdin_listener, ProducerSocket};
pub use events::{parse_line, ProducerEvent};
