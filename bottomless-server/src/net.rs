pub mod codec;
pub mod connection;
pub mod frame;
pub mod output;
pub mod protocol;
pub mod sink;

pub use connection::handle_connection;
