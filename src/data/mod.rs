mod channel_stream;

pub use channel_stream::WsConnector;
