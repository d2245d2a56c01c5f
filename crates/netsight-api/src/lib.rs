// netsight-api: async REST and WebSocket clients for the network dashboard backend

pub mod error;
pub mod models;
pub mod pubsub;
pub mod rest;
pub mod transport;
pub mod websocket;

pub use error::Error;
pub use rest::{CredentialStore, EndpointTable, RestClient, RestConfig, RetryPolicy};
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{ConnectionPhase, ConnectionStatus, ReconnectConfig, WebSocketClient};
