// REST client modules
//
// `client` owns request execution (auth, deadline, retry, batch). The
// remaining modules add typed endpoint methods to `RestClient`, one file
// per backend area.

pub mod client;
pub mod devices;
pub mod endpoints;
pub mod events;
pub mod metrics;
pub mod network;
pub mod security;
pub mod traffic;

pub use client::{
    BatchItem, BatchOutcome, CredentialStore, NoCredentials, RequestSpec, RestClient, RestConfig,
    RetryPolicy, StaticToken,
};
pub use endpoints::{EndpointTable, EndpointTemplate};
pub use events::EventQuery;
