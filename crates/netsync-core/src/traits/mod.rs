//! Core traits for the netsync subsystems
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`AddressSource`]: Discover the caller's public address
//! - [`NameserverPublisher`]: Push a zone's nameservers to a registrar
//! - [`HttpTransport`]: Issue one HTTP request and return the full response

pub mod address_source;
pub mod nameserver_publisher;
pub mod transport;

pub use address_source::AddressSource;
pub use nameserver_publisher::{
    NameserverPublisher, NameserverPublisherFactory, PublishOutcome, RegistrarCredentials,
};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
