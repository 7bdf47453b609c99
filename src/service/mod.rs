//! Service layer: relay protocol orchestration.
//!
//! [`RelayService`] coordinates roster broadcasts and message routing
//! over the shared [`super::domain::ClientRegistry`].

pub mod relay_service;

pub use relay_service::RelayService;
