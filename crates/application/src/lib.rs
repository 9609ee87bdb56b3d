//! DNS Warden application layer: ports for external collaborators and
//! use-cases for the admin surface.
pub mod ports;
pub mod use_cases;
