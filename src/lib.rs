//! MediScan verification client
//!
//! This library provides the client-side workflow for verifying a medicine
//! package: collecting photos, submitting them to the MediScan verification
//! service in one request, simulating progress while the request is in
//! flight, and turning the returned verdict into a display-ready assessment.

pub mod config;
pub mod models;
pub mod services;
pub mod workflow;
