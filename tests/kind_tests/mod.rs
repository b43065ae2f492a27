//! Integration tests for the LWS operator
//!
//! These tests tell the story of a platform operator turning autoscaling on
//! and off for a LeaderWorkerSet and watching the HPA follow.
//!
//! - `hpa_reconcile`: Stories about the HPA created, updated and left alone
//!   by the convergence engine against a real API server

mod helpers;
mod hpa_reconcile;
