//! Application layer: the checkout workflow and the stages it is built from.
//!
//! `PaymentOrchestrator` sequences validation, customer registration, order
//! submission and outcome classification. Stages are plain functions over
//! explicit inputs; collaborators are reached only through the domain ports.

pub mod classifier;
pub mod order_builder;
pub mod orchestrator;
pub mod validator;
