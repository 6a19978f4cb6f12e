//! Farmio Prospecting API Library
//!
//! This library provides the core functionality for the Farmio real-estate
//! prospecting API: property, lead, neighborhood and report storage, the
//! heuristic scoring engine and the pre-qualification chatbot.
//!
//! # Modules
//!
//! - `chatbot`: Intent classification and conversation context tracking.
//! - `config`: Configuration management.
//! - `db`: Database connection, pool management and schema bootstrap.
//! - `errors`: Error handling types.
//! - `handlers`: Shared application state, health check and router assembly.
//! - `models`: Core data models and request/response payloads.
//! - `reports`: Report content generators (market, prediction, profiles).
//! - `scoring`: Heuristic scoring engine for leads and neighborhoods.
//! - `property_handler` / `lead_handler` / `neighborhood_handler` /
//!   `report_handler` / `chatbot_handler`: HTTP request handlers per resource.

pub mod chatbot;
pub mod chatbot_handler;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod lead_handler;
pub mod models;
pub mod neighborhood_handler;
pub mod property_handler;
pub mod report_handler;
pub mod reports;
pub mod scoring;
