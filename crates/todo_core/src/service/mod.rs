//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store mutations and snapshot persistence into use-case APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod todo_service;
