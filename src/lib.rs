// Constraint validation shared by properties and action parameters
pub mod validation;

// Property store and accessor binding
pub mod property;

// Action registry, lifecycle engine and execution queue
pub mod action;

// Notification fan-out to subscribers
pub mod notify;

// Thing aggregate and builder
pub mod thing;

// Single/multi Thing registry
pub mod registry;

// Boundary operations
pub mod service;

// Configuration
pub mod config;

// HTTP and WebSocket APIs
pub mod api;

// WebSocket subscription management
pub mod subscription;
