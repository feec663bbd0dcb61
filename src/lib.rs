// Component model and view aggregate
pub mod component;
pub mod view;

// Component definitions and schema validation
pub mod registry;

// View persistence and update history
pub mod store;

// Client subscriptions and update fan-out
pub mod channel;

// Render adapters
pub mod render;

// Caller context
pub mod envelope;

// Mutation orchestration
pub mod manager;

// Configuration and runtime wiring
pub mod config;
pub mod runtime;

// HTTP and WebSocket APIs
pub mod api;
