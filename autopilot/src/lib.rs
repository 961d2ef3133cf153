// Remote API surface
pub mod client;

// Settings layers
pub mod config;

// Status polling
pub mod poller;

// File tree arena
pub mod tree;

// Page state
pub mod views;

// New-project form and submission
pub mod pipeline;
pub mod upload;

// Recently created projects
pub mod history;

// Background task lifecycle
pub mod task_registry;

// Command line
pub mod cli;
pub mod commands;

// Interactive terminal client
pub mod app;
pub mod ui;
