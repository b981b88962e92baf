#![deny(unsafe_code)]

/// Desktop client for the PaperBot chat backend, built with GPUI and gpui-component.
pub mod app;
/// Chat store, typewriter engine, send/upload flow and chat views.
pub mod chat;
/// Settings persistence.
pub mod settings;
