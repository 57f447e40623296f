pub mod actions;
pub mod audio;
pub mod catalogue;
pub mod config;
pub mod environment;
pub mod errors;
pub mod event;
pub mod identity;
pub mod io;
pub mod mime_type;
pub mod normalization;
pub mod persistence;
pub mod resume;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod timecode;
pub mod urls;
pub mod view;
