// simmer-api: Async Rust client for the Fresco KitchenOS cooking cloud

pub mod auth;
pub mod client;
mod cooking;
mod devices;
pub mod error;
pub mod models;
pub mod sessions;
pub mod transport;

pub use auth::{Credentials, Session};
pub use client::{CloudClient, DEFAULT_API_BASE};
pub use error::Error;
pub use models::{
    Appliance, CookProgram, CookingSession, Device, KeepWarmUpdate, PressureCookUpdate,
    PressureLevel, ProgramState, VentingMode, WarmPreset, WarmTemp, DEFAULT_MODEL_ID,
};
pub use sessions::StatusPoller;
pub use transport::TransportConfig;
