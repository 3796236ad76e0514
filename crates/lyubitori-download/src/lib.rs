#![doc = include_str!("../README.md")]

pub mod codec;
pub mod engine;
pub mod extractor;
pub mod registry;
pub mod service;

pub use codec::{CodecError, ImageCodec, PersistOutcome, existing_file};
pub use engine::{EngineConfig, RunOutcome, RunSummary, ScrollDownloadEngine};
pub use extractor::extract_round;
pub use registry::{RegistryError, TaskRegistry};
pub use service::{
    DEFAULT_MAX_SCROLL, DEFAULT_REFRESH_SCROLL, DownloadRequest, DownloadService, TaskLauncher,
};
