//! Texup engine: conversion-service client and effect execution.
mod client;
mod engine;
mod persist;
mod sse;
mod types;

pub use client::{
    ClientSettings, ConversionApi, ReqwestClient, StreamSink, TextMode, FILE_FIELD,
};
pub use engine::EngineHandle;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use sse::SseDecoder;
pub use types::{ClientError, EngineEvent, FailureKind, Generation, ServerEvent, UploadFile};
