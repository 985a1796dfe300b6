//! weft-surface-core: synchronization engine for an embeddable rich-text
//! editing surface, without browser dependencies.
//!
//! This crate provides:
//! - `SurfaceDocument` trait abstracting the editable tree and native commands
//! - `MemoryDocument` - arena-backed implementation for tests and headless hosts
//! - `HostTransport` / `Scheduler` seams for outbound delivery and deferral
//! - `Surface` - the context that owns every component and handles events

pub mod appearance;
pub mod class_list;
pub mod codec;
pub mod commands;
pub mod config;
pub mod document;
pub mod error;
pub mod height;
pub mod host;
pub mod image;
pub mod insert;
pub mod memory;
pub mod observer;
pub mod paste;
pub mod range;
pub mod resize;
pub mod schedule;
pub mod scroll;
pub mod state;
pub mod surface;

pub use appearance::Appearance;
pub use commands::Command;
pub use config::SurfaceConfig;
pub use document::{
    MutationBatch, MutationRecord, NativeRange, Size, SurfaceDocument, ViewportMetrics,
};
pub use error::SurfaceError;
pub use height::HeightScheduler;
pub use host::{HeightChannel, HostTransport, RecordingHost, StateTransport};
pub use image::ImageGeometry;
pub use insert::{ImageInsert, VideoInsert};
pub use memory::{MemoryDocument, NodeId};
pub use paste::{ClipboardPayload, PasteReconciler, PasteState};
pub use range::{NodePath, RangeStore};
pub use schedule::{ManualScheduler, Scheduler, TimerToken};
pub use smol_str::SmolStr;
pub use state::{CommandState, EMPTY_DOCUMENT_HTML, EditorState};
pub use surface::{KeyInput, KeyOutcome, Surface};
