//! # Kiosk Architecture
//!
//! Kiosk is the storage core of a kiosk-mode internal portal: authors fill
//! content modules (org charts, training material, FAQ, process flows,
//! procedures, homepage boards), publish them once they are final, and move
//! whole installations between machines through backup files. The core is a
//! library with a CLI client on top; nothing below the CLI prints or
//! prompts.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (main.rs, args.rs)                               │
//! │  - Parses arguments, asks for confirmations, prints results │
//! │  - The ONLY place that knows about stdin/stdout/exit codes  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands                                │
//! │  - Resolves inputs (export destination)                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Turns domain results into CmdResult + messages           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Domain (workflow/, homepage, ui, admin, ledger, transfer/) │
//! │  - Publish locking, two-step confirmations, backup/restore  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage (storage.rs facade over store/)                    │
//! │  - FsBackend (native), WebBackend (quota-limited), Mem      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The publish ledger
//!
//! `yayinda` maps every module key to a published flag. It is the only
//! thing that decides whether a module is locked, and every write to it is
//! read back and compared before the caller is told it succeeded. See
//! [`ledger`].
//!
//! ## Testing Strategy
//!
//! Domain and command modules carry unit tests against
//! [`store::mem_backend::MemBackend`], which can fail or silently drop
//! writes on demand. `tests/` drives the real file system and web backends
//! and the `kiosk` binary through temporary directories.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`commands`]: One module per command family
//! - [`storage`]: Document/blob facade over the active backend
//! - [`store`]: Backend trait and implementations
//! - [`ledger`]: Verified reads and writes of the publish ledger
//! - [`workflow`]: Per-module publish/reset state machine
//! - [`homepage`]: News and values boards with inline publish flags
//! - [`transfer`]: Export and import archives
//! - [`ui`]: Transfer visibility (live mode)
//! - [`admin`]: Developer tools behind a secret
//! - [`catalog`]: Known documents and their defaults
//! - [`model`]: Module keys and record types
//! - [`blob`]: Blob encodings and naming
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod admin;
pub mod api;
pub mod blob;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod homepage;
pub mod ledger;
pub mod model;
pub mod storage;
pub mod store;
pub mod transfer;
pub mod ui;
pub mod workflow;
