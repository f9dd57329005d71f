//! crossterm backend for the stratum plane compositor.
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
//!
//! [`Engine`] ties a [`stratum_core::Pile`] and [`stratum_core::Renderer`]
//! to a real terminal: it enters raw mode, detects [`Capabilities`],
//! writes frames through an [`AnsiSink`], decodes input on a background
//! thread and restores the terminal when dropped.
//!
//! # Example
//!
//! ```no_run
//! use stratum_terminal::{Engine, EngineConfig};
//! use stratum_core::PlaneOptions;
//!
//! let mut engine = Engine::new(EngineConfig::default())?;
//! let root = engine.root();
//! let plane = engine.pile_mut().create(root, PlaneOptions::new(1, 2, 3, 20))?;
//! engine.pile_mut().plane_mut(plane)?.putstr("Hello World")?;
//! engine.render()?;
//! engine.stop()?;
//! # Ok::<(), stratum_terminal::TermError>(())
//! ```

pub mod backend;
pub mod caps;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod sink;

pub use backend::{CrosstermBackend, TerminalBackend, TestableBackend};
pub use caps::TermEnv;
pub use color::ColorMode;
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Result, TermError};
pub use input::{convert, CrosstermSource, EventSource, InputLoop, ScriptedSource};
pub use sink::AnsiSink;
pub use stratum_core::Capabilities;
