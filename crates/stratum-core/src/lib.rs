//! Terminal rendering core: planes, compositing and differential output.
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_possible_wrap)] // "casting may wrap around"
#![allow(clippy::unreadable_literal)] // "long literal lacking separators"
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::type_complexity)]
#![allow(clippy::doc_markdown)] // "item in documentation missing backticks"
//!
//! A [`Pile`] owns a tree of [`Plane`]s rooted at the screen-sized standard
//! plane. Planes are written with grapheme-aware text, boxes, lines and
//! bitmaps ([`blit`]). A [`Renderer`] composites the pile bottom to top in
//! z-order, diffs the result against what the terminal shows and hands the
//! minimal list of [`RenderOp`]s to an [`OpSink`].
//!
//! Nothing here touches a real terminal; `stratum-terminal` provides the
//! crossterm-backed sink, input reader and lifecycle.
//!
//! # Example
//!
//! ```
//! use stratum_core::{Channels, Dims, Pile, PlaneOptions, RenderOp, Renderer, Style};
//!
//! let mut pile = Pile::new(Dims::new(24, 80))?;
//! let hello = pile.create(pile.root(), PlaneOptions::new(2, 1, 10, 40))?;
//! {
//!     let plane = pile.plane_mut(hello)?;
//!     plane.set_styles(Style::BOLD);
//!     plane.set_channels(Channels::from_rgb(0x00ff00, 0x000000));
//!     plane.putstr_yx(Some(1), Some(1), "Hello World")?;
//! }
//!
//! let mut renderer = Renderer::new(pile.dims());
//! let mut ops: Vec<RenderOp> = Vec::new();
//! renderer.render(&pile, &mut ops)?;
//! assert_eq!(renderer.displayed().get(3, 2).map(|c| c.glyph()), Some("H"));
//! # Ok::<(), stratum_core::Error>(())
//! ```

pub mod blend;
pub mod blit;
pub mod caps;
pub mod cell;
pub mod channel;
pub mod error;
pub mod geometry;
pub mod input;
pub mod pile;
pub mod plane;
pub mod render;
pub mod style;

pub use blit::{blit, BlitOptions, BlitReport, Blitter, Scale, Sprixel, Visual};
pub use caps::Capabilities;
pub use cell::Cell;
pub use channel::{Alpha, Channel, Channels};
pub use error::{Error, Result};
pub use geometry::{Dims, Rect};
pub use input::{keys, EventKind, InputEvent, KeyModifiers, MiceEvents};
pub use pile::{Pile, PlaneId, PlaneOptions};
pub use plane::{BoxStyle, Margins, Plane, PlaneFlags, ResizeCallback};
pub use render::{FrameBuffer, OpSink, Placement, RenderOp, RenderStats, Renderer};
pub use style::Style;
