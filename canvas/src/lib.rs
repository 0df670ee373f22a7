//! Canvas model and editing engine for the world-state editor.
//!
//! This crate owns everything that happens between a pointer event on the map
//! canvas and the occupancy grid that results from it: converting between
//! pixel and metric space, holding the drawable entities (background map,
//! robot marker, wall segments), interpreting pointer gestures according to
//! the active editing mode, and rasterizing the edited map. The host
//! application is responsible only for feeding events into the
//! [`engine::Engine`] and acting on the [`engine::Action`]s it returns.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Editing-mode state machine and returned actions |
//! | [`doc`] | In-memory canvas model: background, robot marker, walls |
//! | [`convert`] | Pixel/metric coordinate conversion |
//! | [`input`] | Editing modes, key bindings, and gesture state |
//! | [`hit`] | Hit-testing against the topmost drawn entity |
//! | [`raster`] | Wall rasterization and occupancy-grid conversion |
//! | [`consts`] | Shared numeric constants (wall style, hit slop, arena) |

pub mod consts;
pub mod convert;
pub mod doc;
pub mod engine;
pub mod hit;
pub mod input;
pub mod raster;
