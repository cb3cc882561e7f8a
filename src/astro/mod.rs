// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Column roles and reference frames.
//!
//! - [`roles`] - Scores columns as RA/DEC/PMRA/PMDEC/X/Y/TIME
//! - [`angle`] - Decimal and sexagesimal angle parsing
//! - [`frame`] - Celestial frames and conversion to ICRS
//! - [`time`] - Time scales and conversion to TCB
//! - [`metadata`] - COOSYS/TIMESYS declarations of a document
//! - [`resolver`] - Per-record canonical position and time

pub mod angle;
pub mod frame;
pub mod metadata;
pub mod resolver;
pub mod roles;
pub mod time;

pub use angle::{AngleNotation, AngleUnit};
pub use frame::{AstroFrame, FrameSystem};
pub use metadata::{FrameLookup, FrameMetadata};
pub use resolver::{RecordResolver, ResolvedPosition};
pub use roles::{score_field, FrameHint, RoleAssignment, RoleCandidate, RoleClassifier, TableKind};
pub use time::{RefPosition, TimeEncoding, TimeFrame, TimeScale};
