// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI subcommands.

mod convert;
mod detect;
mod inspect;

pub use convert::ConvertCmd;
pub use detect::DetectCmd;
pub use inspect::InspectCmd;
