// SPDX-License-Identifier: MIT

//! dossier-rs: declarative report forms rendered into documents.
//!
//! - [`engine`] holds the rule core: values, the answer context, the
//!   condition language, field visibility, block selection and the
//!   sequential form pass.
//! - [`platform`] wires that core to plugin configuration on disk, the
//!   handler registry, document rendering, sessions and the HTTP API.

pub mod engine;
pub mod platform;
