// SPDX-License-Identifier: MIT

pub mod accumulator;
pub mod blocks;
pub mod condition;
pub mod context;
pub mod error;
pub mod field;
pub mod value;
pub mod visibility;

pub use context::Context;
pub use error::{ConditionError, DossierError};
pub use value::Value;
