//! Domain models for the clinic wizards.

mod appointment;
mod field;
mod patient;
mod step;

pub use appointment::*;
pub use field::{Draft, FieldKey, FieldValue};
pub use patient::*;
pub use step::*;

pub(crate) use field::{is_filled, parse_date, parse_time};
