pub mod appointment;
pub mod dashboard;
pub mod enums;
pub mod filters;
pub mod inventory;
pub mod patient;
pub mod prescription;
pub mod requirement;
pub mod room;
pub mod staff;
pub mod user;

pub use appointment::*;
pub use dashboard::*;
pub use enums::*;
pub use filters::*;
pub use inventory::*;
pub use patient::*;
pub use prescription::*;
pub use requirement::*;
pub use room::*;
pub use staff::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Record identifiers arrive as strings from some endpoints and as integers
/// from others. Both are kept as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Int(n) => n.to_string(),
        }
    }
}

pub(crate) fn id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    RawId::deserialize(d).map(String::from)
}

pub(crate) fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(d)?.map(String::from))
}
