//! # filehop-core: shared pieces of the filehop transfer engines
//!
//! - `types`: control responses, session state, listing entities
//! - `error`: the error taxonomy every engine reports through
//! - `listing`: Unix `ls -al` grammar → [`Entity`]

pub mod error;
pub mod listing;
pub mod types;

pub use error::{mask_secret, XferError, XferErrorKind, XferResult};
pub use listing::{parse_line, parse_listing};
pub use types::*;
