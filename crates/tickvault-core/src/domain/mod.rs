//! # Domain Models
//!
//! Strongly-typed values shared by every pipeline stage.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated ticker, caret-escaped for URLs and paths |
//! | [`ResourceKey`] | Relative storage path of one cached blob |
//! | [`CurrencyCode`] | Three-letter currency code |
//! | [`Profile`] | Company reference record read back from the cache |
//! | [`FxCatalog`] | Currency catalog of the FX provider |
//! | [`ConstituentEntry`] | Index constituent record |

mod models;
mod resource_key;
mod symbol;

pub use models::{validate_currency_code, ConstituentEntry, CurrencyCode, FxCatalog, Profile};
pub use resource_key::ResourceKey;
pub use symbol::{decode_path_segment, Symbol};
