mod credentials;
mod price;
mod secret;

pub mod helpers;

pub use credentials::Credentials;
pub use price::{Price, PriceConversionError};
pub use secret::Secret;
