mod error;
pub mod ledger;
pub mod lifecycle;
pub mod presentation;
pub mod token;

pub use error::SuggestionError;
