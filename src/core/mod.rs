pub mod ledger;

pub use crate::domain::model::{TitleAverage, TitleRatings, UserRating};
pub use crate::domain::ports::{Storage, UserNameResolver};
pub use crate::utils::error::Result;
pub use ledger::{Ledger, LedgerFiles};
