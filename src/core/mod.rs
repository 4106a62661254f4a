pub mod etl;
pub mod export;
pub mod handle_mapping;
pub mod matched;
pub mod reconcile;
pub mod sitemap;
pub mod spreadsheet;

pub use crate::domain::model::{RedirectPlan, RedirectRule, SheetTable, TargetShop};
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
