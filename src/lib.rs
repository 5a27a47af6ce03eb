//! downtidy - a downloads folder organizer
//!
//! This library sorts the loose files of a watched directory into a
//! category/extension hierarchy (or into year/month folders), moves
//! pre-existing subfolders aside, deletes empty and temporary files, and
//! prunes empty directories without ever touching the organizer's own
//! folder structure.

pub mod cleaner;
pub mod cli;
pub mod collision;
pub mod config;
pub mod confirm;
pub mod date_bucket;
pub mod file_category;
pub mod file_organizer;
pub mod layout;
pub mod logging;
pub mod output;
pub mod protection;
pub mod pruner;
pub mod report;

pub use config::{ConfigError, Settings};
pub use confirm::{Confirm, PromptKind};
pub use file_category::{CategoryTable, DestinationPlan, DestinationResolver};
pub use file_organizer::{FileOrganizer, OrganizeError, OrganizeReport};
pub use protection::ProtectionSet;

pub use cli::{OrganizeCommand, run_cli};
