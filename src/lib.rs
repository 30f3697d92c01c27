//! # GreenThumb
//!
//! A local-first plant catalog whose descriptions are driven by remote
//! configuration.
//!
//! Plants live in SQLite. A remote key/value configuration decides which of
//! two bundled description datasets (basic or advanced) is written into the
//! catalog. Fetching is fail-open: when the remote source cannot be reached,
//! the descriptions are applied from the last activated snapshot or the
//! defaults.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  fetch   ┌──────────────┐ activate ┌──────────────┐
//! │ ConfigSource │─────────▶│ RemoteConfig │─────────▶│   Snapshot   │
//! │ HTTP / file  │          │ cache + state│          │  (active)    │
//! └──────────────┘          └──────────────┘          └──────┬───────┘
//!                                                            │ plant_description
//!                                                            ▼
//!                          ┌──────────────┐  update   ┌──────────────┐
//!                          │   Catalog    │──────────▶│    SQLite    │
//!                          │ basic / adv. │  id = i+1 │    plants    │
//!                          └──────────────┘           └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! greenthumb init               # create and seed the database
//! greenthumb refresh            # fetch remote config and apply descriptions
//! greenthumb plants             # list the catalog
//! greenthumb link https://greenthumb.example.com/plants/3
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`catalog`] | Bundled plants and description datasets |
//! | [`remote_config`] | Sources, snapshots, fetch and activation |
//! | [`apply`] | Writing a dataset into the plant store |
//! | [`refresh`] | The fetch → activate → apply flow |
//! | [`store`] | Plant store trait and SQLite implementation |
//! | [`preferences`] | First-load flag and experience rating |
//! | [`deep_link`] | Plant deep links |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations and seeding |

pub mod apply;
pub mod catalog;
pub mod config;
pub mod config_cache;
pub mod config_status;
pub mod db;
pub mod deep_link;
pub mod migrate;
pub mod models;
pub mod plants;
pub mod preferences;
pub mod refresh;
pub mod remote_config;
pub mod store;
