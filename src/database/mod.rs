//! Hideout database layer.
//!
//! Provides SQLite connection management, schema migrations and the key-value
//! table behind the persistence port.
//!
//! # Usage
//!
//! ```no_run
//! use hideout::database::Database;
//!
//! let mut db = Database::open("hideout.db").expect("failed to open database");
//! db.put_values(&[("hideout.settings", "{}".to_string())]).expect("write failed");
//! assert!(db.get_value("hideout.settings").unwrap().is_some());
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
