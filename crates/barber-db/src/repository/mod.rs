//! # Repository Module
//!
//! Database repository implementations for Barber POS.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  barber-engine                                                          │
//! │       │  db.catalog().get_product("pomade")                             │
//! │       │  db.ledger().append(&record, Some(&effect))                     │
//! │       ▼                                                                 │
//! │  CatalogRepository            LedgerRepository                          │
//! │  ├── get/list services        ├── append (record + stock, one tx)       │
//! │  ├── get/list products        ├── query (window, barber, order, limit)  │
//! │  ├── get/list barbers         ├── get / find_reversal                   │
//! │  ├── stock / restock          └── count                                 │
//! │  └── upsert_seed                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Reference data and stock
//! - [`LedgerRepository`](ledger::LedgerRepository) - Append-only transaction log

pub mod catalog;
pub mod ledger;
