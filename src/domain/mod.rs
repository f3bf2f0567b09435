//! Derived state computed from the fetched collections
//!
//! Everything in here is synchronous and pure: callers gather the data first,
//! read the clock once, then hand both to these functions.

pub mod aggregate;
pub mod deadline;
pub mod filter;

pub use aggregate::{aggregate, contract_rows, notifications, Aggregation};
pub use deadline::Notice;
pub use filter::{filter_contracts, filter_periods, sort_records, ContractFilter, PeriodFilter};
