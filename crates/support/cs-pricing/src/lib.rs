//! Built-in pricing table and cost estimation.
//!
//! Estimates are rough monthly USD figures for capacity-shaped resources,
//! intended for relative cost ranking rather than billing accuracy. The
//! table is immutable and estimation is pure: no network, no failure path.

mod table;

pub use table::PricingTable;
