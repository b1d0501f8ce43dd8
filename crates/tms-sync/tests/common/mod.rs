pub mod builders;
pub mod harness;
pub mod tms;
