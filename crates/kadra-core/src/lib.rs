//! Pure domain rules: posting-price derivation and the job/application
//! lifecycle. No I/O here — the store calls into these from inside its
//! transactions.

pub mod lifecycle;
pub mod pricing;
