//! boxed error type used so errors can cross thread boundaries.
//!
//! Everything in here runs on plain threads, so the error type has to be
//! Send + Sync for the `?` operator to work inside them.
pub type BoxError = std::boxed::Box<
    dyn std::error::Error // must implement Error to satisfy ?
        + std::marker::Send // needed for threads
        + std::marker::Sync, // needed for threads
>;
