//! Core library for the itn-tools command line application.
//!
//! School-based ITN distribution records carry their location as a scanned QR
//! payload. The library parses those payloads in [`distribution::extract`],
//! rolls enrollment and gender counts up to chiefdom, district and overall
//! level in [`distribution::aggregate`], and narrows rows by location in
//! [`distribution::filter`]. Loading and report writing live under
//! [`distribution::io`] and [`distribution::tabulate`], orchestrated by
//! [`distribution::pipeline`].

pub mod distribution;

pub use distribution::{
    ItnError, Result, aggregate, error, extract, filter, io, model, pipeline, tabulate,
};
