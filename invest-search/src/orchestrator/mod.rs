//! Search orchestration: fingerprinting, concurrent provider fan-out, URL
//! dedup, cache population and prompt formatting.

pub mod dedup;
pub mod fingerprint;
pub mod format;
pub mod manager;
pub mod url_normalize;
