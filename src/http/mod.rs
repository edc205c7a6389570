//! Request dispatch engine: request issuing, rate pacing and the worker pool.
mod client;
mod dispatch;
mod issuer;
mod rate;
mod spec;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{ClientSettings, build_client};
pub use dispatch::{
    Dispatcher, ExecutionPolicy, dispatch, run_count, run_duration, run_duration_at_rate,
};
pub use issuer::{ReqwestTransport, Transport, issue};
pub use rate::{DEFAULT_PERMIT_BACKLOG, MIN_PERMIT_INTERVAL, Permits, RatePacer};
pub use spec::RequestSpec;
