mod curl;
mod docs;
mod ramp;
mod run;
mod version;

pub(crate) use curl::run_curl;
pub(crate) use docs::run_docs;
pub(crate) use ramp::{RampPlan, run_ramp};
pub(crate) use run::{RunPlan, run_load};
pub(crate) use version::run_version;
