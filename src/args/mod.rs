//! CLI argument types and parsing helpers.
mod cli;
mod curl;
mod defaults;
pub(crate) mod parsers;
mod types;


pub use cli::{
    Cli, Command, CurlArgs, DocsArgs, OutputArgs, RampArgs, RequestArgs, RunArgs,
};
pub use curl::{CurlRequest, parse_curl_args};
pub use parsers::parse_target_url;
pub use types::{DocsFormat, HeaderPair, HttpMethod, OutputFormat};

pub(crate) use defaults::{CURL_TIMEOUT, DEFAULT_RAMP_REQUESTS_PER_STEP, DEFAULT_USER_AGENT};
pub(crate) use parsers::{parse_duration_arg, parse_header};
