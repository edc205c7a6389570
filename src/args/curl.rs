use tracing::debug;

use super::parsers::parse_header;
use super::types::HeaderPair;
use crate::error::ValidationError;

/// One request described with a subset of curl's flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurlRequest {
    pub method: String,
    pub url: Option<String>,
    pub headers: Vec<HeaderPair>,
    pub body: Option<String>,
    /// `-i`: print the status line and headers before the body.
    pub include_headers: bool,
    /// `--stats`: print time, status and body size to stderr.
    pub show_stats: bool,
    pub show_help: bool,
}

impl Default for CurlRequest {
    fn default() -> Self {
        Self {
            method: "GET".to_owned(),
            url: None,
            headers: Vec::new(),
            body: None,
            include_headers: false,
            show_stats: false,
            show_help: false,
        }
    }
}

/// Parses curl-style arguments. A leading literal `curl` is dropped and
/// unknown flags are ignored. No arguments at all, `-h` or `--help` ask for
/// help.
///
/// # Errors
///
/// Returns an error when a flag is missing its value or a header is malformed.
pub fn parse_curl_args(args: &[String]) -> Result<CurlRequest, ValidationError> {
    let args = match args.split_first() {
        Some((first, rest)) if first == "curl" => rest,
        Some(_) | None => args,
    };
    let mut request = CurlRequest::default();
    if args.is_empty() || args.iter().any(|arg| arg == "-h" || arg == "--help") {
        request.show_help = true;
        return Ok(request);
    }

    let mut bodies: Vec<&str> = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-X" | "--request" => {
                let value = next_value(&mut iter, "-X/--request")?;
                request.method = value.trim().to_ascii_uppercase();
            }
            "-H" | "--header" => {
                let value = next_value(&mut iter, "-H/--header")?;
                request.headers.push(parse_header(value)?);
            }
            "-d" | "--data" | "--data-raw" | "--data-binary" | "--data-ascii" => {
                bodies.push(next_value(&mut iter, "-d/--data*")?);
                if request.method == "GET" {
                    request.method = "POST".to_owned();
                }
            }
            "-A" | "--user-agent" => {
                let value = next_value(&mut iter, "-A/--user-agent")?;
                request
                    .headers
                    .retain(|header| !header.name.eq_ignore_ascii_case("user-agent"));
                request.headers.push(HeaderPair {
                    name: "User-Agent".to_owned(),
                    value: value.to_owned(),
                });
            }
            "-I" | "--head" => request.method = "HEAD".to_owned(),
            "-i" => request.include_headers = true,
            "--stats" => request.show_stats = true,
            "--url" => {
                request.url = Some(next_value(&mut iter, "--url")?.to_owned());
            }
            other => {
                let looks_like_url = other.starts_with("http://") || other.starts_with("https://");
                if looks_like_url && request.url.is_none() {
                    request.url = Some(other.to_owned());
                } else {
                    debug!("Ignoring unsupported curl argument: {}", other);
                }
            }
        }
    }

    if !bodies.is_empty() {
        request.body = Some(bodies.join("&"));
    }
    Ok(request)
}

fn next_value<'arg>(
    iter: &mut std::slice::Iter<'arg, String>,
    flag: &'static str,
) -> Result<&'arg str, ValidationError> {
    iter.next()
        .map(String::as_str)
        .ok_or(ValidationError::CurlFlagMissingValue { flag })
}
