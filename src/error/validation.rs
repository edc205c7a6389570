use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid header format: '{value}'. Expected 'Key: Value'")]
    InvalidHeaderFormat { value: String },
    #[error("Invalid header key in: '{value}'")]
    HeaderKeyEmpty { value: String },
    #[error("Invalid header name '{name}': {source}")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: reqwest::header::InvalidHeaderName,
    },
    #[error("Invalid value for header '{name}': {source}")]
    InvalidHeaderValue {
        name: String,
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },
    #[error("--url is required")]
    MissingUrl,
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid URL '{url}': expected an absolute http(s) URL with a host.")]
    UrlNotAbsolute { url: String },
    #[error("Unsupported method: {value}")]
    UnsupportedMethod { value: String },
    #[error("Unsupported output format: {value}")]
    UnsupportedOutput { value: String },
    #[error("Unsupported docs format: {value} (use markdown|man)")]
    UnsupportedDocsFormat { value: String },
    #[error("--{flag} must be > 0")]
    MustBePositive { flag: &'static str },
    #[error("--{flag} must be >= 0")]
    MustNotBeNegative { flag: &'static str },
    #[error(
        "requests mode: do not set --per-step-duration or --rps when using --requests-per-step"
    )]
    RampRequestsModeConflict,
    #[error("must set either --requests-per-step (>0) or --per-step-duration (>0)")]
    RampModeMissing,
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("{flag} requires a value")]
    CurlFlagMissingValue { flag: &'static str },
    #[error("missing URL in curl arguments")]
    CurlMissingUrl,
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
