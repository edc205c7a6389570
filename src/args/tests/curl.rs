use super::*;

fn args(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|arg| (*arg).to_owned()).collect()
}

#[test]
fn curl_basic_get() -> AppResult<()> {
    let request = parse_curl_args(&args(&["curl", "https://example.com/get"]))?;
    if request.method != "GET" || request.url.as_deref() != Some("https://example.com/get") {
        return Err(AppError::validation(format!("Unexpected request: {:?}", request)));
    }
    if request.body.is_some() || request.include_headers || request.show_stats {
        return Err(AppError::validation("Unexpected flags"));
    }
    Ok(())
}

#[test]
fn curl_data_switches_to_post_and_joins() -> AppResult<()> {
    let request = parse_curl_args(&args(&[
        "-d",
        "a=1",
        "--data-raw",
        "b=2",
        "https://example.com",
    ]))?;
    if request.method != "POST" {
        return Err(AppError::validation("Expected POST"));
    }
    if request.body.as_deref() != Some("a=1&b=2") {
        return Err(AppError::validation(format!("Unexpected body: {:?}", request.body)));
    }
    Ok(())
}

#[test]
fn curl_explicit_method_wins_after_data() -> AppResult<()> {
    let request = parse_curl_args(&args(&["-d", "x", "-X", "put", "--url", "http://h"]))?;
    if request.method != "PUT" || request.url.as_deref() != Some("http://h") {
        return Err(AppError::validation(format!("Unexpected request: {:?}", request)));
    }
    Ok(())
}

#[test]
fn curl_head_include_stats_and_user_agent() -> AppResult<()> {
    let request = parse_curl_args(&args(&[
        "-I",
        "-i",
        "--stats",
        "-H",
        "User-Agent: first",
        "-A",
        "second",
        "--compressed",
        "http://h",
        "http://ignored",
    ]))?;
    if request.method != "HEAD" || !request.include_headers || !request.show_stats {
        return Err(AppError::validation(format!("Unexpected request: {:?}", request)));
    }
    if request.url.as_deref() != Some("http://h") {
        return Err(AppError::validation("First URL should win"));
    }
    let agents: Vec<&str> = request
        .headers
        .iter()
        .filter(|header| header.name.eq_ignore_ascii_case("user-agent"))
        .map(|header| header.value.as_str())
        .collect();
    if agents != ["second"] {
        return Err(AppError::validation(format!("Unexpected agents: {:?}", agents)));
    }
    Ok(())
}

#[test]
fn curl_help_requests() -> AppResult<()> {
    for raw in [vec![], vec!["curl"], vec!["-X", "GET", "--help"], vec!["-h"]] {
        let request = parse_curl_args(&args(&raw))?;
        if !request.show_help {
            return Err(AppError::validation(format!("Expected help for {:?}", raw)));
        }
    }
    Ok(())
}

#[test]
fn curl_missing_values_and_bad_headers() -> AppResult<()> {
    for raw in [vec!["-X"], vec!["http://h", "-H"], vec!["--url"], vec!["-d"], vec!["-A"]] {
        if parse_curl_args(&args(&raw)).is_ok() {
            return Err(AppError::validation(format!("Expected Err for {:?}", raw)));
        }
    }
    if parse_curl_args(&args(&["-H", "NoColon", "http://h"])).is_ok() {
        return Err(AppError::validation("Expected Err for malformed header"));
    }
    Ok(())
}

#[test]
fn curl_without_url_parses_but_has_none() -> AppResult<()> {
    let request = parse_curl_args(&args(&["-X", "GET", "-i"]))?;
    if request.url.is_some() {
        return Err(AppError::validation("Expected no URL"));
    }
    Ok(())
}
