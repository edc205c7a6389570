
use std::fs;
use std::net::TcpListener;

use tempfile::tempdir;

use support_single::{describe, run_stress_test, spawn_http_server_or_skip};

fn parse_json(raw: &[u8]) -> Result<serde_json::Value, String> {
    serde_json::from_slice(raw).map_err(|err| format!("invalid JSON output: {}", err))
}

#[test]
fn e2e_run_text_summary() -> Result<(), String> {
    let Some((url, server)) = spawn_http_server_or_skip(200)? else {
        return Ok(());
    };

    let output = run_stress_test([
        "run",
        "--url",
        url.as_str(),
        "--requests",
        "20",
        "--concurrency",
        "4",
    ])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("Total requests: 20") || !stdout.contains("HTTP 200: 20") {
        return Err(describe(&output));
    }
    if stdout.contains("Errors:") || stdout.contains("Other status codes") {
        return Err(describe(&output));
    }
    if server.hits() != 20 {
        return Err(format!("Expected 20 hits, got {}", server.hits()));
    }
    Ok(())
}

#[test]
fn e2e_run_json_out_file() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip(200)? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let out_file = dir.path().join("result.json");

    let output = run_stress_test([
        "run",
        "--url",
        url.as_str(),
        "--requests",
        "10",
        "--method",
        "POST",
        "-H",
        "Content-Type: application/json",
        "--body",
        "{\"a\":1}",
        "--output",
        "json",
        "--out-file",
        &out_file.to_string_lossy(),
    ])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    if !output.stdout.is_empty() {
        return Err(format!("stdout should be empty:\n{}", describe(&output)));
    }

    let raw = fs::read(&out_file).map_err(|err| format!("read out file failed: {}", err))?;
    let value = parse_json(&raw)?;
    if value["total_requests"] != 10 || value["http_200"] != 10 || value["errors"] != 0 {
        return Err(format!("Unexpected counters: {}", value));
    }
    if value["method"] != "POST" || value["status_counts"]["200"] != 10 {
        return Err(format!("Unexpected summary: {}", value));
    }
    if value["timestamp"].as_str().is_none_or(str::is_empty) {
        return Err(format!("Missing timestamp: {}", value));
    }
    Ok(())
}

#[test]
fn e2e_run_counts_other_statuses() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip(503)? else {
        return Ok(());
    };

    let output = run_stress_test(["run", "--url", url.as_str(), "--requests", "5"])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("HTTP 200: 0") || !stdout.contains("Other status codes:\n- 503: 5") {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_run_counts_connection_errors() -> Result<(), String> {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0")
            .map_err(|err| format!("bind scratch port failed: {}", err))?;
        listener
            .local_addr()
            .map_err(|err| format!("scratch port addr failed: {}", err))?
            .port()
    };
    let url = format!("http://127.0.0.1:{}", port);

    let output = run_stress_test(["run", "--url", url.as_str(), "--requests", "3"])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("Total requests: 3") || !stdout.contains("Errors: 3") {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_ramp_requests_mode() -> Result<(), String> {
    let Some((url, server)) = spawn_http_server_or_skip(200)? else {
        return Ok(());
    };

    let output = run_stress_test([
        "ramp",
        "--url",
        url.as_str(),
        "--steps",
        "2",
        "--start-concurrency",
        "1",
        "--step-concurrency",
        "2",
        "--requests-per-step",
        "5",
    ])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.contains("Phase 1: ") || !stdout.contains("Phase 2: ") || !stdout.contains("---") {
        return Err(describe(&output));
    }
    if !stdout.contains("Total requests: 10") || !stdout.contains("Overall RPS: ") {
        return Err(describe(&output));
    }
    if !stderr.contains("Phase 2/2: concurrency=3, requests=5") {
        return Err(describe(&output));
    }
    if server.hits() != 10 {
        return Err(format!("Expected 10 hits, got {}", server.hits()));
    }
    Ok(())
}

#[test]
fn e2e_ramp_paced_json() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip(200)? else {
        return Ok(());
    };

    let output = run_stress_test([
        "ramp",
        "--url",
        url.as_str(),
        "--steps",
        "2",
        "--start-concurrency",
        "2",
        "--step-concurrency",
        "0",
        "--per-step-duration",
        "300ms",
        "--rps",
        "20",
        "--step-rps",
        "10",
        "--output",
        "json",
    ])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let value = parse_json(&output.stdout)?;
    if value["mode"] != "duration+rate"
        || value["per_step"] != "per_step_duration=300ms,rps_start=20.00,step_rps=10.00"
    {
        return Err(format!("Unexpected ramp summary: {}", value));
    }
    let phases = value["phases"]
        .as_array()
        .ok_or_else(|| format!("Missing phases: {}", value))?;
    if phases.len() != 2 {
        return Err(format!("Expected 2 phases: {}", value));
    }
    // 20 rps for 300ms allows at most 6 permits, 30 rps at most 9.
    let total = value["total_requests"].as_u64().unwrap_or(u64::MAX);
    if total > 15 {
        return Err(format!("Pacing exceeded: {}", value));
    }
    Ok(())
}

#[test]
fn e2e_ramp_rejects_conflicting_modes() -> Result<(), String> {
    let output = run_stress_test([
        "ramp",
        "--url",
        "http://127.0.0.1:9",
        "--requests-per-step",
        "10",
        "--per-step-duration",
        "1s",
    ])?;
    if output.status.success() {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_run_requires_requests() -> Result<(), String> {
    let output = run_stress_test(["run", "--url", "http://127.0.0.1:9"])?;
    if output.status.success() {
        return Err(describe(&output));
    }
    let bad_url = run_stress_test(["run", "--url", "not a url", "--requests", "1"])?;
    if bad_url.status.success() {
        return Err(describe(&bad_url));
    }
    Ok(())
}

#[test]
fn e2e_curl_includes_headers_and_stats() -> Result<(), String> {
    let Some((url, _server)) = spawn_http_server_or_skip(200)? else {
        return Ok(());
    };

    let output = run_stress_test(["curl", "-i", url.as_str(), "--stats"])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.starts_with("HTTP/1.1 200 OK\n") || !stdout.ends_with("\n\nOK") {
        return Err(describe(&output));
    }
    if !stderr.contains("Status: 200") || !stderr.contains("Body bytes: 2") {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_curl_without_args_prints_help() -> Result<(), String> {
    let output = run_stress_test(["curl"])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    if !String::from_utf8_lossy(&output.stdout).contains("Supported flags") {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_version_prints_build_info() -> Result<(), String> {
    let output = run_stress_test(["version"])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let expected = format!("version: {}\n", env!("CARGO_PKG_VERSION"));
    if !stdout.starts_with(&expected) || !stdout.contains("commit: ") || !stdout.contains("date: ")
    {
        return Err(describe(&output));
    }
    Ok(())
}

#[test]
fn e2e_docs_markdown() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let out_dir = dir.path().join("cli");

    let output = run_stress_test([
        "docs",
        "--format",
        "md",
        "--out-dir",
        &out_dir.to_string_lossy(),
    ])?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    for page in ["stress-test.md", "stress-test_run.md", "stress-test_ramp.md"] {
        if !out_dir.join(page).exists() {
            return Err(format!("Missing {}", page));
        }
    }
    Ok(())
}
