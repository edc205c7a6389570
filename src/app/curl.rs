use clap::CommandFactory;
use futures_util::StreamExt;
use reqwest::{Method, Response};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tracing::debug;

use crate::args::{CURL_TIMEOUT, Cli, CurlArgs, CurlRequest, parse_curl_args, parse_target_url};
use crate::error::{AppError, AppResult, HttpError, ValidationError};
use crate::http::{ClientSettings, RequestSpec, build_client};
use crate::report::format_compact_duration;
use crate::shutdown::ShutdownReceiver;

/// Sends one curl-style request and writes the response body to stdout.
pub(crate) async fn run_curl(args: &CurlArgs, shutdown_rx: &ShutdownReceiver) -> AppResult<()> {
    let request = parse_curl_args(&args.args)?;
    if request.show_help {
        return print_curl_help();
    }

    let started = Instant::now();
    let response = send(&request, shutdown_rx).await?;
    let status = response.status().as_u16();
    let mut stdout = tokio::io::stdout();
    let body_bytes = write_response(response, request.include_headers, &mut stdout).await?;

    if request.show_stats {
        eprintln!(
            "\nTime: {}\nStatus: {}\nBody bytes: {}",
            format_compact_duration(started.elapsed()),
            status,
            body_bytes
        );
    }
    Ok(())
}

fn print_curl_help() -> AppResult<()> {
    let mut cmd = Cli::command();
    cmd.build();
    if let Some(curl) = cmd.find_subcommand_mut("curl") {
        curl.print_long_help()?;
        println!();
    }
    Ok(())
}

async fn send(request: &CurlRequest, shutdown_rx: &ShutdownReceiver) -> AppResult<Response> {
    let raw_url = request
        .url
        .as_deref()
        .ok_or(ValidationError::CurlMissingUrl)?;
    let url = parse_target_url(raw_url)?;
    let method = Method::from_bytes(request.method.as_bytes()).map_err(|_err| {
        ValidationError::UnsupportedMethod {
            value: request.method.clone(),
        }
    })?;
    let headers = RequestSpec::default()
        .with_headers(&request.headers)?
        .headers()
        .clone();

    let client = build_client(&ClientSettings {
        request_timeout: Some(CURL_TIMEOUT),
        ..ClientSettings::default()
    })?;
    let mut builder = client.request(method, url).headers(headers);
    if let Some(body) = request.body.clone() {
        builder = builder.body(body);
    }

    debug!("curl {} {}", request.method, raw_url);
    let mut shutdown_rx = shutdown_rx.clone();
    tokio::select! {
        biased;
        () = shutdown_rx.triggered() => Err(AppError::http(HttpError::Cancelled)),
        result = builder.send() => result.map_err(|err| AppError::http(classify_send_error(err))),
    }
}

fn classify_send_error(err: reqwest::Error) -> HttpError {
    if err.is_timeout() {
        HttpError::RequestTimedOut {
            timeout_ms: CURL_TIMEOUT.as_millis(),
        }
    } else {
        HttpError::RequestFailed { source: err }
    }
}

/// Streams the body into `out`, preceded by the status line and headers when
/// `include_headers` is set. Returns the body size.
async fn write_response<W>(response: Response, include_headers: bool, out: &mut W) -> AppResult<u64>
where
    W: AsyncWrite + Unpin,
{
    if include_headers {
        let status_line = format!("{:?} {}\n", response.version(), response.status());
        out.write_all(status_line.as_bytes()).await?;
        for (name, value) in response.headers() {
            out.write_all(name.as_str().as_bytes()).await?;
            out.write_all(b": ").await?;
            out.write_all(value.as_bytes()).await?;
            out.write_all(b"\n").await?;
        }
        out.write_all(b"\n").await?;
    }

    let mut body_bytes: u64 = 0;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| AppError::http(HttpError::ReadBodyFailed { source: err }))?;
        out.write_all(&chunk).await?;
        body_bytes = body_bytes.saturating_add(u64::try_from(chunk.len()).unwrap_or(u64::MAX));
    }
    out.flush().await?;
    Ok(body_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_support::{MockBehavior, MockServer};
    use crate::shutdown::shutdown_channel;
    use std::future::Future;
    use std::time::Duration;

    fn run_async_test<F>(future: F) -> Result<(), String>
    where
        F: Future<Output = Result<(), String>>,
    {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|err| format!("Failed to build runtime: {}", err))?;
        runtime.block_on(future)
    }

    fn curl(args: &[&str]) -> Result<CurlRequest, String> {
        let owned: Vec<String> = args.iter().map(|arg| (*arg).to_owned()).collect();
        parse_curl_args(&owned).map_err(|err| err.to_string())
    }

    #[test]
    fn include_headers_prints_status_line() -> Result<(), String> {
        run_async_test(async {
            let server = MockServer::start(MockBehavior::default()).await?;
            let url = server.url("/hello")?;
            let request = curl(&["-i", url.as_str()])?;

            let response = send(&request, &ShutdownReceiver::never())
                .await
                .map_err(|err| err.to_string())?;
            let mut out: Vec<u8> = Vec::new();
            let body_bytes = write_response(response, request.include_headers, &mut out)
                .await
                .map_err(|err| err.to_string())?;

            let text = String::from_utf8_lossy(&out);
            if !text.starts_with("HTTP/1.1 200 OK\n") {
                return Err(format!("Unexpected status line:\n{}", text));
            }
            if !text.contains("content-length: 2\n") || !text.ends_with("\n\nok") {
                return Err(format!("Unexpected response dump:\n{}", text));
            }
            if body_bytes != 2 {
                return Err(format!("Expected 2 body bytes, got {}", body_bytes));
            }
            Ok(())
        })
    }

    #[test]
    fn data_switches_to_post_and_sends_headers() -> Result<(), String> {
        run_async_test(async {
            let server = MockServer::start(MockBehavior::default()).await?;
            let url = server.url("/submit")?;
            let request = curl(&[
                "curl",
                url.as_str(),
                "-H",
                "X-Trace: abc",
                "-d",
                "a=1",
                "--data-raw",
                "b=2",
                "-A",
                "custom-agent/1.0",
            ])?;

            let response = send(&request, &ShutdownReceiver::never())
                .await
                .map_err(|err| err.to_string())?;
            let mut out: Vec<u8> = Vec::new();
            write_response(response, false, &mut out)
                .await
                .map_err(|err| err.to_string())?;
            if out != b"ok" {
                return Err(format!("Unexpected body: {:?}", out));
            }

            let captured = server.captured();
            let first = captured.first().ok_or("No request captured")?;
            if first.method != "POST" || first.body != b"a=1&b=2" {
                return Err(format!("Unexpected request: {:?}", first));
            }
            if first.header_values("x-trace") != ["abc"] {
                return Err(format!("Missing header: {:?}", first.headers));
            }
            if first.header_values("user-agent") != ["custom-agent/1.0"] {
                return Err(format!("User-Agent not replaced: {:?}", first.headers));
            }
            Ok(())
        })
    }

    #[test]
    fn missing_url_is_reported() -> Result<(), String> {
        run_async_test(async {
            let request = curl(&["-X", "GET"])?;
            match send(&request, &ShutdownReceiver::never()).await {
                Err(AppError::Validation(ValidationError::CurlMissingUrl)) => Ok(()),
                Err(err) => Err(format!("Unexpected error: {}", err)),
                Ok(_) => Err("Expected missing URL error".to_owned()),
            }
        })
    }

    #[test]
    fn shutdown_cancels_pending_request() -> Result<(), String> {
        run_async_test(async {
            let server = MockServer::start(MockBehavior {
                status: 200,
                latency: Duration::from_secs(5),
            })
            .await?;
            let url = server.url("/slow")?;
            let request = curl(&[url.as_str()])?;
            let (shutdown_tx, shutdown_rx) = shutdown_channel();

            let pending = tokio::spawn(async move { send(&request, &shutdown_rx).await.is_err() });
            tokio::time::sleep(Duration::from_millis(50)).await;
            shutdown_tx.trigger();

            let failed = tokio::time::timeout(Duration::from_secs(2), pending)
                .await
                .map_err(|err| format!("send did not stop: {}", err))?
                .map_err(|err| format!("task failed: {}", err))?;
            if !failed {
                return Err("Expected cancellation error".to_owned());
            }
            Ok(())
        })
    }
}
