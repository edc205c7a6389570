use super::*;

#[test]
fn parse_header_valid() -> AppResult<()> {
    let parsed = parse_header("Content-Type: application/json")?;
    if parsed.name != "Content-Type" {
        return Err(AppError::validation(format!(
            "Unexpected key: {}",
            parsed.name
        )));
    }
    if parsed.value != "application/json" {
        return Err(AppError::validation(format!(
            "Unexpected value: {}",
            parsed.value
        )));
    }
    Ok(())
}

#[test]
fn parse_header_keeps_colons_in_value() -> AppResult<()> {
    let parsed = parse_header("Referer:  http://example.com:8080/x ")?;
    if parsed.value != "http://example.com:8080/x" {
        return Err(AppError::validation(format!(
            "Unexpected value: {}",
            parsed.value
        )));
    }
    Ok(())
}

#[test]
fn parse_header_invalid() -> AppResult<()> {
    if parse_header("MissingDelimiter").is_ok() {
        return Err(AppError::validation("Expected Err for missing delimiter"));
    }
    if parse_header("   : value").is_ok() {
        return Err(AppError::validation("Expected Err for empty key"));
    }
    Ok(())
}

#[test]
fn repeated_header_flags_keep_order() -> AppResult<()> {
    let cli = Cli::try_parse_from([
        "stress-test",
        "run",
        "--url",
        "http://localhost",
        "--requests",
        "1",
        "-H",
        "X-A: 1",
        "--header",
        "X-A: 2",
    ])?;
    let Command::Run(run) = cli.command else {
        return Err(AppError::validation("Expected run subcommand"));
    };
    let values: Vec<&str> = run
        .request
        .headers
        .iter()
        .map(|header| header.value.as_str())
        .collect();
    if values != ["1", "2"] {
        return Err(AppError::validation(format!(
            "Unexpected headers: {:?}",
            values
        )));
    }
    Ok(())
}
