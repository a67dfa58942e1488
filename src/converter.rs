//! External document converter invocation.
//! Converter options from the configuration and from a page's front matter
//! are merged, flattened into an argument list and passed to the converter
//! subprocess together with the input and output paths.

use crate::config::{parse_converter_options, Config, ConverterOption};
use crate::constants::ReservedKey;
use crate::data::Mapping;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use std::ffi::OsString;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Merges the page-level overrides found under `__converter_options__`
/// over the configured options. A page value replaces the global value for
/// the same key.
///
/// # Errors
/// * `Error::ConfigValidationError` if the override is not a mapping or holds
///   an unsupported value
pub fn merge_options(
    global: &IndexMap<String, ConverterOption>,
    frontmatter: &Mapping,
) -> Result<IndexMap<String, ConverterOption>> {
    let mut merged = global.clone();

    match frontmatter.get(ReservedKey::ConverterOptions.as_str()) {
        None | Some(serde_json::Value::Null) => {}
        Some(serde_json::Value::Object(overrides)) => {
            let overrides: Mapping = overrides.clone().into_iter().collect();
            merged.extend(parse_converter_options(&overrides)?);
        }
        Some(_) => {
            return Err(Error::ConfigValidationError(format!(
                "{} must be a mapping",
                ReservedKey::ConverterOptions
            )))
        }
    }

    Ok(merged)
}

/// Command-line spelling of an option key: `toc` becomes `--toc`, keys that
/// already start with `-` are used verbatim.
pub fn option_flag(key: &str) -> String {
    if key.starts_with('-') {
        key.to_string()
    } else {
        format!("--{}", key)
    }
}

/// Flattens options into arguments, in option order.
pub fn flatten_options(options: &IndexMap<String, ConverterOption>) -> Vec<String> {
    let mut args = Vec::new();
    for (key, option) in options {
        match option {
            ConverterOption::Flag(true) => args.push(option_flag(key)),
            ConverterOption::Flag(false) | ConverterOption::Disabled => {}
            ConverterOption::Value(value) => {
                args.push(option_flag(key));
                args.push(value.clone());
            }
            ConverterOption::List(values) => {
                for value in values {
                    args.push(option_flag(key));
                    args.push(value.clone());
                }
            }
        }
    }
    args
}

/// Full converter argument list: options, then the output and input paths.
pub fn build_args(
    input: &Path,
    output: &Path,
    options: &IndexMap<String, ConverterOption>,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = flatten_options(options).into_iter().map(OsString::from).collect();
    args.push(OsString::from("--output"));
    args.push(output.as_os_str().to_os_string());
    args.push(input.as_os_str().to_os_string());
    args
}

/// Runs the converter on `input`, writing `output`.
///
/// The process runs in the configuration root. A non-zero exit fails with
/// the captured stderr; with a configured timeout a hung converter is killed.
pub fn run_converter(
    config: &Config,
    page: &str,
    input: &Path,
    output: &Path,
    options: &IndexMap<String, ConverterOption>,
) -> Result<()> {
    let (program, leading) = config.converter.split_first().ok_or_else(|| {
        Error::ConfigValidationError("converter must not be empty".to_string())
    })?;
    let args = build_args(input, output, options);
    debug!("Running {} {:?} {:?}", program, leading, args);

    let mut child = Command::new(program)
        .args(leading)
        .args(&args)
        .current_dir(&config.root)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()?;

    let mut stderr_pipe = child.stderr.take();
    let stderr_reader = thread::spawn(move || {
        let mut buf = String::new();
        if let Some(pipe) = stderr_pipe.as_mut() {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    });

    let status = match config.converter_timeout {
        Some(timeout) => wait_with_timeout(&mut child, timeout, page)?,
        None => child.wait()?,
    };
    let stderr = stderr_reader.join().unwrap_or_default();

    if !status.success() {
        return Err(Error::ConverterInvocationError {
            page: page.to_string(),
            status: status.to_string(),
            stderr,
        });
    }
    Ok(())
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
    page: &str,
) -> Result<std::process::ExitStatus> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            child.kill()?;
            child.wait()?;
            return Err(Error::ConverterTimeoutError {
                page: page.to_string(),
                seconds: timeout.as_secs(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}
