use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{prefix}: {message}"))]
    ConfigError { message: String, prefix: String },
    #[snafu(display("Unrecognized command: {name}"))]
    UnknownCommandError { name: String },
    #[snafu(display("Invalid parameters for {command}: {message}"))]
    ParameterError { command: String, message: String },
    #[snafu(display("Failed to sign request: {message}"))]
    SigningError { message: String },
    #[snafu(display("{message}: {source}"))]
    ResponseError {
        message: String,
        source: std::io::Error,
    },
    /// Non-200 response, or no response at all (`status` is `None`) when the
    /// connection failed or timed out.
    #[snafu(display("{}", describe_transport(status, body)))]
    TransportError { status: Option<u16>, body: String },
    #[snafu(display("Failed to decode response: {message}"))]
    DecodeError { message: String },
}

fn describe_transport(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(status) => format!("Server error {status}\n{body}"),
        None => format!("Network error: {body}"),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
