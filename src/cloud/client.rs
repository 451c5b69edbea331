use std::io::Read;
use std::time::Duration;

use chrono::{DateTime, Utc};
use snafu::prelude::*;

use crate::common::{ConfigSnafu, DecodeSnafu, ResponseSnafu, Result, TransportSnafu};
use crate::signing::{sign, CanonicalRequest, Method, Params};

use super::commands::{kill_params, Command, LaunchRequest, ACCESS_ID_PARAM};
use super::models::{decode_records, License, Machine};
use super::Config;

pub const SIGNATURE_HEADER: &str = "X-Gurobi-Signature";
pub const DATE_HEADER: &str = "X-Gurobi-Date";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub struct InstantCloud {
    config: Config,
    agent: ureq::Agent,
}

impl InstantCloud {
    pub fn new(config: Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self { config, agent }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn licenses(&self) -> Result<Vec<License>> {
        let body = self.send(Command::Licenses, Params::new())?;
        decode_records(&body)
    }

    pub fn machines(&self) -> Result<Vec<Machine>> {
        let body = self.send(Command::Machines, Params::new())?;
        decode_records(&body)
    }

    pub fn launch(&self, request: &LaunchRequest) -> Result<Vec<Machine>> {
        let body = self.send(Command::Launch, request.to_params())?;
        decode_records(&body)
    }

    pub fn kill<S: AsRef<str>>(&self, machine_ids: &[S]) -> Result<Vec<Machine>> {
        let body = self.send(Command::Kill, kill_params(machine_ids)?)?;
        decode_records(&body)
    }

    /// Signs and sends one command, returning the raw success body.
    pub fn send(&self, command: Command, params: Params) -> Result<String> {
        self.send_at(command, params, Utc::now())
    }

    /// As [`InstantCloud::send`], signing with the given time instead of the
    /// current one.
    pub fn send_at(&self, command: Command, params: Params, now: DateTime<Utc>) -> Result<String> {
        let spec = command.spec();
        spec.validate(&params)?;

        let mut params = params;
        params.push(ACCESS_ID_PARAM, self.config.access_id.as_str());

        let request = CanonicalRequest::new(spec.method, params, now);
        let string_to_sign = request.string_to_sign();
        let signature = sign(&string_to_sign, &self.config.secret_key)?;

        let mut url = self.command_url(spec.name)?;
        if spec.method == Method::Get {
            url.set_query(Some(&request.params().to_form()));
        }

        tracing::debug!(
            command = spec.name,
            method = spec.method.as_str(),
            url = url.as_str(),
            string_to_sign,
            signature,
            "Sending request"
        );

        let req = match spec.method {
            Method::Get => self.agent.get(url.as_str()),
            Method::Post => self.agent.post(url.as_str()),
        }
        .set(SIGNATURE_HEADER, &signature)
        .set(DATE_HEADER, request.timestamp());

        let result = match spec.method {
            Method::Get => req.call(),
            Method::Post => {
                let body = request.params().to_form();
                tracing::debug!(command = spec.name, body, "Request body");
                req.set("Content-Type", FORM_CONTENT_TYPE).send_string(&body)
            }
        };

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                return Self::status_error(spec.name, status, response)
            }
            Err(err) => {
                tracing::debug!(command = spec.name, error = %err, "Request failed");
                return TransportSnafu {
                    status: None::<u16>,
                    body: format!("{} {url} failed: {err}", spec.method),
                }
                .fail();
            }
        };

        // ureq treats every 2xx/3xx as success; only 200 is.
        if response.status() != 200 {
            let status = response.status();
            return Self::status_error(spec.name, status, response);
        }

        let body = String::from_utf8(Self::read_body(spec.name, response)?).map_err(|err| {
            DecodeSnafu {
                message: format!("response is not valid UTF-8: {err}"),
            }
            .build()
        })?;

        tracing::debug!(command = spec.name, bytes = body.len(), "Request completed");
        Ok(body)
    }

    /// Reads the whole body, without the size cap of `Response::into_string`.
    fn read_body(command: &str, response: ureq::Response) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .context(ResponseSnafu {
                message: format!("Failed to read {command} response"),
            })?;
        Ok(body)
    }

    fn status_error(command: &str, status: u16, response: ureq::Response) -> Result<String> {
        let body = Self::read_body(command, response)?;
        tracing::debug!(command, status, bytes = body.len(), "Request rejected");
        TransportSnafu {
            status: Some(status),
            body: String::from_utf8_lossy(&body),
        }
        .fail()
    }

    fn command_url(&self, command: &str) -> Result<url::Url> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ConfigSnafu {
                    message: format!("{} cannot be used as a base URL", self.config.base_url),
                    prefix: "base_url",
                }
                .build()
            })?
            .pop_if_empty()
            .push(command);
        url.set_query(None);
        Ok(url)
    }
}
