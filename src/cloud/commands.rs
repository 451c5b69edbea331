use std::str::FromStr;

use snafu::prelude::*;

use crate::common::{ParameterSnafu, Result, UnknownCommandSnafu};
use crate::signing::{Method, Params};

/// Idle shutdown applied to launched machines when the caller gives none.
pub const DEFAULT_IDLE_SHUTDOWN: u32 = 60;
pub const DEFAULT_NUM_MACHINES: u32 = 1;

/// Name of the parameter carrying the access id on every request.
pub const ACCESS_ID_PARAM: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Licenses,
    Machines,
    Launch,
    Kill,
}

pub struct CommandSpec {
    pub command: Command,
    pub name: &'static str,
    pub method: Method,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

pub static COMMANDS: [CommandSpec; 4] = [
    CommandSpec {
        command: Command::Licenses,
        name: "licenses",
        method: Method::Get,
        required: &[],
        optional: &[],
    },
    CommandSpec {
        command: Command::Machines,
        name: "machines",
        method: Method::Get,
        required: &[],
        optional: &[],
    },
    CommandSpec {
        command: Command::Launch,
        name: "launch",
        method: Method::Post,
        required: &["numMachines", "idleShutdown"],
        optional: &[
            "licenseType",
            "licenseId",
            "userPassword",
            "region",
            "machineType",
        ],
    },
    CommandSpec {
        command: Command::Kill,
        name: "kill",
        method: Method::Post,
        required: &["machineIds"],
        optional: &[],
    },
];

impl Command {
    pub fn spec(&self) -> &'static CommandSpec {
        COMMANDS
            .iter()
            .find(|spec| spec.command == *self)
            .expect("every command has an entry in COMMANDS")
    }

    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    pub fn method(&self) -> Method {
        self.spec().method
    }
}

impl FromStr for Command {
    type Err = crate::common::Error;

    fn from_str(name: &str) -> Result<Self> {
        COMMANDS
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.command)
            .context(UnknownCommandSnafu { name })
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl CommandSpec {
    pub fn accepts(&self, name: &str) -> bool {
        self.required
            .iter()
            .chain(self.optional.iter())
            .any(|known| *known == name)
    }

    /// Checks caller supplied parameters against the schema.
    /// The access id is injected by the client and must not be supplied.
    pub fn validate(&self, params: &Params) -> Result<()> {
        for name in params.names() {
            ensure!(
                self.accepts(name),
                ParameterSnafu {
                    command: self.name,
                    message: format!("unexpected parameter {name}"),
                }
            );
        }
        for name in self.required {
            ensure!(
                params.get(name).is_some(),
                ParameterSnafu {
                    command: self.name,
                    message: format!("missing parameter {name}"),
                }
            );
        }
        Ok(())
    }
}

/// Options for launching machines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub num_machines: u32,
    pub license_type: Option<String>,
    pub license_id: Option<String>,
    pub user_password: Option<String>,
    pub region: Option<String>,
    pub idle_shutdown: Option<u32>,
    pub machine_type: Option<String>,
}

impl Default for LaunchRequest {
    fn default() -> Self {
        Self {
            num_machines: DEFAULT_NUM_MACHINES,
            license_type: None,
            license_id: None,
            user_password: None,
            region: None,
            idle_shutdown: None,
            machine_type: None,
        }
    }
}

impl LaunchRequest {
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params
            .push("numMachines", self.num_machines.to_string())
            .push_opt("licenseType", self.license_type.as_deref())
            .push_opt("licenseId", self.license_id.as_deref())
            .push_opt("userPassword", self.user_password.as_deref())
            .push_opt("region", self.region.as_deref())
            .push(
                "idleShutdown",
                self.idle_shutdown
                    .unwrap_or(DEFAULT_IDLE_SHUTDOWN)
                    .to_string(),
            )
            .push_opt("machineType", self.machine_type.as_deref());
        params
    }
}

/// Machine ids are sent as one JSON array literal, e.g. `["a","b"]`.
pub fn kill_params<S: AsRef<str>>(machine_ids: &[S]) -> Result<Params> {
    ensure!(
        !machine_ids.is_empty(),
        ParameterSnafu {
            command: Command::Kill.name(),
            message: "at least one machine id is required",
        }
    );

    let ids: Vec<&str> = machine_ids.iter().map(AsRef::as_ref).collect();
    let literal = serde_json::to_string(&ids).map_err(|err| {
        ParameterSnafu {
            command: Command::Kill.name(),
            message: format!("failed to serialize machine ids: {err}"),
        }
        .build()
    })?;

    let mut params = Params::new();
    params.push("machineIds", literal);
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;

    #[test]
    fn table_binds_methods() {
        assert_eq!(Command::Licenses.method(), Method::Get);
        assert_eq!(Command::Machines.method(), Method::Get);
        assert_eq!(Command::Launch.method(), Method::Post);
        assert_eq!(Command::Kill.method(), Method::Post);
    }

    #[test]
    fn names_round_trip_through_table() {
        for spec in COMMANDS.iter() {
            assert_eq!(spec.name.parse::<Command>().unwrap(), spec.command);
            assert_eq!(spec.command.to_string(), spec.name);
        }
    }

    #[test]
    fn table_lists_each_command_once() {
        for command in [Command::Licenses, Command::Machines, Command::Launch, Command::Kill] {
            let entries = COMMANDS.iter().filter(|spec| spec.command == command).count();
            assert_eq!(entries, 1, "{command:?}");
        }
    }

    #[test]
    fn spec_lookup_matches_command() {
        for command in [Command::Licenses, Command::Machines, Command::Launch, Command::Kill] {
            assert_eq!(command.spec().command, command);
        }
    }

    #[test]
    fn unknown_command_is_rejected() {
        let err = "reboot".parse::<Command>().unwrap_err();
        assert!(matches!(err, Error::UnknownCommandError { name } if name == "reboot"));
    }

    #[test]
    fn launch_defaults_idle_shutdown_to_sixty() {
        let params = LaunchRequest::default().to_params();

        assert_eq!(params.get("idleShutdown"), Some("60"));
        assert_eq!(params.get("numMachines"), Some("1"));
        assert_eq!(params.len(), 2);
        Command::Launch.spec().validate(&params).unwrap();
    }

    #[test]
    fn launch_omits_absent_options_and_keeps_order() {
        let request = LaunchRequest {
            num_machines: 3,
            license_type: Some("light".into()),
            region: Some("us-east-1".into()),
            idle_shutdown: Some(15),
            machine_type: Some("c4.large".into()),
            ..Default::default()
        };
        let params = request.to_params();

        assert_eq!(
            params.names().collect::<Vec<_>>(),
            [
                "numMachines",
                "licenseType",
                "region",
                "idleShutdown",
                "machineType"
            ]
        );
        assert_eq!(params.get("idleShutdown"), Some("15"));
        assert_eq!(params.get("licenseId"), None);
        assert_eq!(params.get("userPassword"), None);
    }

    #[test]
    fn kill_serializes_ids_as_json_literal() {
        let params = kill_params(&["a", "b"]).unwrap();
        assert_eq!(params.get("machineIds"), Some(r#"["a","b"]"#));
        Command::Kill.spec().validate(&params).unwrap();
    }

    #[test]
    fn kill_requires_ids() {
        let err = kill_params::<&str>(&[]).unwrap_err();
        assert!(matches!(err, Error::ParameterError { command, .. } if command == "kill"));
    }

    #[test]
    fn validate_rejects_unknown_and_missing() {
        let mut params = Params::new();
        params.push("numMachines", "1").push("flavor", "large");
        assert!(Command::Launch.spec().validate(&params).is_err());

        let mut params = Params::new();
        params.push("numMachines", "1");
        assert!(Command::Launch.spec().validate(&params).is_err());

        let mut params = Params::new();
        params.push(ACCESS_ID_PARAM, "abc");
        assert!(Command::Licenses.spec().validate(&params).is_err());
    }
}
