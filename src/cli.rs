use clap::{
    crate_authors, crate_description, crate_version, error::ErrorKind, value_parser, Arg,
    ArgAction, ArgMatches, Command,
};
use pretty_env_logger::env_logger::Builder;
use std::env;
use std::io::Write;
use std::process::exit;

use instantcloud_rs::cloud::{self, InstantCloud, LaunchRequest, License, Machine};
use instantcloud_rs::common::Result;
use instantcloud_rs::Config;

fn journald_priority(level: log::Level) -> u8 {
    match level {
        log::Level::Error => 3,
        log::Level::Warn => 4,
        log::Level::Info => 6,
        log::Level::Debug | log::Level::Trace => 7,
    }
}

/// `RUST_LOG` takes precedence over `--verbose`. `RUST_LOG_STYLE=SYSTEMD`
/// prefixes lines with journald priorities instead of colouring them.
fn setup_logger(verbose: bool) {
    let mut builder = match env::var("RUST_LOG_STYLE").as_deref() {
        Ok("SYSTEMD") => {
            let mut builder = Builder::new();
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "<{}>{}: {}",
                    journald_priority(record.level()),
                    record.target(),
                    record.args()
                )
            });
            builder
        }
        _ => pretty_env_logger::formatted_builder(),
    };

    builder.filter_level(match verbose {
        true => log::LevelFilter::Debug,
        false => log::LevelFilter::Info,
    });
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn build_cli() -> Command {
    Command::new("InstantCloud")
        .about(format!(
            "{}\n{}",
            crate_description!(),
            "Credentials fall back to the IC_ACCESS_ID and IC_SECRET_KEY environment variables.",
        ))
        .arg(
            Arg::new("id")
                .short('I')
                .long("id")
                .global(true)
                .help("Set your access id"),
        )
        .arg(
            Arg::new("key")
                .short('K')
                .long("key")
                .global(true)
                .help("Set your secret key, or @path to read it from a file"),
        )
        .arg(
            Arg::new("url")
                .long("url")
                .global(true)
                .hide(true)
                .help("Override the API base URL"),
        )
        .arg(
            Arg::new("verbose")
                .action(ArgAction::SetTrue)
                .short('v')
                .long("verbose")
                .global(true)
                .help("Log request details"),
        )
        .subcommand(Command::new("licenses").about("Show the licenses associated with your account"))
        .subcommand(Command::new("machines").about("Show currently running machines"))
        .subcommand(
            Command::new("launch")
                .about("Launch a set of Gurobi machines")
                .arg(
                    Arg::new("nummachines")
                        .short('n')
                        .long("nummachines")
                        .value_parser(value_parser!(u32).range(1..))
                        .default_value("1")
                        .help("Number of machines to launch"),
                )
                .arg(
                    Arg::new("licensetype")
                        .short('l')
                        .long("licensetype")
                        .help("License type"),
                )
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .help("Password for the launched machines"),
                )
                .arg(
                    Arg::new("licenseid")
                        .short('i')
                        .long("licenseid")
                        .help("License id"),
                )
                .arg(
                    Arg::new("region")
                        .short('r')
                        .long("region")
                        .help("Region to launch in"),
                )
                .arg(
                    Arg::new("idleshutdown")
                        .short('s')
                        .long("idleshutdown")
                        .value_parser(value_parser!(u32))
                        .help("Idle minutes before shutdown [default: 60]"),
                )
                .arg(
                    Arg::new("machinetype")
                        .short('m')
                        .long("machinetype")
                        .help("Machine type"),
                ),
        )
        .subcommand(
            Command::new("kill")
                .about("Kill a set of Gurobi machines")
                .arg(
                    Arg::new("machine_ids")
                        .action(ArgAction::Append)
                        .num_args(1..)
                        .required(true)
                        .value_name("MACHINE_ID")
                        .help("Machines to kill"),
                ),
        )
        .allow_external_subcommands(true)
        .version(crate_version!())
        .author(crate_authors!("\n"))
}

fn launch_request(args: &ArgMatches) -> LaunchRequest {
    LaunchRequest {
        num_machines: args
            .get_one::<u32>("nummachines")
            .copied()
            .unwrap_or(cloud::DEFAULT_NUM_MACHINES),
        license_type: args.get_one::<String>("licensetype").cloned(),
        license_id: args.get_one::<String>("licenseid").cloned(),
        user_password: args.get_one::<String>("password").cloned(),
        region: args.get_one::<String>("region").cloned(),
        idle_shutdown: args.get_one::<u32>("idleshutdown").copied(),
        machine_type: args.get_one::<String>("machinetype").cloned(),
    }
}

fn or_blank(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn print_licenses(licenses: &[License]) {
    if !licenses.is_empty() {
        println!("License Credit  Rate Plan       Expiration");
    }
    for license in licenses {
        println!(
            "{}\t{}\t{}\t{}",
            or_blank(&license.license_id),
            or_blank(&license.credit),
            or_blank(&license.rate_plan),
            or_blank(&license.expiration),
        );
    }
}

fn print_machines(machines: &[Machine]) {
    for machine in machines {
        println!("Machine name: {}", or_blank(&machine.dns_name));
        println!("\tlicense type: {}", or_blank(&machine.license_type));
        println!("\tstate: {}", or_blank(&machine.state));
        println!("\tmachine type: {}", or_blank(&machine.machine_type));
        println!("\tregion: {}", or_blank(&machine.region));
        println!(
            "\tidle shutdown: {}",
            machine
                .idle_shutdown
                .map(|minutes| minutes.to_string())
                .unwrap_or_default()
        );
        println!("\tuser password: {}", or_blank(&machine.user_password));
        println!("\tcreate time: {}", or_blank(&machine.create_time));
        println!("\tlicense id: {}", or_blank(&machine.license_id));
        println!("\tmachine id: {}", or_blank(&machine.machine_id));
    }
}

fn run(client: &InstantCloud, command: cloud::Command, args: &ArgMatches) -> Result<()> {
    match command {
        cloud::Command::Licenses => print_licenses(&client.licenses()?),
        cloud::Command::Machines => print_machines(&client.machines()?),
        cloud::Command::Launch => {
            let machines = client.launch(&launch_request(args))?;
            println!("Machines Launched");
            print_machines(&machines);
        }
        cloud::Command::Kill => {
            let machine_ids: Vec<String> = args
                .get_many::<String>("machine_ids")
                .map(|ids| ids.cloned().collect())
                .unwrap_or_default();
            let machines = client.kill(&machine_ids)?;
            println!("Machines Killed");
            print_machines(&machines);
        }
    }
    Ok(())
}

/// Unknown names reach here as external subcommands and are rejected by the
/// command table.
fn selected_command(args: &ArgMatches) -> Result<Option<(cloud::Command, &ArgMatches)>> {
    match args.subcommand() {
        Some((name, sub_args)) => Ok(Some((name.parse()?, sub_args))),
        None => Ok(None),
    }
}

pub(crate) fn main() {
    let mut cli = build_cli();

    let args = match cli.try_get_matches_from_mut(env::args_os()) {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            let _ = err.print();
            exit(1);
        }
    };

    setup_logger(args.get_flag("verbose"));

    let (command, sub_args) = match selected_command(&args) {
        Ok(Some(selected)) => selected,
        Ok(None) => {
            println!("Missing command");
            let _ = cli.print_help();
            exit(1);
        }
        Err(err) => {
            println!("{err}");
            exit(1);
        }
    };

    let mut settings = Config::with_credentials(
        args.get_one::<String>("id").cloned(),
        args.get_one::<String>("key").cloned(),
    );
    settings.base_url = args.get_one::<String>("url").cloned();

    let config = match settings
        .populate_from_env()
        .and_then(Config::into_client_config)
    {
        Ok(c) => c,
        Err(err) => {
            println!("{err}");
            exit(1);
        }
    };

    tracing::debug!(command = command.name(), config = ?config, "Configuration loaded");

    let client = InstantCloud::new(config);
    if let Err(err) = run(&client, command, sub_args) {
        println!("{err}");
        exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ArgMatches {
        build_cli()
            .try_get_matches_from(args.iter().copied())
            .unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn launch_options_map_to_request() {
        let args = parse(&[
            "instantcloud", "launch", "-n", "2", "-l", "light", "-r", "us-east-1", "-s", "30",
        ]);
        let (name, sub_args) = args.subcommand().unwrap();
        let request = launch_request(sub_args);

        assert_eq!(name, "launch");
        assert_eq!(request.num_machines, 2);
        assert_eq!(request.license_type.as_deref(), Some("light"));
        assert_eq!(request.region.as_deref(), Some("us-east-1"));
        assert_eq!(request.idle_shutdown, Some(30));
        assert_eq!(request.user_password, None);
    }

    #[test]
    fn launch_without_options_sends_defaults() {
        let args = parse(&["instantcloud", "launch"]);
        let (_, sub_args) = args.subcommand().unwrap();
        let params = launch_request(sub_args).to_params();

        assert_eq!(params.get("numMachines"), Some("1"));
        assert_eq!(params.get("idleShutdown"), Some("60"));
    }

    #[test]
    fn credentials_are_global() {
        let args = parse(&["instantcloud", "machines", "--id", "abc", "-K", "key"]);

        assert_eq!(args.get_one::<String>("id").map(String::as_str), Some("abc"));
        assert_eq!(args.get_one::<String>("key").map(String::as_str), Some("key"));
    }

    #[test]
    fn kill_collects_machine_ids() {
        let args = parse(&["instantcloud", "kill", "m1", "m2"]);
        let (_, sub_args) = args.subcommand().unwrap();
        let ids: Vec<&String> = sub_args.get_many::<String>("machine_ids").unwrap().collect();

        assert_eq!(ids, ["m1", "m2"]);
    }

    #[test]
    fn kill_requires_machine_ids() {
        assert!(build_cli()
            .try_get_matches_from(["instantcloud", "kill"])
            .is_err());
    }

    #[test]
    fn unknown_command_is_rejected_by_the_table() {
        let args = parse(&["instantcloud", "reboot", "now"]);
        let err = selected_command(&args).unwrap_err();

        assert_eq!(err.to_string(), "Unrecognized command: reboot");
    }

    #[test]
    fn known_command_is_selected() {
        let args = parse(&["instantcloud", "-I", "abc", "licenses"]);
        let (command, _) = selected_command(&args).unwrap().unwrap();

        assert_eq!(command, cloud::Command::Licenses);
    }

    #[test]
    fn missing_command_selects_nothing() {
        let args = parse(&["instantcloud", "-I", "abc"]);
        assert!(selected_command(&args).unwrap().is_none());
    }

    #[test]
    fn journald_priorities_follow_syslog_levels() {
        assert_eq!(journald_priority(log::Level::Error), 3);
        assert_eq!(journald_priority(log::Level::Warn), 4);
        assert_eq!(journald_priority(log::Level::Info), 6);
        assert_eq!(journald_priority(log::Level::Trace), 7);
    }
}
