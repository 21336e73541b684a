// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Showcase Control CLI
//!
//! CLI tool for interacting with showcase-environment.
//!
//! Usage:
//!   showcase-ctl <command> [options]
//!
//! Commands:
//!   health                        Check environment health
//!   start --project <id> --image <image> --port <port> [--env K=V]... [--command <cmd>]
//!   stop <instance_id>
//!   status <instance_id>
//!   wait <instance_id> [--status <status>]
//!   list [--project <id>]

use showcase_management_sdk::{InstanceStatus, ManagementClient, SdkConfig, StartInstanceOptions};
use std::process::ExitCode;
use std::time::Duration;

fn print_usage() {
    eprintln!(
        r#"Usage: showcase-ctl <command> [options]

Interact with showcase-environment.

COMMANDS:
    health                          Check environment health
    start                           Start a demo instance
    stop <instance_id>              Stop an instance
    status <instance_id>            Get instance status
    wait <instance_id>              Wait for an instance to reach a status
    list                            List instances

START OPTIONS:
    --project <id>                  Project ID (required)
    --image <image>                 Image reference (required)
    --port <port>                   Container port (required)
    --env <KEY=VALUE>               Environment variable (repeatable)
    --command <cmd>                 Command override

WAIT OPTIONS:
    --status <status>               Target status (default: running)
    --poll <ms>                     Poll interval in ms (default: 500)
    --timeout <ms>                  Give up after this many ms (default: 30000)

LIST OPTIONS:
    --project <id>                  Filter by project ID

ENVIRONMENT:
    SHOWCASE_ENVIRONMENT_URL        Gateway URL (default: http://127.0.0.1:8080)
    SHOWCASE_REQUEST_TIMEOUT_MS     Request timeout (default: 30000)

EXAMPLES:
    # Start a demo and wait until it is reachable
    showcase-ctl start --project demo-1 --image ghcr.io/acme/demo:latest --port 8000
    showcase-ctl wait demo-1-3f2a...

    # Stop it again
    showcase-ctl stop demo-1-3f2a...
"#
    );
}

#[derive(Debug, PartialEq)]
enum Command {
    Health,
    Start {
        project_id: String,
        image: String,
        port: u16,
        env: Vec<(String, String)>,
        command: Option<String>,
    },
    Stop {
        instance_id: String,
    },
    Status {
        instance_id: String,
    },
    Wait {
        instance_id: String,
        target: InstanceStatus,
        poll_ms: u64,
        timeout_ms: u64,
    },
    List {
        project_id: Option<String>,
    },
}

fn parse_args() -> Result<Command, String> {
    let args: Vec<String> = std::env::args().collect();
    parse_args_from_vec(&args)
}

fn parse_args_from_vec(args: &[String]) -> Result<Command, String> {
    if args.len() < 2 {
        return Err("No command specified".to_string());
    }

    match args[1].as_str() {
        "help" | "--help" | "-h" => {
            print_usage();
            std::process::exit(0);
        }
        "health" => Ok(Command::Health),
        "start" => {
            let mut project_id: Option<String> = None;
            let mut image: Option<String> = None;
            let mut port: Option<u16> = None;
            let mut env = Vec::new();
            let mut command: Option<String> = None;

            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--project" => {
                        i += 1;
                        project_id = Some(args.get(i).ok_or("--project requires an ID")?.clone());
                    }
                    "--image" => {
                        i += 1;
                        image = Some(args.get(i).ok_or("--image requires a value")?.clone());
                    }
                    "--port" => {
                        i += 1;
                        port = Some(
                            args.get(i)
                                .ok_or("--port requires a number")?
                                .parse()
                                .map_err(|_| "Invalid port")?,
                        );
                    }
                    "--env" => {
                        i += 1;
                        let pair = args.get(i).ok_or("--env requires KEY=VALUE")?;
                        let (key, value) = pair
                            .split_once('=')
                            .ok_or_else(|| format!("Invalid --env value: {}", pair))?;
                        env.push((key.to_string(), value.to_string()));
                    }
                    "--command" => {
                        i += 1;
                        command = Some(args.get(i).ok_or("--command requires a value")?.clone());
                    }
                    arg => return Err(format!("Unknown argument: {}", arg)),
                }
                i += 1;
            }

            Ok(Command::Start {
                project_id: project_id.ok_or("--project is required")?,
                image: image.ok_or("--image is required")?,
                port: port.ok_or("--port is required")?,
                env,
                command,
            })
        }
        "stop" => {
            let instance_id = args.get(2).ok_or("Instance ID required")?.clone();
            Ok(Command::Stop { instance_id })
        }
        "status" => {
            let instance_id = args.get(2).ok_or("Instance ID required")?.clone();
            Ok(Command::Status { instance_id })
        }
        "wait" => {
            let instance_id = args.get(2).ok_or("Instance ID required")?.clone();
            let mut target = InstanceStatus::Running;
            let mut poll_ms: u64 = 500;
            let mut timeout_ms: u64 = 30_000;

            let mut i = 3;
            while i < args.len() {
                match args[i].as_str() {
                    "--status" => {
                        i += 1;
                        target = args.get(i).ok_or("--status requires a value")?.parse()?;
                    }
                    "--poll" => {
                        i += 1;
                        poll_ms = args
                            .get(i)
                            .ok_or("--poll requires a number")?
                            .parse()
                            .map_err(|_| "Invalid poll interval")?;
                    }
                    "--timeout" => {
                        i += 1;
                        timeout_ms = args
                            .get(i)
                            .ok_or("--timeout requires a number")?
                            .parse()
                            .map_err(|_| "Invalid timeout")?;
                    }
                    arg => return Err(format!("Unknown argument: {}", arg)),
                }
                i += 1;
            }

            Ok(Command::Wait {
                instance_id,
                target,
                poll_ms,
                timeout_ms,
            })
        }
        "list" => {
            let mut project_id: Option<String> = None;

            let mut i = 2;
            while i < args.len() {
                match args[i].as_str() {
                    "--project" => {
                        i += 1;
                        project_id = Some(args.get(i).ok_or("--project requires an ID")?.clone());
                    }
                    arg => return Err(format!("Unknown argument: {}", arg)),
                }
                i += 1;
            }

            Ok(Command::List { project_id })
        }
        cmd => Err(format!("Unknown command: {}", cmd)),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cmd = match parse_args() {
        Ok(cmd) => cmd,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let config = match SdkConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let client = match ManagementClient::new(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match execute_command(&client, cmd).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).map_err(|e| e.to_string())?
    );
    Ok(())
}

async fn execute_command(client: &ManagementClient, cmd: Command) -> Result<(), String> {
    match cmd {
        Command::Health => {
            let health = client.health_check().await.map_err(|e| e.to_string())?;
            print_json(&health)?;
        }

        Command::Start {
            project_id,
            image,
            port,
            env,
            command,
        } => {
            let mut options = StartInstanceOptions::new(&project_id, &image, port);
            for (key, value) in env {
                options = options.with_env_var(key, value);
            }
            if let Some(command) = command {
                options = options.with_command(command);
            }

            let instance = client
                .start_instance(options)
                .await
                .map_err(|e| e.to_string())?;
            println!("{}", instance.id);
        }

        Command::Stop { instance_id } => {
            let stopped = client
                .stop_instance(&instance_id)
                .await
                .map_err(|e| e.to_string())?;
            if !stopped {
                return Err(format!("Instance not found: {}", instance_id));
            }
            println!("Stopping: {}", instance_id);
        }

        Command::Status { instance_id } => {
            match client
                .get_instance(&instance_id)
                .await
                .map_err(|e| e.to_string())?
            {
                Some(instance) => print_json(&instance)?,
                None => return Err(format!("Instance not found: {}", instance_id)),
            }
        }

        Command::Wait {
            instance_id,
            target,
            poll_ms,
            timeout_ms,
        } => {
            let instance = client
                .wait_for_status(
                    &instance_id,
                    target,
                    Duration::from_millis(poll_ms),
                    Duration::from_millis(timeout_ms),
                )
                .await
                .map_err(|e| e.to_string())?;
            print_json(&instance)?;
            if instance.status != target {
                return Err(format!("Instance ended in status {}", instance.status));
            }
        }

        Command::List { project_id } => {
            let instances = client
                .list_instances(project_id.as_deref())
                .await
                .map_err(|e| e.to_string())?;
            print_json(&instances)?;
        }
    }

    Ok(())
}
