//! devctl - Command-line interface for device_control
//!
//! Usage:
//!     devctl [OPTIONS] <COMMAND>
//!
//! Environment Variables:
//!     DEVICE_CONTROL_SERIAL: ADB device serial for multi-device setups
//!     DEVICE_CONTROL_IDLE_TIMEOUT: Idle-wait bound in seconds (default: 10)
//!     DEVICE_CONTROL_IDLE_POLL_INTERVAL: Idle poll interval in seconds (default: 0.2)
//!     DEVICE_CONTROL_SETTLE_SAMPLES: Consecutive idle polls required (default: 2)
//!     DEVICE_CONTROL_COMMAND_TIMEOUT: Per-command bound in seconds (default: 10)
//!     RUST_LOG: Log filter, overrides --log-level

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use device_control::{
    ActionHandler, AdbConnection, DeviceAction, DeviceHandle, RawParams, Rotation, TimingConfig,
};
use tracing::debug;

/// Device control - rotation, power and input injection over ADB
#[derive(Parser, Debug)]
#[command(name = "devctl")]
#[command(about = "Device control - rotation, power and input injection over ADB")]
#[command(after_help = r#"Examples:
    # List attached devices
    devctl devices

    # Read the battery level as JSON
    devctl --json battery

    # Rotate a specific device and wait for it to settle
    devctl -s emulator-5554 set-rotation left

    # Connect to a remote device, then tap
    devctl --connect 192.168.1.100:5555 click 50 100

    # Run an instrumentation-style action with extras
    devctl run testDrag -e startX 100 -e startY 500 -e endX 100 -e endY 200 -e steps 20
"#)]
struct Cli {
    /// ADB device serial
    #[arg(short = 's', long, env = "DEVICE_CONTROL_SERIAL")]
    serial: Option<String>,

    /// Connect to remote device first (e.g., 192.168.1.100:5555)
    #[arg(short = 'c', long, value_name = "ADDRESS")]
    connect: Option<String>,

    /// Override the idle-wait bound in seconds
    #[arg(long, value_name = "SECS", value_parser = parse_seconds)]
    idle_timeout: Option<f64>,

    /// Do not wait for the device to settle after mutating commands
    #[arg(long)]
    no_wait: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List attached devices
    Devices,
    /// Disconnect a remote device, or every remote device
    Disconnect { address: Option<String> },
    #[command(flatten)]
    Device(DeviceCommand),
}

/// Commands that run against one device
#[derive(Subcommand, Debug)]
enum DeviceCommand {
    /// Print the current rotation
    Rotation,
    /// Rotate to natural, left, right or upside-down
    SetRotation { rotation: Rotation },
    /// Apply the opposite-rotation mapping to the current rotation
    RotateOpposite,
    /// Freeze rotation
    Lock,
    /// Release rotation
    Unlock,
    /// Print the rotation lock state
    LockStatus,
    /// Print whether the screen is on
    Power,
    /// Wake the device
    PowerOn,
    /// Put the device to sleep
    PowerOff,
    /// Invert the power state
    TogglePower,
    /// Print the battery level in percent
    Battery,
    /// Print the Wi-Fi state
    Wifi,
    /// Print the cellular data state
    Cellular,
    /// Press the back button
    Back,
    /// Press the home button
    Home,
    /// Tap at coordinates
    Click { x: i32, y: i32 },
    /// Drag between two points
    Drag {
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        steps: i32,
    },
    /// Wait until the device is idle
    WaitIdle,
    /// Run a named action (e.g. testClick) with `-e key value` extras
    Run {
        method: String,
        #[arg(short = 'e', num_args = 2, value_names = ["KEY", "VALUE"])]
        extras: Vec<String>,
    },
}

impl DeviceCommand {
    fn mutates(&self) -> bool {
        matches!(
            self,
            Self::SetRotation { .. }
                | Self::Lock
                | Self::Unlock
                | Self::PowerOn
                | Self::PowerOff
                | Self::TogglePower
        )
    }
}

/// Install the tracing subscriber
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse a finite, non-negative number of seconds
fn parse_seconds(s: &str) -> std::result::Result<f64, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("`{}` is not a number", s))?;
    if secs.is_finite() && secs >= 0.0 {
        Ok(secs)
    } else {
        Err(format!("`{}` is not a finite, non-negative number of seconds", s))
    }
}

/// Fold `-e key value` pairs into named parameters
fn parse_extras(extras: &[String]) -> Result<RawParams> {
    if extras.len() % 2 != 0 {
        bail!("Extras must come in KEY VALUE pairs");
    }
    Ok(extras
        .chunks(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect())
}

fn print_value(json: bool, key: &str, value: serde_json::Value) {
    if json {
        let mut object = serde_json::Map::new();
        object.insert(key.to_string(), value);
        println!("{}", serde_json::Value::Object(object));
    } else {
        match value {
            serde_json::Value::String(s) => println!("{}", s),
            other => println!("{}", other),
        }
    }
}

async fn list_devices(json: bool) -> Result<()> {
    let devices = AdbConnection::new().list_devices().await?;

    if json {
        let list: Vec<_> = devices
            .iter()
            .map(|d| {
                serde_json::json!({
                    "serial": d.serial,
                    "status": d.status,
                    "model": d.model,
                })
            })
            .collect();
        println!("{}", serde_json::Value::Array(list));
        return Ok(());
    }

    if devices.is_empty() {
        println!("No devices connected.");
        return Ok(());
    }

    println!("Connected devices:");
    println!("{}", "-".repeat(60));
    for device in devices {
        let marker = if device.is_online() { "\u{2713}" } else { "\u{2717}" };
        let model = device.model.as_deref().unwrap_or("unknown");
        println!(
            "  {} {:<30} {:<12} {}",
            marker, device.serial, device.status, model
        );
    }
    Ok(())
}

async fn disconnect(address: Option<&str>) -> Result<()> {
    let message = AdbConnection::new().disconnect(address).await?;
    println!("{}", message);
    Ok(())
}

async fn run(args: &Cli, command: &DeviceCommand, device: &DeviceHandle) -> Result<()> {
    let json = args.json;

    match command {
        DeviceCommand::Rotation => {
            let rotation = device.rotation().await?;
            print_value(json, "rotation", serde_json::to_value(rotation)?);
        }
        DeviceCommand::SetRotation { rotation } => {
            device.set_rotation(*rotation).await?;
        }
        DeviceCommand::RotateOpposite => {
            let changed = device.rotate_opposite().await?;
            print_value(json, "changed", changed.into());
        }
        DeviceCommand::Lock => device.set_rotation_lock(true).await?,
        DeviceCommand::Unlock => device.set_rotation_lock(false).await?,
        DeviceCommand::LockStatus => {
            let lock = device.rotation_lock().await?;
            print_value(json, "rotation_lock", serde_json::to_value(lock)?);
        }
        DeviceCommand::Power => {
            let on = device.is_powered_on().await?;
            print_value(json, "screen_on", on.into());
        }
        DeviceCommand::PowerOn => device.set_power(true).await?,
        DeviceCommand::PowerOff => device.set_power(false).await?,
        DeviceCommand::TogglePower => {
            let on = device.toggle_power().await?;
            print_value(json, "screen_on", on.into());
        }
        DeviceCommand::Battery => {
            let level = device.battery_level().await?;
            print_value(json, "battery_level", level.into());
        }
        DeviceCommand::Wifi => {
            let wifi = device.wifi_status().await?;
            print_value(json, "wifi", serde_json::to_value(wifi)?);
        }
        DeviceCommand::Cellular => {
            let data = device.data_connection().await?;
            print_value(json, "data_connection", serde_json::to_value(data)?);
        }
        DeviceCommand::Back => print_value(json, "dispatched", device.press_back().await?.into()),
        DeviceCommand::Home => print_value(json, "dispatched", device.press_home().await?.into()),
        DeviceCommand::Click { x, y } => {
            print_value(json, "dispatched", device.click(*x, *y).await?.into())
        }
        DeviceCommand::Drag {
            x0,
            y0,
            x1,
            y1,
            steps,
        } => {
            let dispatched = device.drag(*x0, *y0, *x1, *y1, *steps).await?;
            print_value(json, "dispatched", dispatched.into());
        }
        DeviceCommand::WaitIdle => device.wait_for_idle().await?,
        DeviceCommand::Run { method, extras } => {
            let action = DeviceAction::parse(method, &parse_extras(extras)?)?;
            let result = ActionHandler::new(device).execute(&action).await?;
            if json {
                println!("{}", serde_json::to_string(&result)?);
            } else {
                let status = if result.success { "\u{2713}" } else { "\u{2717}" };
                println!(
                    "{} {} (changed: {}){}",
                    status,
                    action.name(),
                    result.changed,
                    result
                        .message
                        .map(|m| format!(" - {}", m))
                        .unwrap_or_default()
                );
                if !result.success {
                    std::process::exit(1);
                }
            }
        }
    }

    if command.mutates() && !args.no_wait {
        debug!("Waiting for device to settle");
        device.wait_for_idle().await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_logging(&args.log_level);

    if which::which("adb").is_err() {
        bail!(
            "adb is not installed or not in PATH.\n  \
             - macOS: brew install android-platform-tools\n  \
             - Linux: sudo apt install android-tools-adb"
        );
    }

    let command = match &args.command {
        Command::Devices => return list_devices(args.json).await,
        Command::Disconnect { address } => return disconnect(address.as_deref()).await,
        Command::Device(command) => command,
    };

    let connection = AdbConnection::new();
    if let Some(addr) = &args.connect {
        let message = connection
            .connect(addr)
            .await
            .with_context(|| format!("Failed to connect to {}", addr))?;
        debug!("{}", message);
    }

    let serial = args.serial.clone().or_else(|| {
        args.connect.as_ref().map(|addr| {
            if addr.contains(':') {
                addr.clone()
            } else {
                format!("{}:5555", addr)
            }
        })
    });
    if !connection.is_connected(serial.as_deref()).await? {
        return Err(anyhow!(
            "No online device{}",
            serial.map(|s| format!(" with serial {}", s)).unwrap_or_default()
        ));
    }

    let mut config = TimingConfig::new();
    if let Some(secs) = args.idle_timeout {
        config = config.with_idle_timeout(secs);
    }

    let device = DeviceHandle::adb(serial, config)?;
    run(&args, command, &device).await
}
