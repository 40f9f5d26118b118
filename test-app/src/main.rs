// provideo test application -- CLI tool for exercising ProVideo devices
// against real hardware or a mock transport.
//
// Usage:
//   provideo-test-app ports
//   provideo-test-app list
//   provideo-test-app --model xbow --port /dev/ttyUSB0 info
//   provideo-test-app --model xbow --port /dev/ttyUSB0 gain get red
//   provideo-test-app --model xbow --port /dev/ttyUSB0 gain set red 600
//   provideo-test-app --model xbow --port /dev/ttyUSB0 --timeout 2000 weights
//   provideo-test-app --model condor4k --port /dev/ttyUSB0 devices
//   provideo-test-app --model xbow --port /dev/ttyUSB0 mode set 3
//   provideo-test-app fpnc show table.bin --width 1920 --samples 16 --column 10
//
// Set RUST_LOG=provideo_protocol=trace to see every line on the wire.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use provideo::models;
use provideo::serial::available_ports;
use provideo::{ColorComponent, FpncData, ProVideoBuilder, ProVideoDevice};
use provideo_test_harness::MockTransport;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// provideo test application -- exercises ProVideo devices from the command line.
#[derive(Parser)]
#[command(name = "provideo-test-app", version, about)]
struct Cli {
    /// Device family: xbow, condor4k, cooper.
    #[arg(long, default_value = "xbow")]
    model: String,

    /// Serial port path (e.g. /dev/ttyUSB0, COM3).
    /// Required for device commands unless --mock is used.
    #[arg(long)]
    port: Option<String>,

    /// Override the default baud rate for this model.
    #[arg(long)]
    baud: Option<u32>,

    /// Timeout of a single command attempt, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    timeout: u64,

    /// How often a timed-out command is repeated.
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Use a mock transport instead of a real serial port.
    /// Useful for verifying CLI parsing and builder wiring without hardware.
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the serial ports present on this host.
    Ports,

    /// List the supported device families.
    List,

    /// Print device identity, state and capabilities.
    Info,

    /// Colour channel gain.
    Gain {
        #[command(subcommand)]
        action: GainAction,
    },

    /// Print the 5x5 auto exposure weight grid.
    Weights,

    /// List the devices on the RS485 chain.
    Devices,

    /// Video mode.
    Mode {
        #[command(subcommand)]
        action: ModeAction,
    },

    /// Inspect FPNC data files.
    Fpnc {
        #[command(subcommand)]
        action: FpncAction,
    },
}

#[derive(Subcommand)]
enum GainAction {
    /// Read the gain of one channel.
    Get {
        /// Channel: red, green, blue.
        component: ColorComponent,
    },
    /// Set the gain of one channel.
    Set {
        /// Channel: red, green, blue.
        component: ColorComponent,
        gain: u32,
    },
}

#[derive(Subcommand)]
enum ModeAction {
    /// Read the current video mode.
    Get,
    /// Switch the video mode. The device may take several seconds.
    Set { mode: u32 },
}

#[derive(Subcommand)]
enum FpncAction {
    /// Decode one column of an FPNC data file.
    Show {
        /// Path to the binary data file.
        file: String,

        /// Sensor width in pixels.
        #[arg(long, default_value_t = 1920)]
        width: usize,

        /// Samples per column.
        #[arg(long, default_value_t = 16)]
        samples: usize,

        /// Pixel column to decode.
        #[arg(long, default_value_t = 0)]
        column: usize,
    },
}

// ---------------------------------------------------------------------------
// Device construction
// ---------------------------------------------------------------------------

async fn create_device(cli: &Cli) -> Result<ProVideoDevice> {
    let Some(model) = models::by_name(&cli.model) else {
        let known: Vec<&str> = models::all_models().iter().map(|m| m.name).collect();
        bail!(
            "unknown model '{}'. Supported models: {}",
            cli.model,
            known.join(", ")
        );
    };

    let name = model.name;
    let mut builder = ProVideoBuilder::new(model)
        .command_timeout(Duration::from_millis(cli.timeout))
        .retries(cli.retries);
    if let Some(baud) = cli.baud {
        builder = builder.baud_rate(baud);
    }

    if cli.mock {
        let device = builder
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .context("failed to build device with mock transport")?;
        println!("Connected (mock transport) -- {name}");
        return Ok(device);
    }

    let port = cli
        .port
        .as_deref()
        .context("--port is required when not using --mock")?;
    let device = builder
        .serial_port(port)
        .build()
        .await
        .with_context(|| format!("failed to open {port}"))?;
    debug!(port, model = name, "device ready");
    Ok(device)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_ports() -> Result<()> {
    let ports = available_ports()?;
    if ports.is_empty() {
        println!("No serial ports found.");
        return Ok(());
    }
    for port in ports {
        match (port.usb_id, port.product) {
            (Some((vid, pid)), product) => println!(
                "{:<20} USB {vid:04x}:{pid:04x} {}",
                port.name,
                product.unwrap_or_default()
            ),
            (None, _) => println!("{}", port.name),
        }
    }
    Ok(())
}

fn cmd_list() -> Result<()> {
    println!("{:<10} {:>8}  {:<8} {:<8} FPNC", "Model", "Baud", "AEC/AWB", "Playback");
    for model in provideo::supported_models() {
        let caps = &model.capabilities;
        let fpnc = caps
            .fpnc
            .map(|g| format!("{} x {}", g.width, g.no_samples))
            .unwrap_or_else(|| "--".into());
        println!(
            "{:<10} {:>8}  {:<8} {:<8} {fpnc}",
            model.name, model.default_baud_rate, caps.has_auto, caps.has_playback
        );
    }
    Ok(())
}

async fn cmd_info(device: &ProVideoDevice) -> Result<()> {
    let system = device.system()?;
    let caps = device.capabilities();

    println!("Device Information");
    println!("  Model:          {}", device.info().model_name);
    println!("  Device id:      0x{:08x}", system.device_id().await?);
    println!("  Runtime:        {} h", system.runtime().await?);
    let temps = system.temperatures().await?;
    println!("  Temperature:    board {} C, sensor {} C", temps.board, temps.sensor);
    println!("  Fan speed:      {} %", system.fan_speed().await?);
    println!();
    println!("Capabilities");
    println!("  AEC/AWB:        {}", caps.has_auto);
    println!("  Playback:       {}", caps.has_playback);
    println!("  RS485 chain:    {}", caps.has_discovery);
    match caps.fpnc {
        Some(g) => println!("  FPNC:           {} x {}", g.width, g.no_samples),
        None => println!("  FPNC:           --"),
    }
    Ok(())
}

async fn cmd_gain_get(device: &ProVideoDevice, component: ColorComponent) -> Result<()> {
    let gain = device.isp()?.gain(component).await?;
    println!("{component} gain: {gain}");
    Ok(())
}

async fn cmd_gain_set(device: &ProVideoDevice, component: ColorComponent, gain: u32) -> Result<()> {
    device.isp()?.set_gain(component, gain).await?;
    println!("{component} gain set to {gain}");
    Ok(())
}

async fn cmd_weights(device: &ProVideoDevice) -> Result<()> {
    let weights = device.auto()?.aec_weights().await?;
    for row in weights.chunks(5) {
        let line: Vec<String> = row.iter().map(|w| format!("{w:>3}")).collect();
        println!("{}", line.join(""));
    }
    Ok(())
}

async fn cmd_devices(device: &ProVideoDevice) -> Result<()> {
    let entries = device.system()?.device_list().await?;
    if entries.is_empty() {
        println!("No devices found.");
        return Ok(());
    }
    println!("{:>3}  {:>7}  {:>6}  Serial", "#", "Address", "Type");
    for e in entries {
        println!(
            "{:>3}  {:>7}  {:>6}  {}",
            e.index, e.address, e.device_type, e.serial
        );
    }
    Ok(())
}

fn cmd_fpnc_show(file: &str, width: usize, samples: usize, column: usize) -> Result<()> {
    let data = FpncData::load(file, width, samples)
        .with_context(|| format!("failed to load {file}"))?;
    if column >= width {
        bail!("column {column} is outside a sensor of width {width}");
    }
    println!("Column {column} of {file}:");
    let values: Vec<String> = data
        .correction_column(column)
        .iter()
        .map(|v| v.to_string())
        .collect();
    println!("  correction:     {}", values.join(" "));
    let calibration = data.calibration_column(column)?;
    let values: Vec<String> = calibration.iter().map(|v| format!("0x{v:08x}")).collect();
    println!("  registers:      {}", values.join(" "));
    Ok(())
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that need no device connection.
    match &cli.command {
        Command::Ports => return cmd_ports(),
        Command::List => return cmd_list(),
        Command::Fpnc {
            action:
                FpncAction::Show {
                    file,
                    width,
                    samples,
                    column,
                },
        } => return cmd_fpnc_show(file, *width, *samples, *column),
        _ => {}
    }

    let device = create_device(&cli).await?;

    let result = match &cli.command {
        Command::Info => cmd_info(&device).await,
        Command::Gain { action } => match action {
            GainAction::Get { component } => cmd_gain_get(&device, *component).await,
            GainAction::Set { component, gain } => {
                cmd_gain_set(&device, *component, *gain).await
            }
        },
        Command::Weights => cmd_weights(&device).await,
        Command::Devices => cmd_devices(&device).await,
        Command::Mode { action } => match action {
            ModeAction::Get => {
                let mode = device.chain()?.video_mode().await?;
                println!("Video mode: {mode}");
                Ok(())
            }
            ModeAction::Set { mode } => {
                device.chain()?.set_video_mode(*mode).await?;
                println!("Video mode set to {mode}");
                Ok(())
            }
        },
        Command::Ports | Command::List | Command::Fpnc { .. } => {
            unreachable!("handled before connecting")
        }
    };

    device.close().await.ok();
    result
}
