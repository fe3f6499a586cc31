//! Command-line controller for MiLight v6 bridges.
//!
//! Run with: milight <DEVICE> <ZONE> <COMMAND> [ARGS...]

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use log::{debug, error};
use milight_rs::{Bridge, BridgeConfig, Command, DeviceType, Error, Zone, map_command, runtime};

const COMMANDS_HELP: &str = "\
Commands:
  ON
  OFF
  DIMUP                        Only for device type 1
  DIMDOWN                      Only for device type 1
  NIGHT                        Nightlight for device types 1 & 8
  DISCO[1-9]
  DISCOFASTER
  DISCOSLOWER
  WHITE                        For device types 0 & 8
  TEMP (0-100)                 White temperature for device type 8
  HUE (0-255)                  For device type 8
  SATUR (0-100)                For device type 8
  BRIGHT (0-100)
  SPECTRUM                     Animates lamps through the full color spectrum
  COLOR \"(hex color)\"          e.g. \"#ff0000\" for red ('#' not needed)
  COLOR (red) (green) (blue)   e.g. 255 0 0 for red";

#[derive(Parser)]
#[command(name = "milight")]
#[command(about = "Control MiLight bulbs through a v6 bridge", long_about = None)]
#[command(after_help = COMMANDS_HELP)]
struct Cli {
    /// Device type (0, 1, 7 or 8)
    #[arg(allow_negative_numbers = true)]
    device: i64,

    /// Zone (0-4, 0 addresses all zones)
    #[arg(allow_negative_numbers = true)]
    zone: i64,

    /// Command name, case-insensitive
    command: String,

    /// Command arguments
    #[arg(allow_negative_numbers = true)]
    args: Vec<String>,

    /// How many times each frame is sent
    #[arg(short, long)]
    repeat: Option<u32>,

    /// Discover the bridge address with a broadcast
    #[arg(short, long)]
    discover: bool,

    /// IP address of the bridge
    #[arg(short, long)]
    addr: Option<Ipv4Addr>,

    /// UDP port of the bridge
    #[arg(short, long)]
    port: Option<u16>,

    /// JSON file with bridge settings; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log protocol traffic (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn bridge_config(&self) -> Result<BridgeConfig, Error> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::from_json_file(path)?,
            None => BridgeConfig::default(),
        };
        if let Some(repeat) = self.repeat {
            config.repeat = repeat;
        }
        if self.discover {
            config.discovery = true;
        }
        if let Some(addr) = self.addr {
            config.address = addr;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_validation() => {
            error!("{}", e);
            eprintln!("\nRun with --help to see the available commands.");
            ExitCode::from(1)
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let config = cli.bridge_config()?;
    let device = DeviceType::create(cli.device)?;
    let zone = Zone::create(cli.zone)?;
    let command = Command::parse(&cli.command, cli.args.as_slice())?;

    // reject unsupported combinations before any socket is opened
    if command != Command::Spectrum {
        let payload = map_command(device, zone, &command)?;
        debug!("Payload for {}: {}", command, payload);
    }

    runtime::block_on(async {
        let mut bridge = Bridge::connect(config).await?;
        bridge.execute(device, zone, &command).await?;
        bridge.close();
        Ok::<(), Error>(())
    })
    .map_err(|e| Error::socket("runtime", e))?
}
