// bc127 command-line tool -- drives a BC127 module over a serial port, or the
// built-in simulated module, one operation per invocation.
//
// Usage:
//   bc127-cli --port /dev/ttyUSB0 reset
//   bc127-cli --port /dev/ttyUSB0 get NAME
//   bc127-cli --port /dev/ttyUSB0 set NAME "Kitchen Speaker"
//   bc127-cli --port /dev/ttyUSB0 ble-role central
//   bc127-cli --port /dev/ttyUSB0 baud 115200 --follow
//   bc127-cli --mock --verbose address
//
// Set RUST_LOG to override the log filter (e.g. RUST_LOG=bc127_protocol=trace).

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bc127::{AudioCommand, Bc127Builder, Bc127Io, BleRole, ClassicRole, GetReply, OpResult};
use bc127_core::{ByteChannel, Clock, SystemClock};
use bc127_test_harness::{MockClock, SimulatedModule};
use bc127_transport::SerialChannel;

type DynChannel = Box<dyn ByteChannel + Send>;
type DynClock = Box<dyn Clock + Send>;
type ModuleIo = Bc127Io<DynChannel, DynClock>;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// bc127 command-line tool -- exercises a BC127 module from the shell.
#[derive(Parser, Debug)]
#[command(name = "bc127-cli", version, about)]
struct Cli {
    /// Serial port path (e.g. /dev/ttyUSB0, COM3).
    /// Required unless --mock is used.
    #[arg(long)]
    port: Option<String>,

    /// Rate the module is currently running at.
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// Override the bare-command deadline, in milliseconds.
    #[arg(long)]
    command_timeout_ms: Option<u64>,

    /// Override the RESET deadline, in milliseconds.
    #[arg(long)]
    reset_timeout_ms: Option<u64>,

    /// Talk to a simulated module instead of a serial port.
    #[arg(long)]
    mock: bool,

    /// Log every exchange (debug level).
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Flush any half-entered command and stale output.
    Resync,

    /// Reboot the module and wait for the Ready banner.
    Reset,

    /// Return all settings to factory defaults.
    Restore,

    /// Persist current settings.
    Write,

    /// Send a raw command word (e.g. STATUS).
    Cmd {
        /// Command text, without the trailing carriage return.
        token: String,
    },

    /// Read a parameter.
    Get {
        name: String,
    },

    /// Write a parameter.
    Set {
        name: String,
        value: String,
    },

    /// Print the module's Bluetooth address.
    Address,

    /// Change the module's line rate.
    Baud {
        /// New rate: 9600, 19200, 38400, 57600 or 115200.
        rate: u32,

        /// Switch the host port too and verify with GET BAUD.
        #[arg(long)]
        follow: bool,
    },

    /// Select the BLE role: disabled, peripheral or central.
    BleRole {
        role: BleRole,
    },

    /// Start or stop BLE advertising.
    Advertise {
        #[arg(value_parser = parse_on_off, action = clap::ArgAction::Set)]
        state: bool,
    },

    /// Select the classic audio role: sink or source.
    ClassicRole {
        role: ClassicRole,
    },

    /// Send an audio control: play, pause, forward, back, up, down, stop.
    Music {
        action: AudioCommand,
    },
}

fn parse_on_off(s: &str) -> std::result::Result<bool, String> {
    match s.to_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(format!("expected on or off, got '{s}'")),
    }
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn init_logging(verbose: bool) {
    let default = if verbose { "bc127=debug" } else { "bc127=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(verbose)
        .init();
}

fn open_module(cli: &Cli) -> Result<ModuleIo> {
    let (channel, clock): (DynChannel, DynClock) = if cli.mock {
        let clock = MockClock::new();
        let channel = SimulatedModule::new().into_channel(clock.clone());
        println!("Connected (simulated module)");
        (Box::new(channel), Box::new(clock))
    } else {
        let port = cli
            .port
            .as_deref()
            .context("--port is required when not using --mock")?;
        let channel = SerialChannel::open(port, cli.baud)
            .with_context(|| format!("failed to open {port}"))?;
        println!("Connected to {port} at {} baud", cli.baud);
        (Box::new(channel), Box::new(SystemClock::new()))
    };

    let mut builder = Bc127Builder::new().baud_rate(cli.baud);
    if let Some(ms) = cli.command_timeout_ms {
        builder = builder.command_timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = cli.reset_timeout_ms {
        builder = builder.reset_timeout(Duration::from_millis(ms));
    }
    let module = builder
        .build_with_channel(channel, clock)
        .context("invalid module configuration")?;
    Ok(Bc127Io::spawn(module))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn report(what: &str, result: OpResult) -> Result<()> {
    if result.is_success() {
        println!("{what}: OK");
        Ok(())
    } else {
        bail!("{what}: {result}")
    }
}

fn report_value(name: &str, reply: GetReply) -> Result<()> {
    let result = reply.result;
    match reply.into_value() {
        Some(value) => {
            println!("{name} = {value}");
            Ok(())
        }
        None if result.is_success() => bail!("{name}: module answered OK without a value"),
        None => bail!("{name}: {result}"),
    }
}

async fn cmd_baud(io: &ModuleIo, rate: u32, follow: bool) -> Result<()> {
    let change = io.set_baud_rate(rate).await?;
    match change.result {
        OpResult::InvalidParam => {
            bail!("{rate} is not a supported rate (9600, 19200, 38400, 57600, 115200)")
        }
        OpResult::Success => println!("Module acknowledged {rate} baud"),
        OpResult::Timeout => println!("No acknowledgment; module has likely switched to {rate} baud"),
        other => bail!("baud change rejected: {other}"),
    }

    if !follow {
        if change.is_unconfirmed() {
            println!("Reconnect with --baud {rate} to continue talking to it");
        }
        return Ok(());
    }

    io.follow_baud_rate(rate).await?;
    let reply = io.baud_rate_query().await?;
    match reply.into_value() {
        Some(value) if value == rate.to_string() => {
            println!("Verified: module reports BAUD={value}");
            Ok(())
        }
        Some(value) => bail!("module reports BAUD={value} after switching to {rate}"),
        None => bail!("no answer at {rate} baud; the change was not applied"),
    }
}

async fn run(cli: &Cli, io: &ModuleIo) -> Result<()> {
    match &cli.command {
        Command::Resync => match io.resync().await? {
            OpResult::Success => println!("Resync: line flushed"),
            other => println!("Resync: {other} (module silent)"),
        },
        Command::Reset => report("Reset", io.reset().await?)?,
        Command::Restore => report("Restore", io.restore().await?)?,
        Command::Write => report("Write", io.write_config().await?)?,
        Command::Cmd { token } => report(token, io.command(token).await?)?,
        Command::Get { name } => report_value(name, io.get_param(name).await?)?,
        Command::Set { name, value } => {
            report(&format!("{name}={value}"), io.set_param(name, value).await?)?
        }
        Command::Address => report_value("LOCAL_ADDR", io.address_query().await?)?,
        Command::Baud { rate, follow } => cmd_baud(io, *rate, *follow).await?,
        Command::BleRole { role } => {
            report(&format!("BLE role {role:?}"), io.set_ble_role(*role).await?)?
        }
        Command::Advertise { state } => {
            let label = if *state { "Advertising on" } else { "Advertising off" };
            report(label, io.advertise(*state).await?)?
        }
        Command::ClassicRole { role } => report(
            &format!("Classic role {role:?}"),
            io.set_classic_role(*role).await?,
        )?,
        Command::Music { action } => {
            report(&format!("{action:?}"), io.music(*action).await?)?
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let io = open_module(&cli)?;
    let outcome = run(&cli, &io).await;
    io.shutdown().await.context("IO worker did not stop cleanly")?;
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["bc127-cli"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn parses_global_flags() {
        let cli = parse(&["--port", "/dev/ttyUSB0", "--baud", "115200", "-v", "reset"]);
        assert_eq!(cli.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(cli.baud, 115_200);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Reset));
    }

    #[test]
    fn default_baud_is_factory_rate() {
        let cli = parse(&["--mock", "address"]);
        assert_eq!(cli.baud, 9600);
        assert!(cli.mock);
    }

    #[test]
    fn parses_typed_arguments() {
        let cli = parse(&["--mock", "ble-role", "central"]);
        assert!(matches!(cli.command, Command::BleRole { role: BleRole::Central }));

        let cli = parse(&["--mock", "classic-role", "source"]);
        assert!(matches!(
            cli.command,
            Command::ClassicRole { role: ClassicRole::Source }
        ));

        let cli = parse(&["--mock", "music", "up"]);
        assert!(matches!(
            cli.command,
            Command::Music { action: AudioCommand::VolumeUp }
        ));

        let cli = parse(&["--mock", "advertise", "off"]);
        assert!(matches!(cli.command, Command::Advertise { state: false }));
    }

    #[test]
    fn rejects_unknown_role() {
        let result = Cli::try_parse_from(["bc127-cli", "--mock", "ble-role", "observer"]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_baud_follow() {
        let cli = parse(&["--mock", "baud", "57600", "--follow"]);
        assert!(matches!(
            cli.command,
            Command::Baud { rate: 57_600, follow: true }
        ));
    }

    #[tokio::test]
    async fn mock_session_runs_commands() {
        let cli = parse(&["--mock", "set", "NAME", "Desk"]);
        let io = open_module(&cli).unwrap();
        run(&cli, &io).await.unwrap();

        let cli = parse(&["--mock", "get", "NAME"]);
        run(&cli, &io).await.unwrap();

        let cli = parse(&["--mock", "baud", "38400", "--follow"]);
        run(&cli, &io).await.unwrap();
        io.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn mock_rejected_command_is_an_error() {
        let cli = parse(&["--mock", "cmd", "FROB"]);
        let io = open_module(&cli).unwrap();
        let err = run(&cli, &io).await.unwrap_err();
        assert!(err.to_string().contains("module error"));
        io.shutdown().await.unwrap();
    }

    #[test]
    fn on_off_parser() {
        assert_eq!(parse_on_off("ON"), Ok(true));
        assert_eq!(parse_on_off("0"), Ok(false));
        assert!(parse_on_off("maybe").is_err());
    }
}
