/**
 * Tilting Scanner
 *
 * Runs the tilting 2D range scanner:
 * 1. Connects to the tilt stand MCU (or a simulated stand)
 * 2. Buffers range samples arriving on the scan topic
 * 3. Accepts enable/disable commands from the console
 * 4. Steps the stand and publishes one slice per cycle
 *
 * Usage: tilt_scanner [--config FILE] [--port PORT] [--baud BAUD] [--simulate]
 */

use clap::Parser;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tilt_scan::config::{ActuatorConfig, SerialConfig, SimulatedConfig};
use tilt_scan::run_state::{CMD_DISABLE, CMD_ENABLE};
use tilt_scan::{Error, Publisher, Result, RunStateController, ScannerConfig, Subscriber, Slice, TiltingScanner};

#[derive(Parser, Debug)]
#[command(name = "tilt_scanner", about = "Tilting 2D range scanner coordinator")]
struct Args{
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port of the tilt stand MCU
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// Drive a simulated stand with a synthetic scan feed
    #[arg(long)]
    simulate: bool,

    /// Start with acquisition enabled
    #[arg(long)]
    enable: bool,
}

fn load_config(args: &Args) -> Result<ScannerConfig>{
    let mut config = match &args.config{
        Some(path) => ScannerConfig::load(path)?,
        None => ScannerConfig::default(),
    };

    if args.simulate{
        if !matches!(config.actuator, ActuatorConfig::Simulated(_)){
            config.actuator = ActuatorConfig::Simulated(SimulatedConfig::default());
        }
    }else if args.port.is_some() || args.baud.is_some(){
        let mut serial = match &config.actuator{
            ActuatorConfig::Serial(serial) => serial.clone(),
            ActuatorConfig::Simulated(_) => SerialConfig::default(),
        };
        if let Some(port) = &args.port{
            serial.port = port.clone();
        }
        if let Some(baud) = args.baud{
            serial.baud_rate = baud;
        }
        config.actuator = ActuatorConfig::Serial(serial);
    }
    if args.enable{
        config.run.start_enabled = true;
    }

    config.validate()?;
    Ok(config)
}

fn spawn_console(commands: Publisher<i32>, run_state: Arc<RunStateController>, running: Arc<AtomicBool>) -> Result<()>{
    println!("\n[Commands]");
    println!("  1/e - enable acquisition");
    println!("  0/d - disable acquisition");
    println!("  <n> - send raw integer command");
    println!("  s   - show run state");
    println!("  q   - quit\n");

    thread::Builder::new()
        .name("console".to_string())
        .spawn(move ||{
            for line in io::stdin().lock().lines(){
                let Ok(line) = line else { break };
                match line.trim(){
                    "e" | "enable" =>{
                        commands.publish(CMD_ENABLE);
                    }
                    "d" | "disable" =>{
                        commands.publish(CMD_DISABLE);
                    }
                    "s" | "status" => println!("[STATE] {:?}", run_state.current_state()),
                    "q" | "quit" | "exit" => break,
                    "" => {}
                    other => match other.parse::<i32>(){
                        Ok(cmd) =>{
                            commands.publish(cmd);
                        }
                        Err(_) => println!("Unknown command: {}", other),
                    },
                }
            }
            running.store(false, Ordering::Release);
        })
        .map_err(Error::Io)?;
    Ok(())
}

fn spawn_slice_reporter(slices: Subscriber<Slice>, running: Arc<AtomicBool>) -> Result<()>{
    thread::Builder::new()
        .name("slice-reporter".to_string())
        .spawn(move ||{
            while running.load(Ordering::Acquire){
                for slice in slices.drain(){
                    log::info!(
                        "Slice #{}: tilt {:.2} deg, {} readings",
                        slice.sequence,
                        slice.tilt_angle,
                        slice.scan.sample_count()
                    );
                }
                thread::sleep(Duration::from_millis(50));
            }
        })
        .map_err(Error::Io)?;
    Ok(())
}

fn main() -> Result<()>{
    let args = Args::parse();
    let config = load_config(&args)?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.level.as_str())).init();
    log::info!("tilt_scanner v{} starting", env!("CARGO_PKG_VERSION"));

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move ||{
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Release);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let mut scanner = TiltingScanner::new(config);
    scanner.init()?;

    spawn_slice_reporter(scanner.slice_subscriber(), Arc::clone(&running))?;
    spawn_console(scanner.command_publisher(), scanner.run_state(), Arc::clone(&running))?;

    let result = scanner.run(&running);
    running.store(false, Ordering::Release);

    match &result{
        Ok(()) => log::info!("Shutdown complete"),
        Err(e) => log::error!("Run aborted: {}", e),
    }
    result
}
