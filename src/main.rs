use std::env;
use std::error::Error;
use std::process;
use std::thread;
use std::time::Duration;

use bmp280::{scan, Bmp280Builder, LinuxBus, DEFAULT_I2C_ADDRESS, DEFAULT_I2C_PATH};
use log::{error, info, warn};

/// How often `watch` takes a sample.
const SAMPLE_INTERVAL: Duration = Duration::from_millis(1000);

const USAGE: &str = "usage: bmp280 [scan|watch] [i2c-path] [address]";

#[derive(Debug, thiserror::Error)]
#[error("{0}\n{USAGE}")]
struct UsageError(String);

/// A 7-bit address in hex, with or without one `0x` prefix.
fn parse_address(arg: &str) -> Result<u8, UsageError> {
    let digits = arg
        .strip_prefix("0x")
        .or_else(|| arg.strip_prefix("0X"))
        .unwrap_or(arg);

    match u8::from_str_radix(digits, 16) {
        Ok(address) if address <= 0x7F => Ok(address),
        _ => Err(UsageError(format!("bad address {:?}", arg))),
    }
}

fn run_scan(path: &str) -> Result<(), Box<dyn Error>> {
    let mut bus = LinuxBus::open(path)?;
    let report = scan(&mut bus);

    print!("{}", report);
    info!("{} device(s) on {}", report.present().count(), path);

    Ok(())
}

fn run_watch(path: &str, address: u8) -> Result<(), Box<dyn Error>> {
    let mut sensor = Bmp280Builder::new()
        .path(path.to_string())
        .address(address)
        .build()?;

    loop {
        thread::sleep(SAMPLE_INTERVAL);

        match sensor.read() {
            // Compensated pressure is in Pa.
            Ok(sample) => info!(
                "t: {:.2} C, p: {:.2} hPa",
                sample.temperature_celsius(),
                sample.pressure_hpa()
            ),
            Err(e) => warn!("sample failed: {}", e),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "watch".to_string());
    let path = args.next().unwrap_or_else(|| DEFAULT_I2C_PATH.to_string());

    let result = match command.as_str() {
        "scan" => run_scan(&path),
        "watch" => match args.next().map(|a| parse_address(&a)) {
            Some(Err(e)) => Err(e.into()),
            Some(Ok(address)) => run_watch(&path, address),
            None => run_watch(&path, DEFAULT_I2C_ADDRESS),
        },
        other => Err(UsageError(format!("unknown command {:?}", other)).into()),
    };

    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}
