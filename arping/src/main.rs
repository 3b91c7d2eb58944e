use arping::{resolve, Config, ResolveError};
use clap::{App, Arg};
use log::error;
use std::net::IpAddr;
use std::process;
use std::time::Duration;
use tokio::runtime;

// Anything longer than a day is a typo, and keeps the value far away from
// the overflow panic in Duration::from_secs_f64.
const MAX_TIMEOUT_SECS: f64 = 86_400.0;

fn parse_timeout(arg: &str) -> Result<Duration, String> {
    let secs: f64 = arg.parse().map_err(|e| format!("{}", e))?;
    if !secs.is_finite() || secs < 0.0 || secs > MAX_TIMEOUT_SECS {
        return Err(format!(
            "timeout must be between 0 and {} seconds",
            MAX_TIMEOUT_SECS
        ));
    }
    Ok(Duration::from_secs_f64(secs))
}

fn main() {
    env_logger::init();

    let app = App::new("arping")
        .version("0.1.0")
        .about("Resolves the hardware address of an IPv4 host with raw ARP frames")
        .arg(
            Arg::with_name("interface")
                .short("i")
                .long("interface")
                .value_name("INTERFACE")
                .help("Network interface to send the request on")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("target")
                .long("ip")
                .value_name("TARGET_IP")
                .help("IPv4 address to resolve")
                .takes_value(true)
                .required(true)
                .validator(|ip| ip.parse::<IpAddr>().map(|_| ()).map_err(|e| e.to_string())),
        )
        .arg(
            Arg::with_name("timeout")
                .short("t")
                .long("timeout")
                .value_name("SECONDS")
                .help("Seconds to wait for a reply before giving up")
                .takes_value(true)
                .default_value("2")
                .validator(|t| parse_timeout(&t).map(|_| ())),
        )
        .get_matches();

    // The unwraps cannot fail: the arguments are required and validated.
    let config = Config {
        interface: app.value_of("interface").unwrap().to_string(),
        target: app.value_of("target").unwrap().parse().unwrap(),
        timeout: parse_timeout(app.value_of("timeout").unwrap()).unwrap(),
    };

    let mut rt = match runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("failed to start runtime: {}", e);
            process::exit(1);
        }
    };

    match rt.block_on(resolve(&config)) {
        Ok(mac) => println!("{}", mac),
        Err(err @ ResolveError::Timeout(_)) => {
            eprintln!("{}", err);
            process::exit(1);
        }
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_flag_accepts_whole_and_fractional_seconds() {
        assert_eq!(parse_timeout("2").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_timeout("0.05").unwrap(), Duration::from_millis(50));
        assert_eq!(parse_timeout("0").unwrap(), Duration::from_secs(0));
    }

    #[test]
    fn timeout_flag_rejects_non_finite_and_oversized_values() {
        assert!(parse_timeout("nan").is_err());
        assert!(parse_timeout("inf").is_err());
        assert!(parse_timeout("-inf").is_err());
        assert!(parse_timeout("-1").is_err());
        // Finite but overflows Duration's u64 seconds.
        assert!(parse_timeout("1e300").is_err());
    }

    #[test]
    fn timeout_flag_rejects_non_numbers() {
        assert!(parse_timeout("").is_err());
        assert!(parse_timeout("soon").is_err());
        assert!(parse_timeout("2s").is_err());
    }
}
