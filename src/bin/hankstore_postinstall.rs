//! Post-install helper run by the installer on the end-user machine.
//!
//! The installer only sees the exit code, so every outcome maps onto one:
//! 0 success, 1 usage, 2 write failure, 3 internal fault, 4 staged values
//! missing or unreadable, 5 key missing or malformed.

use clap::Parser;
use hankstore_bundler::cli::PostInstallArgs;
use hankstore_bundler::postinstall::{self, EXIT_INTERNAL, EXIT_OK, EXIT_USAGE, PostInstallOptions};
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::process;

fn main() {
    let args = match PostInstallArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { EXIT_OK };
            let _ = e.print();
            process::exit(code);
        }
    };

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(buf, "[postinstall] {}: {}", record.level(), record.args())
        })
        .try_init();

    let options = PostInstallOptions::from(&args);
    let code = match panic::catch_unwind(AssertUnwindSafe(|| postinstall::run(&options))) {
        Ok(Ok(report)) => {
            match (&report.env_path, &report.values_path) {
                (Some(path), _) if report.key_generated => {
                    log::info!("New key generated in {}", path.display())
                }
                (Some(path), _) if report.key_updated => {
                    log::info!("Configuration written to {}", path.display())
                }
                (Some(path), _) => log::info!("{} left unchanged", path.display()),
                (None, Some(values)) => {
                    log::info!("Staged values at {} are valid", values.display())
                }
                (None, None) => {}
            }
            EXIT_OK
        }
        Ok(Err(e)) => {
            log::error!("{e}");
            e.exit_code()
        }
        Err(_) => {
            log::error!("Internal error while configuring the application");
            EXIT_INTERNAL
        }
    };

    process::exit(code);
}
