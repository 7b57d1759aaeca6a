//! This is the main entry point for the `gemkit` binary.

use clap::Parser;

use gemkit::{console_utils::init_logging, opt::App, version_check::VersionCheckError};

fn main() -> miette::Result<()> {
    let app = App::parse();
    let multi_progress = init_logging(app.log_style, app.verbose.log_level_filter(), app.color)?;

    match gemkit::run(app, multi_progress) {
        Ok(()) => Ok(()),
        // The version check reports through its own exit codes.
        Err(report) => match report.downcast_ref::<VersionCheckError>() {
            Some(err) => {
                let code = err.exit_code();
                eprintln!("{report:?}");
                std::process::exit(code)
            }
            None => Err(report),
        },
    }
}
