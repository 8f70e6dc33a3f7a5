use failure::Fail;
use structopt::{StructOpt, clap::ErrorKind};
use meshconv::convert::{self, ConvertConfig, Error};

#[macro_use]
mod ui;

mod args;

use crate::args::{Args, USAGE};


/// We just catch potential errors here and print them. The actual useful code
/// is in `run()`.
fn main() {
    if let Err(e) = run() {
        let msg = match &e {
            Error::Usage(msg) => format!("Usage error: {}", msg),
            Error::InputLoad { cause, .. } => format!("Invalid input: {}: {}", e, cause),
            Error::OutputWrite { cause, .. } => format!("Could not write output: {}: {}", e, cause),
        };
        error!("{}", msg);
        if let Error::Usage(_) = e {
            eprintln!("USAGE: {}", USAGE);
        }

        // Errors usually include their cause in their own message. Only
        // causes that haven't been printed as part of that are listed.
        if ui::is_verbose() {
            let mut shown = msg;
            for cause in (&e as &dyn Fail).iter_causes() {
                let cause = cause.to_string();
                if !shown.contains(&cause) {
                    error!("  ... caused by: {}", cause);
                }
                shown = cause;
            }
        }

        std::process::exit(e.exit_code());
    }
}

fn run() -> Result<(), Error> {
    let args = match Args::from_iter_safe(std::env::args_os()) {
        Ok(args) => args,
        Err(e) => match e.kind {
            ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed => e.exit(),
            _ => return Err(Error::Usage(args::short_clap_message(&e.message))),
        },
    };
    ui::set_verbose(args.verbose);

    let config = ConvertConfig::new(args.input, args.output)?;
    if config.output_path().exists() {
        warn!("'{}' already exists and will be overwritten", config.output_path().display());
    }

    let summary = progress!(
        ["Converting '{}' to '{}'", config.input_path().display(), config.output_path().display()]
            => convert::convert(&config)
    )?;

    info!("Source format: {}", summary.source_format);
    info!("Target format: {}", summary.target_format);
    info!(
        "Mesh: {} vertices, {} faces",
        ui::fmt_with_thousand_sep(summary.num_vertices.into()),
        ui::fmt_with_thousand_sep(summary.num_faces.into()),
    );

    Ok(())
}
