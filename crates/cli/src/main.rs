//! preupload CLI application entry point
//!
//! Parses arguments, runs the library and maps the verdict to an exit status.

use clap::Parser;

fn main() {
    // Configure miette for error reporting
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(false)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))
    .ok();

    let cli = preupload::Cli::parse();

    match preupload::run(cli) {
        Ok(verdict) => std::process::exit(verdict.exit_code()),
        Err(e) => {
            // Convert anyhow error to miette for display
            let miette_error = miette::Report::msg(format!("{e:#}"));
            eprintln!("{miette_error:?}");
            std::process::exit(preupload::Verdict::Failed.exit_code());
        }
    }
}
