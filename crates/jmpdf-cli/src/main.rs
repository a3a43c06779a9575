use jmpdf_core::logging;

mod cli;

fn main() {
    // Initialize logging as early as possible; stderr only if the log file is unavailable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    std::process::exit(cli::run_from_args());
}
