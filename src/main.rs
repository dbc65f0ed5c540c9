use std::process::ExitCode;

fn main() -> ExitCode {
    samsara::cli::run()
}
