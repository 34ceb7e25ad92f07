use std::process::ExitCode;

fn main() -> ExitCode {
    preventivo_cli::run()
}
