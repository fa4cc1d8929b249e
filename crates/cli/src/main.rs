use std::process::ExitCode;

fn main() -> ExitCode {
    wattwise_cli::run()
}
