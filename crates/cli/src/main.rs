use std::process::ExitCode;

fn main() -> ExitCode {
    vouchery_cli::run()
}
