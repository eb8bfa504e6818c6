use std::process::ExitCode;

fn main() -> ExitCode {
    kbseek_cli::run()
}
