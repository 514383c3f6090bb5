use std::process::ExitCode;

fn main() -> ExitCode {
    ExitCode::from(sift3d_cli::run(std::env::args_os()))
}
