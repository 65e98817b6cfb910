use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    ratebook_cli::run()
}
