mod terminal;

fn main() -> anyhow::Result<std::process::ExitCode> {
    terminal::run_app()
}
