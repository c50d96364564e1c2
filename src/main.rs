use anyhow::Result;

fn main() -> Result<()> {
    selfheal_cli::cli::app::run()
}
