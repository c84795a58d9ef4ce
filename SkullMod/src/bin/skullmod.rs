fn main() -> anyhow::Result<()> {
    skullmod::cli::run_cli()
}
