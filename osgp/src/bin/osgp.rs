fn main() -> anyhow::Result<()> {
    env_logger::init();
    osgp::cli::run()
}
