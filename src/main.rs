use eventgen::cli;

fn main() {
    let command_line_interface = cli::CommandLineInterface::load();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| command_line_interface.log_level().into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(error) = command_line_interface.run() {
        tracing::error!("{error:#}");
        std::process::exit(1);
    }
}
