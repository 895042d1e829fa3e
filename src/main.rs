use color_eyre::eyre::Result;
use family_bingo::{
    app,
    config::{
        self,
        Command,
    },
};

fn print_usage_and_exit() -> ! {
    println!("{}", config::USAGE);
    std::process::exit(0);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let app_config = match config::parse_args(std::env::args().skip(1))? {
        Command::Run(app_config) => app_config,
        Command::Help => print_usage_and_exit(),
    };
    let _log_guard = app::init_tracing(&app_config.log_dir)?;
    tracing::info!("starting family-bingo");
    app::run_app(app_config).await
}
