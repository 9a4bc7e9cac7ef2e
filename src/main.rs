use chat_birthdays::cli::commands;
use chat_birthdays::utils::init_tracing;

fn main() -> anyhow::Result<()> {
    init_tracing("warn");
    commands::run()
}
