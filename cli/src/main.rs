mod commands;
mod terminal;

use commands::{CommandLine, check, list};
use terminal::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.verbose);
    let cfg = commands.config();

    if commands.list {
        return list::list(&cfg);
    }

    let Some(target) = &commands.target else {
        anyhow::bail!("no target given");
    };

    check::check(target, &commands.checks, &cfg).await?;
    Ok(())
}
