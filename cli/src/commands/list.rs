use checkip_common::config::Config;
use checkip_core::checks;

use crate::terminal::print;

pub fn list(cfg: &Config) -> anyhow::Result<()> {
    print::header("available checks", cfg.quiet);
    for check in checks::builtin(cfg)?.all() {
        print::list_entry(check.id(), check.name());
    }
    Ok(())
}
