//! `modpkg modules`

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::format_module_line;

pub fn execute(ctx: &CliContext, experimental: bool) -> Result<(), CliError> {
    let mut any = false;
    for module in ctx.modules.visible(experimental) {
        println!("{}", format_module_line(module));
        any = true;
    }
    if !any {
        println!("No modules configured.");
    }
    Ok(())
}
