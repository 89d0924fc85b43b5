use super::super::args::SetsArgs;
use super::open_transport;
use crate::exit_codes;

pub fn run(args: SetsArgs) -> anyhow::Result<i32> {
    let transport = open_transport(&args.source)?;
    let current = transport.current_restore_set();
    for set in transport.available_restore_sets() {
        let marker = if set.token == current { "*" } else { " " };
        println!("{marker} {}\t{}\t{}", set.token, set.name, set.device);
    }
    Ok(exit_codes::SUCCESS)
}
