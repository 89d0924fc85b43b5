use super::super::args::ListArgs;
use super::open_transport;
use crate::exit_codes;
use zipvault_restore::NextPackage;

pub fn run(args: ListArgs) -> anyhow::Result<i32> {
    let mut transport = open_transport(&args.source)?;
    let token = transport.current_restore_set();
    transport.start(token, args.packages);

    let mut found = 0usize;
    while let NextPackage::Package(desc) = transport.next_package() {
        println!("{}\t{}", desc.package, desc.mode);
        found += 1;
    }
    transport.finish();

    eprintln!("{found} package(s) with data");
    Ok(exit_codes::SUCCESS)
}
