use pe_loadconfig::container::Container;
use pe_loadconfig::error;
use pe_loadconfig::pe::load_config::LoadConfigData;
use std::env;
use std::fs;
use std::process;

fn usage() -> ! {
    eprintln!("usage: lcdump <raw-load-config-file> <32|64> [directory-size]");
    process::exit(1);
}

fn run(path: &str, bitness: &str, size: Option<&str>) -> error::Result<()> {
    let bitness = bitness.parse::<u32>().unwrap_or_else(|_| usage());
    let container = Container::from_bitness(bitness)?;
    let bytes = fs::read(path).unwrap_or_else(|err| {
        eprintln!("{}: {}", path, err);
        process::exit(1);
    });
    let data = match size {
        Some(size) => {
            let size = size.parse::<u32>().unwrap_or_else(|_| usage());
            LoadConfigData::parse(&bytes, size, container)?
        }
        None => LoadConfigData::parse_size_field(&bytes, container)?,
    };
    println!(
        "{} ({}-bit) load config {} ({}), {:#x} bytes declared, {:#x} decoded",
        data.container,
        data.container.bitness(),
        data.version(),
        data.version().build(),
        data.directory_size,
        data.structure_size()
    );
    if let Some(field) = data.missing {
        println!("truncated: {} and later fields are missing", field.name());
    }
    print!("{}", data.config);
    if let Some(v2) = data.config.v2() {
        println!("code integrity:");
        print!("{}", v2.code_integrity);
    }
    Ok(())
}

pub fn main() {
    stderrlog::new().verbosity(3).init().unwrap();
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        usage();
    }
    if let Err(err) = run(&args[1], &args[2], args.get(3).map(String::as_str)) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}
