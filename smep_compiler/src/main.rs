use smep_compiler::{config, ir, logging, pipeline};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_global_logging()?;

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("smep-lower");
    let rest = args.get(1..).unwrap_or_default();

    let mut as_json = false;
    let mut index = 0;
    while let Some(arg) = rest.get(index) {
        match arg.as_str() {
            "--help" => {
                print_help(program);
                return Ok(());
            }
            "--json" => as_json = true,
            "--" => {
                index += 1;
                break;
            }
            _ => break,
        }
        index += 1;
    }
    let hyperparameters = &rest[index..];

    let lowered = match pipeline::lower_arguments(hyperparameters) {
        Ok(lowered) => lowered,
        Err(error) => {
            eprintln!("error[{}]: {}", error.error_code(), error);
            std::process::exit(1);
        }
    };

    if as_json {
        let plain = serde_json::to_value(&lowered.plain)?;
        let objects = ir::encode_forest(&lowered.roots)?;
        let document = serde_json::json!({ "plain": plain, "objects": objects });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    println!("Plain arguments:");
    for (key, value) in lowered.plain.iter() {
        println!("  {} = {} ({})", key, value, value.type_name());
    }
    println!("Objects:");
    for root in lowered.roots.iter() {
        for line in root.render().lines() {
            println!("  {}", line);
        }
    }
    for warning in &lowered.warnings {
        println!(
            "warning: value '{}' for '{}' looks like a flag",
            warning.value, warning.key
        );
    }

    Ok(())
}

fn print_help(program_name: &str) {
    println!("smep-lower v{}", env!("CARGO_PKG_VERSION"));
    println!("Show how hyperparameter arguments lower into values and objects");
    println!();
    println!("USAGE:");
    println!("    {} [--json] -- --key value [--key value ...]", program_name);
    println!();
    println!("OPTIONS:");
    println!("    --help    Show this help message");
    println!("    --json    Print plain values and encoded objects as JSON");
    println!();
    println!("EXAMPLES:");
    println!(
        "    {} -- --epochs 3 --trainer.__class__ mymodule.Trainer --trainer.0 abcd",
        program_name
    );
    println!();
    println!("{}", config::limits_summary());
}
