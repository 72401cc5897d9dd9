use colored::Colorize;
use inkwell::module::Module;
use itertools::Itertools;

/// Prints a colorized listing of the module's textual IR form to stdout.
/// The listing is for inspection only and is not meant to be parsed back.
pub fn print_module(module: &Module) {
    let name = module.get_name().to_string_lossy();

    println!("{} {} {}", ";".bright_black(), "module".magenta(), name.blue());

    let listing = module.print_to_string().to_string();

    println!("{}", listing.lines().map(paint_line).join("\n"));
}

fn paint_line(line: &str) -> String {
    let trimmed = line.trim_start();

    if trimmed.starts_with("define") || trimmed.starts_with("declare") {
        line.magenta().to_string()
    } else if trimmed.starts_with(';') {
        line.bright_black().to_string()
    } else if trimmed.ends_with(':') {
        line.bright_red().to_string()
    } else {
        line.to_string()
    }
}
