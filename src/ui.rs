use colored::Colorize;

pub fn info(msg: &str) {
    println!("{} {}", "::".blue().bold(), msg);
}

pub fn success(msg: &str) {
    println!("{} {}", "ok".green().bold(), msg);
}

pub fn warn(msg: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", "error:".red().bold(), msg);
}
