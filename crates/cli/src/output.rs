use owo_colors::OwoColorize;

/// Colored report lines, all on stdout. Colors only when stdout is a TTY.
fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

pub fn print_warn(msg: &str) {
    if is_tty() {
        println!("{} {}", "[WARNING]".yellow().bold(), msg);
    } else {
        println!("[WARNING] {}", msg);
    }
}

pub fn print_error(msg: &str) {
    if is_tty() {
        println!("{} {}", "[ERROR]".red().bold(), msg);
    } else {
        println!("[ERROR] {}", msg);
    }
}

pub fn print_success(msg: &str) {
    if is_tty() {
        println!("{}", msg.green());
    } else {
        println!("{}", msg);
    }
}

pub fn print_dry_run(msg: &str) {
    if is_tty() {
        println!("{} {}", "[DRY-RUN]".cyan(), msg);
    } else {
        println!("[DRY-RUN] {}", msg);
    }
}

pub fn print_verbose(msg: &str) {
    if is_tty() {
        println!("{} {}", "[VERBOSE]".cyan(), msg);
    } else {
        println!("[VERBOSE] {}", msg);
    }
}

pub fn print_mismatch(msg: &str) {
    if is_tty() {
        println!("{} {}", "[MISMATCH]".magenta().bold(), msg);
    } else {
        println!("[MISMATCH] {}", msg);
    }
}

pub fn print_match(msg: &str) {
    if is_tty() {
        println!("{} {}", "[MATCH]".green(), msg);
    } else {
        println!("[MATCH] {}", msg);
    }
}

/// Bold when colors are on; used for headings in menus and summaries.
pub fn heading(text: &str) -> String {
    if is_tty() {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

/// `true` in green, `false` in red.
pub fn flag(value: bool) -> String {
    match (is_tty(), value) {
        (true, true) => value.green().to_string(),
        (true, false) => value.red().to_string(),
        (false, _) => value.to_string(),
    }
}

/// Plain line with no prefix, for output users may script against.
pub fn print_user(msg: &str) {
    println!("{}", msg);
}
