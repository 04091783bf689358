use std::io;

fn main() {
    let stdout = io::stdout();
    let code = orderbot::cli::run(std::env::args().skip(1), &mut stdout.lock());
    std::process::exit(code);
}
