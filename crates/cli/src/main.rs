fn main() {
    if let Err(e) = stubdex_cli::run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
