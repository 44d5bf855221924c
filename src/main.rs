fn main() {
    if let Err(err) = cardsmith::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
