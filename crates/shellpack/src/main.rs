fn main() {
    if let Err(err) = shellpack::run() {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
