use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    genie::cli::main()
}
