use anyhow::Result;

fn main() -> Result<()> {
    convert_ancestry::cli::run()
}
