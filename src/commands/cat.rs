use cowfs::error::Result;
use cowfs::{Backend, CowFs};
use std::io::Write;

pub fn print_file(fs: &CowFs, path: &str) -> Result<()> {
    let data = fs.read_file(path)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&data)?;
    stdout.flush()?;
    Ok(())
}
