use cowfs::error::Result;
use cowfs::{Backend, CowFs, DirEntry};

use super::{format_time, format_time_rfc3339};

fn kind_char(entry: &DirEntry) -> char {
    if entry.is_dir() {
        'd'
    } else {
        '-'
    }
}

pub fn list_directory(fs: &CowFs, path: &str, porcelain: bool, json: bool) -> Result<()> {
    let entries = fs.read_dir(path)?;

    if json {
        let entries_display: Vec<_> = entries
            .iter()
            .map(|entry| {
                serde_json::json!({
                    "name": entry.name,
                    "type": if entry.is_dir() { "directory" } else { "file" },
                    "size": entry.metadata.size,
                    "mode": format!("{:04o}", entry.metadata.mode),
                    "modified": format_time_rfc3339(entry.metadata.modified),
                })
            })
            .collect();

        println!("{}", serde_json::to_string(&entries_display)?);
    } else if porcelain {
        for entry in &entries {
            println!(
                "{}\t{}\t{}\t{:04o}",
                entry.name,
                kind_char(entry),
                entry.metadata.size,
                entry.metadata.mode
            );
        }
    } else {
        for entry in &entries {
            println!(
                "{}{:04o} {:>10} {} {}",
                kind_char(entry),
                entry.metadata.mode,
                entry.metadata.size,
                format_time(entry.metadata.modified),
                entry.name
            );
        }
    }

    Ok(())
}
