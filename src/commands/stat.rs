use cowfs::error::Result;
use cowfs::{Backend, CowFs};

use super::{format_time, format_time_rfc3339};

pub fn print_stat(fs: &CowFs, path: &str, json: bool) -> Result<()> {
    let meta = fs.stat(path)?;
    let kind = if meta.is_dir() { "directory" } else { "file" };

    if json {
        let stat_display = serde_json::json!({
            "name": meta.name,
            "type": kind,
            "size": meta.size,
            "mode": format!("{:04o}", meta.mode),
            "uid": meta.uid,
            "gid": meta.gid,
            "modified": format_time_rfc3339(meta.modified),
            "accessed": format_time_rfc3339(meta.accessed),
        });
        println!("{}", serde_json::to_string(&stat_display)?);
        return Ok(());
    }

    println!("  Name: {}", meta.name);
    println!("  Type: {}", kind);
    println!("  Size: {}", meta.size);
    println!("  Mode: {:04o}", meta.mode);
    println!("   Uid: {}", meta.uid);
    println!("   Gid: {}", meta.gid);
    println!("Modify: {}", format_time(meta.modified));
    println!("Access: {}", format_time(meta.accessed));

    Ok(())
}
