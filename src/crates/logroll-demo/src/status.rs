use anyhow::Result;
use bytesize::ByteSize;
use logroll_writer::{ActiveFile, ArchiveEntry, RotationManager};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Status {
    active_file: ActiveFile,
    archives: Vec<ArchiveEntry>,
}

/// Prints the active file and the archives, oldest first.
pub fn print_status(manager: &RotationManager, json: bool) -> Result<()> {
    let status = Status {
        active_file: manager.active_file(),
        archives: manager.list_archives()?,
    };

    if json {
        println!("{}", serde_json::to_string(&status)?);
        return Ok(());
    }

    let now = manager.now().format("%H:%M:%S");
    println!(
        "[{}] {} ({}), {} archive(s) in {}",
        now,
        status.active_file.path.display(),
        ByteSize(status.active_file.size_bytes),
        status.archives.len(),
        manager.archive_dir().display()
    );

    for archive in &status.archives {
        println!(
            "  - {} ({}, {})",
            archive.file_name(),
            ByteSize(archive.size_bytes),
            archive.creation_time.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_json_status_uses_camel_case() {
        let status = Status {
            active_file: ActiveFile {
                path: "logs/app.log".into(),
                creation_time: Utc.with_ymd_and_hms(2026, 10, 16, 14, 5, 0).unwrap(),
                size_bytes: 42,
            },
            archives: Vec::new(),
        };

        let value = serde_json::to_value(&status).unwrap();
        let active = &value["activeFile"];
        assert_eq!(active["sizeBytes"], 42);
        assert_eq!(active["creationTime"], "2026-10-16T14:05:00Z");
        assert!(active.get("size_bytes").is_none());
        assert_eq!(value["archives"], serde_json::json!([]));
    }
}
