use crate::archive::Archive;
use eyre::{Context, Result, eyre};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// `<home>/<dirs...>`, or `None` when the home directory is unknown.
pub fn home_output_dir(dirs: &[String]) -> Option<PathBuf> {
    dirs::home_dir().map(|home| dirs.iter().fold(home, |path, d| path.join(d)))
}

pub fn archive_path(output_dir: &Path, run_timestamp: &str) -> PathBuf {
    output_dir.join(format!("{}_archive.json", run_timestamp))
}

pub fn write_archive_json<W: Write>(writer: &mut W, archive: &Archive) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, archive)?;
    writeln!(writer)
}

/// Write the archive into `output_dir`, creating it if needed. The file is
/// written to a temporary sibling first and renamed into place, so a failed
/// run never leaves a truncated archive behind.
pub fn save_archive(output_dir: &Path, archive: &Archive) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).wrap_err_with(|| {
        format!(
            "Failed to create output directory: {}",
            output_dir.display()
        )
    })?;

    let target = archive_path(output_dir, archive.generated_at());
    let tmp = NamedTempFile::new_in(output_dir).wrap_err("Failed to create temporary file")?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        write_archive_json(&mut writer, archive).wrap_err("Failed to write archive JSON")?;
        writer.flush().wrap_err("Failed to flush archive file")?;
    }
    tmp.persist(&target)
        .map_err(|e| eyre!("Failed to move archive into place at {}: {}", target.display(), e))?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::assemble;
    use crate::importer::CleanedConversation;

    fn sample_archive() -> Archive {
        let conv = CleanedConversation {
            name: "Hello".to_string(),
            uuid: "u1".to_string(),
            created_at: "2024-01-01 6:00PM".to_string(),
            updated_at: "2024-01-01 6:00PM".to_string(),
            bucket: "2024-01-01".to_string(),
        };
        assemble(Some("u1"), vec![conv], |_| Vec::new(), "2024-06-01 8:00AM")
    }

    #[test]
    fn archive_file_is_named_after_run() {
        assert_eq!(
            archive_path(Path::new("/tmp/out"), "2024-06-01 8:00AM"),
            PathBuf::from("/tmp/out/2024-06-01 8:00AM_archive.json")
        );
    }

    #[test]
    fn home_dir_is_joined_with_configured_parts() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let dir = home_output_dir(&["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(dir, home.join("a").join("b"));
    }

    #[test]
    fn writes_indented_json() {
        let mut buf = Vec::new();
        write_archive_json(&mut buf, &sample_archive()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("{\n  \"generated_at\""));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn saves_into_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("archives").join("claude");
        let path = save_archive(&out, &sample_archive()).unwrap();

        assert_eq!(path, out.join("2024-06-01 8:00AM_archive.json"));
        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["most_recent"]["uuid"], "u1");
        assert_eq!(fs::read_dir(&out).unwrap().count(), 1);
    }
}
