use crate::domain::ports::Publisher;
use crate::utils::error::{Result, ScraperError};
use std::borrow::Cow;
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// 每個 sink 對應 `{base_path}/{sink}.jsonl`，一則訊息一行
#[derive(Debug, Clone)]
pub struct JsonlPublisher {
    base_path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonlPublisher {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn sink_path(&self, sink: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", sink))
    }
}

impl Publisher for JsonlPublisher {
    async fn publish(&self, sink: &str, payload: &str) -> Result<()> {
        let record = encode_record(payload)?;
        let path = self.sink_path(sink);
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ScraperError::Publish {
                sink: sink.to_string(),
                message: format!("{}: {}", path.display(), e),
            })?;
        writeln!(file, "{}", record)?;

        tracing::debug!("📤 Published {} bytes to {}", payload.len(), sink);
        Ok(())
    }
}

/// 一筆內容寫成一行。跨行或以 `"` 開頭的內容改存成 JSON 字串字面值，
/// 其餘原樣寫入；`decode_record` 可還原成原本的內容
pub fn encode_record(payload: &str) -> Result<Cow<'_, str>> {
    if payload.contains(['\n', '\r']) || payload.starts_with('"') {
        Ok(Cow::Owned(serde_json::to_string(payload)?))
    } else {
        Ok(Cow::Borrowed(payload))
    }
}

pub fn decode_record(line: &str) -> Result<String> {
    if line.starts_with('"') {
        Ok(serde_json::from_str(line)?)
    } else {
        Ok(line.to_string())
    }
}

/// 讀取 JSON Lines 輸入，`-` 代表 stdin；空白行略過
pub fn read_messages(input: &str) -> Result<Vec<String>> {
    let content = if input == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(Path::new(input))?
    };

    Ok(split_messages(&content))
}

fn split_messages(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    #[tokio::test]
    async fn test_publish_appends_one_line_per_message() {
        let temp_dir = TempDir::new().unwrap();
        let publisher = JsonlPublisher::new(temp_dir.path());

        tokio_test::assert_ok!(publisher.publish("reviewers-data", r#"{"name":"A"}"#).await);
        tokio_test::assert_ok!(publisher.publish("reviewers-data", r#"{"name":"B"}"#).await);
        tokio_test::assert_ok!(publisher.publish("profiles.DLT", "not json").await);

        let reviewers = fs::read_to_string(temp_dir.path().join("reviewers-data.jsonl")).unwrap();
        assert_eq!(reviewers, "{\"name\":\"A\"}\n{\"name\":\"B\"}\n");

        let dead_letters = fs::read_to_string(temp_dir.path().join("profiles.DLT.jsonl")).unwrap();
        assert_eq!(dead_letters, "not json\n");
    }

    #[tokio::test]
    async fn test_publish_creates_missing_output_directory() {
        let temp_dir = TempDir::new().unwrap();
        let publisher = JsonlPublisher::new(temp_dir.path().join("nested").join("out"));

        tokio_test::assert_ok!(publisher.publish("manual-intervention", "{}").await);

        assert!(publisher.sink_path("manual-intervention").exists());
    }

    #[tokio::test]
    async fn test_publish_keeps_multiline_payload_on_one_line() {
        let temp_dir = TempDir::new().unwrap();
        let publisher = JsonlPublisher::new(temp_dir.path());
        let raw = "{\n  \"department\": \"Philosophy\"\n}";

        tokio_test::assert_ok!(publisher.publish("profiles.DLT", raw).await);
        tokio_test::assert_ok!(publisher.publish("profiles.DLT", "{}").await);

        let content = fs::read_to_string(publisher.sink_path("profiles.DLT")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(decode_record(lines[0]).unwrap(), raw);
        assert_eq!(decode_record(lines[1]).unwrap(), "{}");
    }

    #[test]
    fn test_record_encoding_is_lossless() {
        for payload in ["{\"a\":1}", "not json", "\"quoted\"", "line one\r\nline two", ""] {
            let record = encode_record(payload).unwrap();
            assert!(!record.contains('\n'));
            assert_eq!(decode_record(&record).unwrap(), payload);
        }
    }

    #[test]
    fn test_read_messages_skips_blank_lines() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{{\"url\":\"https://x.edu/a\"}}").unwrap();
        writeln!(temp_file).unwrap();
        writeln!(temp_file, "   ").unwrap();
        writeln!(temp_file, "{{\"url\":\"https://x.edu/b\"}}").unwrap();

        let messages = read_messages(temp_file.path().to_str().unwrap()).unwrap();

        assert_eq!(
            messages,
            vec![
                "{\"url\":\"https://x.edu/a\"}".to_string(),
                "{\"url\":\"https://x.edu/b\"}".to_string()
            ]
        );
    }

    #[test]
    fn test_read_messages_missing_file_is_io_error() {
        let err = read_messages("/nonexistent/profiles.jsonl").unwrap_err();
        assert!(matches!(err, ScraperError::Io(_)));
    }
}
