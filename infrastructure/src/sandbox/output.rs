//! Capped capture of child process output

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use toolgate_domain::util::{TRUNCATION_MARKER, truncate_str};

const READ_CHUNK: usize = 8 * 1024;

/// Output of one pipe after capping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CappedOutput {
    /// Decoded text, at most `max_bytes` plus the truncation marker
    pub text: String,
    /// Total bytes the process wrote to the pipe
    pub total_bytes: usize,
    pub truncated: bool,
    /// Read failure, if the pipe broke before EOF
    pub error: Option<String>,
}

/// Drain `reader` to EOF (or until `stop` fires), keeping at most
/// `max_bytes`.
///
/// Bytes beyond the cap are read and discarded so the child never blocks
/// on a full pipe.
pub async fn read_capped<R>(mut reader: R, max_bytes: usize, stop: CancellationToken) -> CappedOutput
where
    R: AsyncRead + Unpin,
{
    let mut kept: Vec<u8> = Vec::new();
    let mut total = 0usize;
    let mut error = None;
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        let read = tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            read = reader.read(&mut chunk) => read,
        };
        match read {
            Ok(0) => break,
            Ok(n) => {
                total += n;
                let room = max_bytes.saturating_sub(kept.len());
                kept.extend_from_slice(&chunk[..n.min(room)]);
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                error = Some(e.to_string());
                break;
            }
        }
    }

    let truncated = total > max_bytes;
    let decoded = String::from_utf8_lossy(&kept);
    // Lossy decoding of a cut multi-byte char can grow the text slightly
    let text = if truncated {
        format!("{}{}", truncate_str(&decoded, max_bytes), TRUNCATION_MARKER)
    } else {
        truncate_str(&decoded, max_bytes).to_string()
    };

    CappedOutput {
        text,
        total_bytes: total,
        truncated,
        error,
    }
}
